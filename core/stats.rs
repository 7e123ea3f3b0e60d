use crate::error::{AppError, Result};
use crate::gather::FileInfo;
use byte_unit::{Byte, UnitType};
use indexmap::IndexMap;
use log;
use serde::Serialize;
use tiktoken_rs::cl100k_base;

/// Label used for files without an extension.
pub const NO_EXTENSION: &str = "(none)";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub path: String,
    pub lines: usize,
    pub bytes: u64,
    pub bytes_readable: String,
    pub estimated_tokens: usize,
    pub redactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionMetrics {
    pub files: usize,
    pub lines: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub total_files: usize,
    pub total_lines: usize,
    pub total_bytes: u128,
    pub total_bytes_readable: String,
    pub estimated_tokens: usize,
    pub total_redactions: usize,
    /// Ordered by file count, then extension.
    pub by_extension: IndexMap<String, ExtensionMetrics>,
    pub files_details: Vec<FileMetrics>,
}

pub fn readable_size(bytes: u128) -> String {
    Byte::from_u128(bytes)
        .unwrap_or_default()
        .get_appropriate_unit(UnitType::Binary)
        .to_string()
}

/// Computes line, byte and token totals over successfully read files.
/// Files that failed to read are left out.
pub fn calculate_metrics(files: &[FileInfo]) -> Result<ProjectMetrics> {
    let bpe = cl100k_base().map_err(|e| AppError::TikToken(e.to_string()))?;
    let mut total_lines = 0;
    let mut total_bytes: u128 = 0;
    let mut total_tokens = 0;
    let mut total_redactions = 0;
    let mut extensions: IndexMap<String, ExtensionMetrics> = IndexMap::new();
    let mut files_details = Vec::new();

    for file_info in files {
        let Some(text) = file_info.text() else {
            continue;
        };
        let lines = text.lines().count();
        let tokens = bpe.encode_ordinary(text).len();
        let bytes = file_info.size;

        total_lines += lines;
        total_bytes = total_bytes.saturating_add(bytes as u128);
        total_tokens += tokens;
        total_redactions += file_info.redactions;

        let key = file_info
            .extension
            .clone()
            .unwrap_or_else(|| NO_EXTENSION.to_string());
        let entry = extensions.entry(key).or_default();
        entry.files += 1;
        entry.lines += lines;
        entry.bytes += bytes;

        files_details.push(FileMetrics {
            path: file_info.relative_path.clone(),
            lines,
            bytes,
            bytes_readable: readable_size(bytes as u128),
            estimated_tokens: tokens,
            redactions: file_info.redactions,
        });
    }

    extensions.sort_by(|ka, a, kb, b| b.files.cmp(&a.files).then_with(|| ka.cmp(kb)));
    log::debug!(
        "Metrics: {} files, {} lines, {} tokens across {} extensions",
        files_details.len(),
        total_lines,
        total_tokens,
        extensions.len()
    );

    Ok(ProjectMetrics {
        total_files: files_details.len(),
        total_lines,
        total_bytes,
        total_bytes_readable: readable_size(total_bytes),
        estimated_tokens: total_tokens,
        total_redactions,
        by_extension: extensions,
        files_details,
    })
}
