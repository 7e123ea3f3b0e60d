use crate::classify::{SkipCounts, SkipReason};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::gather::{FileInfo, GatherResult, WalkError};
use crate::stats::{ExtensionMetrics, ProjectMetrics, readable_size};
use crate::tree::{self, TreeNode};
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use log;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONTENTS_FILE: &str = "contents.txt";
pub const TREE_FILE: &str = "tree.txt";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redactions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalkErrorEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub error: String,
}

impl From<&WalkError> for WalkErrorEntry {
    fn from(walk_error: &WalkError) -> Self {
        Self {
            path: walk_error.path.clone(),
            error: walk_error.error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTotals {
    pub lines: usize,
    pub bytes: u128,
    pub bytes_readable: String,
    pub estimated_tokens: usize,
    pub by_extension: IndexMap<String, ExtensionMetrics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub project_name: String,
    pub project_root: String,
    pub generated_at: DateTime<Utc>,
    pub files_discovered: usize,
    pub files_kept: usize,
    pub files_skipped: usize,
    pub read_errors: usize,
    pub walk_errors: Vec<WalkErrorEntry>,
    pub skip_counts: SkipCounts,
    pub redaction_enabled: bool,
    pub redactions: usize,
    pub totals: SnapshotTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<Vec<TreeNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_log: Option<Vec<String>>,
    pub files: Vec<FileEntry>,
}

/// Everything one snapshot run writes to disk.
#[derive(Debug, Clone)]
pub struct SnapshotBundle {
    pub metadata: SnapshotMetadata,
    pub contents: String,
    pub tree_text: Option<String>,
    pub summary: String,
    write_metadata: bool,
}

impl SnapshotBundle {
    pub fn build(
        project_root: &Path,
        config: &Config,
        gathered: &GatherResult,
        metrics: &ProjectMetrics,
        git_log: Option<Vec<String>>,
    ) -> Result<Self> {
        log::debug!("Assembling snapshot bundle...");
        let project_name = config.get_effective_project_name(project_root);

        let tree = if config.output.include_tree {
            let kept_paths: Vec<&str> = gathered
                .kept
                .iter()
                .map(|f| f.relative_path.as_str())
                .collect();
            Some(tree::build_tree(&kept_paths)?)
        } else {
            log::trace!("Tree output disabled.");
            None
        };
        let tree_text = tree.as_ref().map(|t| tree::render_tree(&project_name, t));

        let metadata = SnapshotMetadata {
            project_name,
            project_root: project_root.to_string_lossy().to_string(),
            generated_at: Utc::now(),
            files_discovered: gathered.scanned.len(),
            files_kept: gathered.kept.len(),
            files_skipped: gathered.skip_counts.total(),
            read_errors: gathered.read_errors(),
            walk_errors: gathered.walk_errors.iter().map(WalkErrorEntry::from).collect(),
            skip_counts: gathered.skip_counts,
            redaction_enabled: config.redaction.enabled,
            redactions: gathered.redactions(),
            totals: SnapshotTotals {
                lines: metrics.total_lines,
                bytes: metrics.total_bytes,
                bytes_readable: metrics.total_bytes_readable.clone(),
                estimated_tokens: metrics.estimated_tokens,
                by_extension: metrics.by_extension.clone(),
            },
            tree,
            git_log,
            files: file_entries(gathered),
        };

        let contents = render_contents(&gathered.kept);
        let summary = render_summary(&metadata);
        log::debug!(
            "Bundle assembled: {} bytes of contents, {} kept files.",
            contents.len(),
            metadata.files_kept
        );

        Ok(Self {
            metadata,
            contents,
            tree_text,
            summary,
            write_metadata: config.output.write_metadata,
        })
    }

    pub fn metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.metadata)?)
    }

    /// Writes the bundle into `output_dir`, creating it if needed, and returns
    /// the paths written. Optional files disabled for this run are removed so a
    /// stale copy from an earlier run is never left behind.
    pub fn write_to(&self, output_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir).map_err(|e| AppError::DirCreation {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let mut written = Vec::new();
        written.push(write_file(output_dir, CONTENTS_FILE, &self.contents)?);
        written.push(write_file(output_dir, SUMMARY_FILE, &self.summary)?);

        match &self.tree_text {
            Some(text) => written.push(write_file(output_dir, TREE_FILE, text)?),
            None => remove_stale(output_dir, TREE_FILE)?,
        }
        if self.write_metadata {
            let json = self.metadata_json()?;
            written.push(write_file(output_dir, METADATA_FILE, &json)?);
        } else {
            remove_stale(output_dir, METADATA_FILE)?;
        }

        log::info!(
            "Wrote {} bundle files to {}",
            written.len(),
            output_dir.display()
        );
        Ok(written)
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content).map_err(|e| AppError::FileWrite {
        path: path.clone(),
        source: e,
    })?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

fn remove_stale(dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    match fs::remove_file(&path) {
        Ok(()) => {
            log::debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::FileWrite { path, source: e }),
    }
}

fn file_entries(gathered: &GatherResult) -> Vec<FileEntry> {
    let mut kept = gathered.kept.iter();
    gathered
        .scanned
        .iter()
        .map(|scanned| {
            let decision = scanned.decision();
            let mut entry = FileEntry {
                path: scanned.record.normalized_path(),
                size: scanned.record.size,
                decision: if decision.is_keep() { "keep" } else { "skip" },
                reason: decision.reason(),
                lines: None,
                redactions: None,
                read_error: None,
            };
            // Kept files appear in the same relative order in both lists.
            if decision.is_keep() {
                if let Some(info) = kept.next() {
                    match &info.content {
                        Ok(text) => {
                            entry.lines = Some(text.lines().count());
                            entry.redactions = Some(info.redactions);
                        }
                        Err(e) => entry.read_error = Some(read_error_text(e)),
                    }
                }
            }
            entry
        })
        .collect()
}

fn read_error_text(error: &AppError) -> String {
    match error {
        AppError::FileRead { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Marker written in place of a file body that could not be read.
pub fn read_error_marker(relative_path: &str, error: &AppError) -> String {
    format!(
        "[[xsnapshot: failed to read {}: {}]]",
        relative_path,
        read_error_text(error)
    )
}

/// Concatenates kept files in walk order, each under a `===== path =====`
/// header and followed by a blank line.
pub fn render_contents(files: &[FileInfo]) -> String {
    let capacity: usize = files.iter().map(|f| f.size as usize + 64).sum();
    let mut out = String::with_capacity(capacity);
    for file in files {
        let _ = writeln!(out, "===== {} =====", file.relative_path);
        match &file.content {
            Ok(text) => {
                out.push_str(text);
                if !text.is_empty() && !text.ends_with('\n') {
                    out.push('\n');
                }
            }
            Err(e) => {
                out.push_str(&read_error_marker(&file.relative_path, e));
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}

pub fn render_summary(meta: &SnapshotMetadata) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Project: {}", meta.project_name);
    let _ = writeln!(out, "Root: {}", meta.project_root);
    let _ = writeln!(
        out,
        "Generated: {}",
        meta.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    out.push('\n');

    let _ = writeln!(out, "Files discovered: {}", meta.files_discovered);
    let _ = writeln!(out, "Files kept: {}", meta.files_kept);
    let _ = writeln!(out, "Files skipped: {}", meta.files_skipped);
    let _ = writeln!(out, "Read errors: {}", meta.read_errors);
    let _ = writeln!(out, "Walk errors: {}", meta.walk_errors.len());
    for walk_error in &meta.walk_errors {
        let _ = writeln!(
            out,
            "  {}: {}",
            walk_error.path.as_deref().unwrap_or("(unknown path)"),
            walk_error.error
        );
    }
    out.push('\n');

    out.push_str("Skipped by reason:\n");
    for (reason, count) in meta.skip_counts.iter() {
        let _ = writeln!(out, "  {}: {}", reason, count);
    }
    out.push('\n');

    out.push_str("Totals:\n");
    let _ = writeln!(out, "  Lines: {}", meta.totals.lines);
    let _ = writeln!(
        out,
        "  Size: {} ({} bytes)",
        readable_size(meta.totals.bytes),
        meta.totals.bytes
    );
    let _ = writeln!(out, "  Estimated tokens: {}", meta.totals.estimated_tokens);
    if meta.redaction_enabled {
        let _ = writeln!(out, "  Redactions: {}", meta.redactions);
    } else {
        out.push_str("  Redactions: disabled\n");
    }

    if !meta.totals.by_extension.is_empty() {
        out.push('\n');
        out.push_str("By extension:\n");
        let width = meta
            .totals
            .by_extension
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0);
        for (ext, m) in &meta.totals.by_extension {
            let _ = writeln!(
                out,
                "  {:<width$}  {} files, {} lines",
                ext,
                m.files,
                m.lines,
                width = width
            );
        }
    }

    if let Some(commits) = &meta.git_log {
        out.push('\n');
        let _ = writeln!(out, "Recent commits ({}):", commits.len());
        for line in commits {
            let _ = writeln!(out, "  {}", line);
        }
    }
    out
}
