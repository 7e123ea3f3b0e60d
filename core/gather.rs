use crate::classify::{Decision, FileClassifier, FileRecord, SkipCounts, Verdict};
use crate::error::{AppError, Result};
use crate::redact::SecretRedactor;
use crate::rules::{RuleSet, normalize_separators};
use ignore::WalkBuilder;
use log;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct GatherOptions {
    pub use_gitignore: bool,
    pub skip_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub record: FileRecord,
    pub verdict: Verdict,
}

impl ScannedFile {
    pub fn decision(&self) -> Decision {
        self.verdict.decision
    }
}

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
    pub extension: Option<String>,
    pub content: Result<String>,
    pub redactions: usize,
}

impl FileInfo {
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().ok()
    }
}

#[derive(Debug)]
pub struct WalkError {
    pub path: Option<String>,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub records: Vec<FileRecord>,
    pub walk_errors: Vec<WalkError>,
}

#[derive(Debug, Default)]
pub struct GatherResult {
    pub scanned: Vec<ScannedFile>,
    pub kept: Vec<FileInfo>,
    pub skip_counts: SkipCounts,
    pub walk_errors: Vec<WalkError>,
}

impl GatherResult {
    pub fn read_errors(&self) -> usize {
        self.kept.iter().filter(|f| f.content.is_err()).count()
    }

    pub fn redactions(&self) -> usize {
        self.kept.iter().map(|f| f.redactions).sum()
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

fn walk_error(project_root: &Path, err: ignore::Error) -> WalkError {
    let path = error_path(&err).map(|p| {
        let relative = pathdiff::diff_paths(p, project_root).unwrap_or_else(|| p.to_path_buf());
        normalize_separators(&relative)
    });
    log::warn!("Error walking directory: {}", err);
    WalkError {
        path,
        error: AppError::Ignore(err),
    }
}

/// Walks `project_root` depth-first with each directory's entries sorted by
/// name. Unlistable directories and unstattable files are returned as walk
/// errors rather than records.
pub fn discover_files(project_root: &Path, options: &GatherOptions) -> Result<Discovery> {
    let mut builder = WalkBuilder::new(project_root);
    builder.hidden(false);
    builder.follow_links(false);
    builder.ignore(options.use_gitignore);
    builder.git_ignore(options.use_gitignore);
    builder.git_exclude(options.use_gitignore);
    builder.git_global(options.use_gitignore);
    builder.parents(options.use_gitignore);
    builder.require_git(false);
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let skip_dirs = options.skip_dirs.clone();
    let root = project_root.to_path_buf();
    builder.filter_entry(move |entry| {
        let path = entry.path();
        if skip_dirs.iter().any(|skip| path.starts_with(skip)) {
            log::trace!("Skipping output directory: {}", path.display());
            return false;
        }
        // VCS internals are never walked.
        let is_git_dir = entry.file_type().is_some_and(|ft| ft.is_dir())
            && path.file_name().is_some_and(|n| n == ".git")
            && path != root;
        !is_git_dir
    });
    log::debug!(
        "WalkBuilder configured (gitignore: {}, skip dirs: {:?})",
        options.use_gitignore,
        options.skip_dirs
    );

    log::info!("Walking project directory: {}", project_root.display());
    let mut discovery = Discovery::default();
    for entry_result in builder.build() {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                discovery.walk_errors.push(walk_error(project_root, e));
                continue;
            }
        };
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(relative_path) = pathdiff::diff_paths(path, project_root) else {
            log::warn!("Could not get relative path for: {}", path.display());
            continue;
        };
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                discovery.walk_errors.push(walk_error(project_root, e));
                continue;
            }
        };
        log::trace!("Walked file: {}", relative_path.display());
        discovery
            .records
            .push(FileRecord::new(path.to_path_buf(), relative_path, size));
    }
    log::info!(
        "Directory walk complete. Found {} files, {} walk errors.",
        discovery.records.len(),
        discovery.walk_errors.len()
    );
    Ok(discovery)
}

pub fn classify_files(records: Vec<FileRecord>, rules: &RuleSet) -> Vec<ScannedFile> {
    let classifier = FileClassifier::new(rules);
    records
        .into_par_iter()
        .map(|record| {
            let verdict = classifier.explain(&record);
            ScannedFile { record, verdict }
        })
        .collect()
}

/// Reads and redacts every kept file. A failed read is recorded on that file
/// and never aborts the batch.
pub fn load_kept_files(scanned: &[ScannedFile], redactor: &SecretRedactor) -> Vec<FileInfo> {
    scanned
        .par_iter()
        .filter(|f| f.decision().is_keep())
        .map(|f| load_file(&f.record, redactor))
        .collect()
}

fn load_file(record: &FileRecord, redactor: &SecretRedactor) -> FileInfo {
    let (content, redactions) = match fs::read(&record.path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let redacted = redactor.redact_counted(&text);
            (Ok(redacted.text.into_owned()), redacted.replacements)
        }
        Err(e) => {
            log::warn!("Failed to read {}: {}", record.path.display(), e);
            (
                Err(AppError::FileRead {
                    path: record.path.clone(),
                    source: e,
                }),
                0,
            )
        }
    };
    FileInfo {
        path: record.path.clone(),
        relative_path: record.normalized_path(),
        size: record.size,
        extension: record.extension.clone(),
        content,
        redactions,
    }
}

pub fn gather_files(
    project_root: &Path,
    rules: &RuleSet,
    redactor: &SecretRedactor,
    options: &GatherOptions,
) -> Result<GatherResult> {
    let Discovery {
        records,
        walk_errors,
    } = discover_files(project_root, options)?;

    log::debug!("Classifying {} files...", records.len());
    let scanned = classify_files(records, rules);
    let skip_counts: SkipCounts = scanned.iter().map(|f| &f.verdict.decision).collect();
    log::info!(
        "Classification complete: {} kept, {} skipped.",
        scanned.len() - skip_counts.total(),
        skip_counts.total()
    );

    let kept = load_kept_files(&scanned, redactor);
    let result = GatherResult {
        scanned,
        kept,
        skip_counts,
        walk_errors,
    };
    log::info!(
        "Content loading complete: {} read errors, {} walk errors, {} redactions.",
        result.read_errors(),
        result.walk_errors.len(),
        result.redactions()
    );
    Ok(result)
}
