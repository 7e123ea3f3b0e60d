use crate::config::FiltersConfig;
use crate::defaults::{self, BYTES_PER_MB, DEFAULT_MAX_FILE_MB};
use crate::error::{AppError, Result};
use log;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path};

/// Immutable filtering policy consulted by the classifier.
///
/// Built once from the embedded defaults merged with caller overrides. User
/// regexes are compiled up front so a bad pattern fails before any scanning.
#[derive(Debug, Clone)]
pub struct RuleSet {
    excluded_extensions: HashSet<String>,
    excluded_filenames: HashSet<String>,
    excluded_dir_names: HashSet<String>,
    manifest_allowlist: Vec<String>,
    preserve_manifests: bool,
    user_include: Vec<Regex>,
    user_exclude: Vec<Regex>,
    max_file_bytes: u64,
}

impl RuleSet {
    pub fn builder() -> RuleSetBuilder {
        RuleSetBuilder::default()
    }

    pub fn from_config(filters: &FiltersConfig) -> Result<Self> {
        RuleSetBuilder::default()
            .exclude_extensions(&filters.extra_excluded_extensions)
            .exclude_filenames(&filters.extra_excluded_filenames)
            .exclude_dir_names(&filters.extra_excluded_dirs)
            .manifests(&filters.extra_manifests)
            .preserve_manifests(filters.preserve_manifests)
            .include_patterns(&filters.include)
            .exclude_patterns(&filters.exclude)
            .max_file_mb(filters.max_file_mb)
            .build()
    }

    pub fn is_manifest(&self, filename: &str) -> bool {
        self.preserve_manifests && self.manifest_allowlist.iter().any(|m| m == filename)
    }

    pub fn is_excluded_extension(&self, extension: &str) -> bool {
        self.excluded_extensions.contains(extension)
    }

    pub fn is_excluded_filename(&self, filename: &str) -> bool {
        self.excluded_filenames.contains(filename)
    }

    /// Checks the ancestor directories of `relative_path` (never the file
    /// name itself) for an exact component match.
    pub fn excluded_ancestor<'a>(&self, relative_path: &'a Path) -> Option<&'a str> {
        let parent = relative_path.parent()?;
        parent.components().find_map(|c| match c {
            Component::Normal(name) => name
                .to_str()
                .filter(|n| self.excluded_dir_names.contains(*n)),
            _ => None,
        })
    }

    pub fn matches_include(&self, normalized_path: &str) -> bool {
        self.user_include.iter().any(|r| r.is_match(normalized_path))
    }

    pub fn matches_exclude(&self, normalized_path: &str) -> bool {
        self.user_exclude.iter().any(|r| r.is_match(normalized_path))
    }

    pub fn has_include_patterns(&self) -> bool {
        !self.user_include.is_empty()
    }

    pub fn preserve_manifests(&self) -> bool {
        self.preserve_manifests
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    pub fn manifest_allowlist(&self) -> &[String] {
        &self.manifest_allowlist
    }

    pub fn include_patterns(&self) -> Vec<&str> {
        self.user_include.iter().map(Regex::as_str).collect()
    }

    pub fn exclude_patterns(&self) -> Vec<&str> {
        self.user_exclude.iter().map(Regex::as_str).collect()
    }
}

/// Collects defaults and overrides for a [`RuleSet`].
#[derive(Debug, Clone)]
pub struct RuleSetBuilder {
    extensions: Vec<String>,
    filenames: Vec<String>,
    dir_names: Vec<String>,
    manifests: Vec<String>,
    preserve_manifests: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    max_file_bytes: u64,
}

impl Default for RuleSetBuilder {
    fn default() -> Self {
        let builtin = defaults::get_builtin_defaults();
        Self {
            extensions: builtin.excluded_extensions.clone(),
            filenames: builtin.excluded_filenames.clone(),
            dir_names: builtin.excluded_dir_names.clone(),
            manifests: builtin.manifest_allowlist.clone(),
            preserve_manifests: true,
            include: Vec::new(),
            exclude: Vec::new(),
            max_file_bytes: DEFAULT_MAX_FILE_MB * BYTES_PER_MB,
        }
    }
}

impl RuleSetBuilder {
    /// A builder with no built-in lists, for callers that want full control.
    pub fn empty() -> Self {
        Self {
            extensions: Vec::new(),
            filenames: Vec::new(),
            dir_names: Vec::new(),
            manifests: Vec::new(),
            ..Self::default()
        }
    }

    pub fn exclude_extensions<S: AsRef<str>>(mut self, exts: &[S]) -> Self {
        self.extensions
            .extend(exts.iter().map(|e| e.as_ref().to_string()));
        self
    }

    pub fn exclude_filenames<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.filenames
            .extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    pub fn exclude_dir_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.dir_names
            .extend(names.iter().map(|n| n.as_ref().to_string()));
        self
    }

    pub fn manifests<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        for name in names {
            let name = name.as_ref();
            if !self.manifests.iter().any(|m| m == name) {
                self.manifests.push(name.to_string());
            }
        }
        self
    }

    pub fn preserve_manifests(mut self, enabled: bool) -> Self {
        self.preserve_manifests = enabled;
        self
    }

    pub fn include_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.include
            .extend(patterns.iter().map(|p| p.as_ref().to_string()));
        self
    }

    pub fn exclude_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Self {
        self.exclude
            .extend(patterns.iter().map(|p| p.as_ref().to_string()));
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn max_file_mb(self, mb: u64) -> Self {
        self.max_file_bytes(mb.saturating_mul(BYTES_PER_MB))
    }

    pub fn build(self) -> Result<RuleSet> {
        let user_include = compile_patterns("include", &self.include)?;
        let user_exclude = compile_patterns("exclude", &self.exclude)?;

        let rule_set = RuleSet {
            excluded_extensions: self
                .extensions
                .iter()
                .filter(|e| !e.trim().is_empty())
                .map(|e| defaults::normalize_extension(e))
                .collect(),
            excluded_filenames: self.filenames.into_iter().collect(),
            excluded_dir_names: self.dir_names.into_iter().collect(),
            manifest_allowlist: self.manifests,
            preserve_manifests: self.preserve_manifests,
            user_include,
            user_exclude,
            max_file_bytes: self.max_file_bytes,
        };
        log::debug!(
            "RuleSet built: {} extensions, {} filenames, {} dirs, {} manifests (preserve: {}), {} include, {} exclude, max {} bytes",
            rule_set.excluded_extensions.len(),
            rule_set.excluded_filenames.len(),
            rule_set.excluded_dir_names.len(),
            rule_set.manifest_allowlist.len(),
            rule_set.preserve_manifests,
            rule_set.user_include.len(),
            rule_set.user_exclude.len(),
            rule_set.max_file_bytes
        );
        Ok(rule_set)
    }
}

pub(crate) fn compile_patterns(kind: &'static str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| {
                log::error!("Invalid {} pattern \"{}\": {}", kind, pattern, e);
                AppError::InvalidPattern {
                    kind,
                    pattern: pattern.clone(),
                    message: e.to_string(),
                }
            })
        })
        .collect()
}

/// Joins the normal components of a relative path with `/`, whatever the host separator.
pub fn normalize_separators(relative_path: &Path) -> String {
    let joined = relative_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    joined.replace('\\', "/")
}
