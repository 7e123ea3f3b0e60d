use once_cell::sync::Lazy;
use serde::Deserialize;

pub const REDACTION_PLACEHOLDER: &str = "[REDACTED]";
pub const DEFAULT_MAX_FILE_MB: u64 = 5;
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Default exclusion policy, embedded from `data/defaults.yaml`.
#[derive(Debug, Default, Deserialize)]
pub struct BuiltinDefaults {
    #[serde(default)]
    pub excluded_extensions: Vec<String>,
    #[serde(default)]
    pub excluded_filenames: Vec<String>,
    #[serde(default)]
    pub excluded_dir_names: Vec<String>,
    #[serde(default)]
    pub manifest_allowlist: Vec<String>,
}

static BUILTIN_DEFAULTS: Lazy<BuiltinDefaults> = Lazy::new(|| {
    let yaml_content = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../data/defaults.yaml"
    ));
    serde_yml::from_str(yaml_content).expect("Failed to parse embedded data/defaults.yaml")
});

pub fn get_builtin_defaults() -> &'static BuiltinDefaults {
    &BUILTIN_DEFAULTS
}

/// Lowercases and dot-prefixes an extension so `PNG`, `.png` and `png` compare equal.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_lowercase())
}
