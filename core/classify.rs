use crate::rules::{RuleSet, normalize_separators};
use crate::sniff::{BinarySniffer, ContentKind};
use log;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
    pub extension: Option<String>,
}

impl FileRecord {
    pub fn new(path: PathBuf, relative_path: PathBuf, size: u64) -> Self {
        let extension = relative_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()));
        Self {
            path,
            relative_path,
            size,
            extension,
        }
    }

    pub fn filename(&self) -> &str {
        self.relative_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn normalized_path(&self) -> String {
        normalize_separators(&self.relative_path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Extension,
    Filename,
    Directory,
    UserExclude,
    Size,
    Binary,
}

impl SkipReason {
    pub const ALL: [SkipReason; 6] = [
        SkipReason::Extension,
        SkipReason::Filename,
        SkipReason::Directory,
        SkipReason::UserExclude,
        SkipReason::Size,
        SkipReason::Binary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Extension => "extension",
            SkipReason::Filename => "filename",
            SkipReason::Directory => "directory",
            SkipReason::UserExclude => "user-exclude",
            SkipReason::Size => "size",
            SkipReason::Binary => "binary",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Skip(SkipReason),
}

impl Decision {
    pub fn is_keep(&self) -> bool {
        matches!(self, Decision::Keep)
    }

    pub fn reason(&self) -> Option<SkipReason> {
        match self {
            Decision::Keep => None,
            Decision::Skip(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Keep => f.write_str("keep"),
            Decision::Skip(reason) => write!(f, "skip ({})", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Keep,
    Skip(SkipReason),
    BypassPolicy,
    Next,
}

type RuleCheck = fn(&FileRecord, &RuleSet) -> Outcome;

pub struct ClassifierRule {
    pub name: &'static str,
    /// Policy rules are the ones a user-include match bypasses.
    pub policy: bool,
    check: RuleCheck,
}

/// Evaluated top to bottom; the first `Keep` or `Skip` wins.
pub static RULE_CHAIN: [ClassifierRule; 8] = [
    ClassifierRule {
        name: "manifest",
        policy: false,
        check: manifest_rule,
    },
    ClassifierRule {
        name: "user-include",
        policy: false,
        check: user_include_rule,
    },
    ClassifierRule {
        name: "extension",
        policy: true,
        check: extension_rule,
    },
    ClassifierRule {
        name: "filename",
        policy: true,
        check: filename_rule,
    },
    ClassifierRule {
        name: "directory",
        policy: true,
        check: directory_rule,
    },
    ClassifierRule {
        name: "user-exclude",
        policy: true,
        check: user_exclude_rule,
    },
    ClassifierRule {
        name: "size",
        policy: false,
        check: size_rule,
    },
    ClassifierRule {
        name: "binary",
        policy: false,
        check: binary_rule,
    },
];

fn manifest_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    if rules.is_manifest(record.filename()) {
        Outcome::Keep
    } else {
        Outcome::Next
    }
}

fn user_include_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    if rules.has_include_patterns() && rules.matches_include(&record.normalized_path()) {
        Outcome::BypassPolicy
    } else {
        Outcome::Next
    }
}

fn extension_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    match &record.extension {
        Some(ext) if rules.is_excluded_extension(ext) => Outcome::Skip(SkipReason::Extension),
        _ => Outcome::Next,
    }
}

fn filename_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    if rules.is_excluded_filename(record.filename()) {
        Outcome::Skip(SkipReason::Filename)
    } else {
        Outcome::Next
    }
}

fn directory_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    if rules.excluded_ancestor(&record.relative_path).is_some() {
        Outcome::Skip(SkipReason::Directory)
    } else {
        Outcome::Next
    }
}

fn user_exclude_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    if rules.matches_exclude(&record.normalized_path()) {
        Outcome::Skip(SkipReason::UserExclude)
    } else {
        Outcome::Next
    }
}

fn size_rule(record: &FileRecord, rules: &RuleSet) -> Outcome {
    if record.size > rules.max_file_bytes() {
        Outcome::Skip(SkipReason::Size)
    } else {
        Outcome::Next
    }
}

fn binary_rule(record: &FileRecord, _rules: &RuleSet) -> Outcome {
    match BinarySniffer::classify_path(&record.path) {
        ContentKind::Binary => Outcome::Skip(SkipReason::Binary),
        ContentKind::Text => Outcome::Next,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub decided_by: Option<&'static str>,
    pub include_override: bool,
}

pub struct FileClassifier<'a> {
    rules: &'a RuleSet,
}

impl<'a> FileClassifier<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    pub fn decide(&self, record: &FileRecord) -> Decision {
        self.explain(record).decision
    }

    pub fn explain(&self, record: &FileRecord) -> Verdict {
        let mut bypass_policy = false;
        for rule in RULE_CHAIN.iter() {
            if bypass_policy && rule.policy {
                continue;
            }
            let decision = match (rule.check)(record, self.rules) {
                Outcome::Next => continue,
                Outcome::BypassPolicy => {
                    bypass_policy = true;
                    continue;
                }
                Outcome::Keep => Decision::Keep,
                Outcome::Skip(reason) => Decision::Skip(reason),
            };
            log::trace!(
                "{} -> {} (rule: {})",
                record.relative_path.display(),
                decision,
                rule.name
            );
            return Verdict {
                decision,
                decided_by: Some(rule.name),
                include_override: bypass_policy,
            };
        }
        log::trace!("{} -> keep", record.relative_path.display());
        Verdict {
            decision: Decision::Keep,
            decided_by: None,
            include_override: bypass_policy,
        }
    }
}

pub fn decide(record: &FileRecord, rules: &RuleSet) -> Decision {
    FileClassifier::new(rules).decide(record)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    counts: [usize; 6],
}

impl SkipCounts {
    pub fn record(&mut self, decision: &Decision) {
        if let Decision::Skip(reason) = decision {
            self.counts[reason.index()] += 1;
        }
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.counts[reason.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkipReason, usize)> + '_ {
        SkipReason::ALL.iter().map(|r| (*r, self.get(*r)))
    }
}

impl Serialize for SkipCounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(SkipReason::ALL.len()))?;
        for (reason, count) in self.iter() {
            map.serialize_entry(reason.as_str(), &count)?;
        }
        map.end()
    }
}

impl<'d> FromIterator<&'d Decision> for SkipCounts {
    fn from_iter<I: IntoIterator<Item = &'d Decision>>(iter: I) -> Self {
        let mut counts = SkipCounts::default();
        for decision in iter {
            counts.record(decision);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSetBuilder;

    fn virtual_record(rel: &str, size: u64) -> FileRecord {
        // Absolute path deliberately missing: the binary rule fails open to text.
        FileRecord::new(
            PathBuf::from("/nonexistent/xsnapshot-root").join(rel),
            PathBuf::from(rel),
            size,
        )
    }

    fn default_rules() -> RuleSet {
        RuleSet::builder().build().unwrap()
    }

    #[test]
    fn chain_order_is_fixed() {
        let names: Vec<_> = RULE_CHAIN.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            [
                "manifest",
                "user-include",
                "extension",
                "filename",
                "directory",
                "user-exclude",
                "size",
                "binary"
            ]
        );
        let policy: Vec<_> = RULE_CHAIN.iter().filter(|r| r.policy).map(|r| r.name).collect();
        assert_eq!(policy, ["extension", "filename", "directory", "user-exclude"]);
    }

    #[test]
    fn record_extension_is_lowercase_and_dotted() {
        let rec = virtual_record("img/Logo.PNG", 10);
        assert_eq!(rec.extension.as_deref(), Some(".png"));
        assert_eq!(virtual_record(".env", 1).extension, None);
        assert_eq!(virtual_record("Makefile", 1).extension, None);
    }

    #[test]
    fn plain_source_is_kept() {
        let verdict = FileClassifier::new(&default_rules()).explain(&virtual_record("src/main.rs", 100));
        assert_eq!(verdict.decision, Decision::Keep);
        assert_eq!(verdict.decided_by, None);
    }

    #[test]
    fn extension_exclusion() {
        assert_eq!(
            decide(&virtual_record("assets/logo.png", 10), &default_rules()),
            Decision::Skip(SkipReason::Extension)
        );
    }

    #[test]
    fn env_filenames_use_exact_match() {
        let rules = default_rules();
        assert_eq!(
            decide(&virtual_record("secrets.env", 10), &rules),
            Decision::Skip(SkipReason::Filename)
        );
        assert_eq!(
            decide(&virtual_record(".env", 10), &rules),
            Decision::Skip(SkipReason::Filename)
        );
        assert_eq!(
            decide(&virtual_record("config/.env.local", 10), &rules),
            Decision::Skip(SkipReason::Filename)
        );
        // not listed verbatim, so not a filename match
        assert_eq!(decide(&virtual_record(".env.example", 10), &rules), Decision::Keep);
        assert_eq!(decide(&virtual_record("app.env.sample", 10), &rules), Decision::Keep);
    }

    #[test]
    fn directory_exclusion_beats_own_extension() {
        assert_eq!(
            decide(&virtual_record("node_modules/foo/bar.js", 10), &default_rules()),
            Decision::Skip(SkipReason::Directory)
        );
    }

    #[test]
    fn extension_is_checked_before_directory() {
        assert_eq!(
            decide(&virtual_record("node_modules/foo/icon.png", 10), &default_rules()),
            Decision::Skip(SkipReason::Extension)
        );
    }

    #[test]
    fn user_exclude_matches_normalized_relative_path() {
        let rules = RuleSet::builder()
            .exclude_patterns(&[r"^docs/.*\.md$"])
            .build()
            .unwrap();
        assert_eq!(
            decide(&virtual_record("docs/guide/intro.md", 10), &rules),
            Decision::Skip(SkipReason::UserExclude)
        );
        assert_eq!(decide(&virtual_record("README.md", 10), &rules), Decision::Keep);
    }

    #[test]
    fn size_exclusion_uses_strictly_greater() {
        let rules = RuleSet::builder().max_file_bytes(100).build().unwrap();
        assert_eq!(decide(&virtual_record("a.txt", 100), &rules), Decision::Keep);
        assert_eq!(
            decide(&virtual_record("a.txt", 101), &rules),
            Decision::Skip(SkipReason::Size)
        );
    }

    #[test]
    fn six_mb_file_over_five_mb_limit() {
        let rules = RuleSet::builder().max_file_mb(5).build().unwrap();
        assert_eq!(
            decide(&virtual_record("data/dump.sql", 6 * 1024 * 1024), &rules),
            Decision::Skip(SkipReason::Size)
        );
    }

    #[test]
    fn manifest_overrides_everything() {
        let rules = RuleSet::builder()
            .max_file_bytes(1)
            .exclude_patterns(&["package"])
            .build()
            .unwrap();
        let verdict =
            FileClassifier::new(&rules).explain(&virtual_record("node_modules/x/package.json", 999));
        assert_eq!(verdict.decision, Decision::Keep);
        assert_eq!(verdict.decided_by, Some("manifest"));
    }

    #[test]
    fn manifest_override_needs_preservation_flag() {
        let rules = RuleSet::builder()
            .preserve_manifests(false)
            .build()
            .unwrap();
        assert_eq!(
            decide(&virtual_record("node_modules/x/package.json", 10), &rules),
            Decision::Skip(SkipReason::Directory)
        );
    }

    #[test]
    fn include_overrides_policy_rules() {
        let rules = RuleSet::builder()
            .include_patterns(&[r"^vendor/keep/", r"\.lock$"])
            .exclude_patterns(&["keep"])
            .build()
            .unwrap();
        let classifier = FileClassifier::new(&rules);

        let verdict = classifier.explain(&virtual_record("vendor/keep/lib.c", 10));
        assert_eq!(verdict.decision, Decision::Keep);
        assert!(verdict.include_override);
        assert_eq!(classifier.decide(&virtual_record("Cargo.lock", 10)), Decision::Keep);
        assert_eq!(
            classifier.decide(&virtual_record("vendor/other/lib.c", 10)),
            Decision::Skip(SkipReason::Directory)
        );
    }

    #[test]
    fn include_does_not_override_size() {
        let rules = RuleSet::builder()
            .include_patterns(&[r"\.png$"])
            .max_file_bytes(1024)
            .build()
            .unwrap();
        let verdict = FileClassifier::new(&rules).explain(&virtual_record("big.png", 4096));
        assert_eq!(verdict.decision, Decision::Skip(SkipReason::Size));
        assert_eq!(verdict.decided_by, Some("size"));
        assert!(verdict.include_override);
    }

    #[test]
    fn include_does_not_override_binary_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.png");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let record = FileRecord::new(path, PathBuf::from("blob.png"), 2048);
        let rules = RuleSet::builder()
            .include_patterns(&[r"\.png$"])
            .build()
            .unwrap();
        assert_eq!(decide(&record, &rules), Decision::Skip(SkipReason::Binary));
    }

    #[test]
    fn manifest_kept_even_when_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cargo.toml");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let record = FileRecord::new(path, PathBuf::from("Cargo.toml"), 2048);
        assert_eq!(decide(&record, &default_rules()), Decision::Keep);
    }

    #[test]
    fn empty_rules_keep_everything_textual() {
        let rules = RuleSetBuilder::empty().preserve_manifests(false).build().unwrap();
        assert_eq!(decide(&virtual_record("node_modules/a.png", 10), &rules), Decision::Keep);
    }

    #[test]
    fn skip_counts_track_each_reason() {
        let decisions = [
            Decision::Keep,
            Decision::Skip(SkipReason::Size),
            Decision::Skip(SkipReason::Size),
            Decision::Skip(SkipReason::UserExclude),
        ];
        let counts: SkipCounts = decisions.iter().collect();
        assert_eq!(counts.get(SkipReason::Size), 2);
        assert_eq!(counts.get(SkipReason::UserExclude), 1);
        assert_eq!(counts.get(SkipReason::Binary), 0);
        assert_eq!(counts.total(), 3);

        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(
            json,
            r#"{"extension":0,"filename":0,"directory":0,"user-exclude":1,"size":2,"binary":0}"#
        );
    }

    #[test]
    fn reason_vocabulary() {
        let words: Vec<_> = SkipReason::ALL.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            words,
            ["extension", "filename", "directory", "user-exclude", "size", "binary"]
        );
    }
}
