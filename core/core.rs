pub mod bundle;
pub mod classify;
pub mod config;
pub mod defaults;
pub mod error;
pub mod gather;
pub mod git;
pub mod redact;
pub mod rules;
pub mod sniff;
pub mod stats;
pub mod tree;

pub use bundle::SnapshotBundle;
pub use classify::{Decision, FileClassifier, FileRecord, SkipCounts, SkipReason, Verdict};
pub use config::Config;
pub use error::{AppError, Result};
pub use gather::{FileInfo, GatherOptions, GatherResult, ScannedFile, WalkError, gather_files};
pub use redact::SecretRedactor;
pub use rules::RuleSet;
pub use sniff::{BinarySniffer, ContentKind};
pub use stats::{ProjectMetrics, calculate_metrics};
pub use tree::TreeNode;
