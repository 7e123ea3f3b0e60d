use crate::cli_args::ExplainArgs;
use crate::load_config_for_command;
use crate::output::{print_explain_table, print_structured};
use anyhow::{Context, Result};
use log;
use serde::Serialize;
use xsnapshot_core::bundle::WalkErrorEntry;
use xsnapshot_core::gather::{self, GatherOptions};
use xsnapshot_core::{Config, RuleSet, ScannedFile, SkipCounts, SkipReason};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainEntry {
    pub path: String,
    pub size: u64,
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<&'static str>,
    pub include_override: bool,
}

impl From<&ScannedFile> for ExplainEntry {
    fn from(scanned: &ScannedFile) -> Self {
        let decision = scanned.decision();
        Self {
            path: scanned.record.normalized_path(),
            size: scanned.record.size,
            decision: if decision.is_keep() { "keep" } else { "skip" },
            reason: decision.reason(),
            decided_by: scanned.verdict.decided_by,
            include_override: scanned.verdict.include_override,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainReport {
    pub kept: usize,
    pub skip_counts: SkipCounts,
    pub walk_errors: Vec<WalkErrorEntry>,
    pub files: Vec<ExplainEntry>,
}

pub fn handle_explain_command(args: ExplainArgs, _quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(&project_root, &args.project_config, &args.filters)
        .context("Failed to load configuration for explain command")?;
    let rules = RuleSet::from_config(&config.filters).context("Invalid filter configuration")?;

    let options = GatherOptions {
        use_gitignore: config.general.use_gitignore,
        skip_dirs: vec![config.resolve_output_dir(&project_root)],
    };
    let discovery =
        gather::discover_files(&project_root, &options).context("Failed to walk project")?;
    let walk_errors = discovery.walk_errors.iter().map(WalkErrorEntry::from).collect();
    let scanned = gather::classify_files(discovery.records, &rules);

    let skip_counts: SkipCounts = scanned.iter().map(|f| &f.verdict.decision).collect();
    let kept = scanned.len() - skip_counts.total();
    let files = scanned
        .iter()
        .filter(|f| {
            let keep = f.decision().is_keep();
            !((args.skipped && keep) || (args.kept && !keep))
        })
        .map(ExplainEntry::from)
        .collect();
    let report = ExplainReport {
        kept,
        skip_counts,
        walk_errors,
        files,
    };

    if args.format_output.format.is_none() {
        print_explain_table(&report);
        Ok(())
    } else {
        print_structured(&report, &args.format_output)
    }
}
