use crate::cli_args::MetricsArgs;
use crate::load_config_for_command;
use crate::output::{print_metrics_pretty_table, print_structured};
use anyhow::{Context, Result};
use log;
use xsnapshot_core::{self as core, Config, GatherOptions, RuleSet, SecretRedactor};

pub fn handle_metrics_command(args: MetricsArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config_for_command(&project_root, &args.project_config, &args.filters)
        .context("Failed to load configuration for metrics command")?;
    let rules = RuleSet::from_config(&config.filters).context("Invalid filter configuration")?;
    let redactor = SecretRedactor::from_config(&config.redaction)
        .context("Invalid redaction configuration")?;

    log::debug!("Gathering files for metrics...");
    let options = GatherOptions {
        use_gitignore: config.general.use_gitignore,
        skip_dirs: vec![config.resolve_output_dir(&project_root)],
    };
    let gathered = core::gather_files(&project_root, &rules, &redactor, &options)
        .context("Failed to gather files for metrics calculation")?;

    if gathered.kept.is_empty() && !quiet && args.format_output.format.is_none() {
        println!("No files were kept; nothing to measure.");
        return Ok(());
    }

    log::debug!("Calculating metrics...");
    let metrics = core::calculate_metrics(&gathered.kept)
        .context("Failed to calculate metrics")?;
    log::debug!("Metrics calculation complete.");

    if args.format_output.format.is_none() {
        print_metrics_pretty_table(&metrics)
    } else {
        print_structured(&metrics, &args.format_output)
    }
}
