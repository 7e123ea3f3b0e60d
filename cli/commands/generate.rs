use crate::cli_args::GenerateArgs;
use crate::load_config_for_command;
use crate::output;
use anyhow::{Context, Result};
use log;
use std::env;
use std::path::Path;
use xsnapshot_core::{
    self as core, Config, GatherOptions, RuleSet, SecretRedactor, SnapshotBundle,
};

fn apply_generate_overrides(config: &mut Config, args: &GenerateArgs) -> Result<()> {
    if let Some(dir) = &args.output {
        config.output.dir = if dir.is_absolute() {
            dir.clone()
        } else {
            env::current_dir()
                .context("Failed to read current directory")?
                .join(dir)
        };
    }
    if args.metadata {
        config.output.write_metadata = true;
    }
    if args.no_tree {
        config.output.include_tree = false;
    }
    if args.no_redact {
        config.redaction.enabled = false;
    }
    if args.no_git {
        config.git.enabled = false;
    }
    if let Some(n) = args.git_commits {
        config.git.max_commits = n;
    }
    Ok(())
}

pub fn handle_generate_command(args: GenerateArgs, quiet: bool) -> Result<()> {
    let project_root = Config::determine_project_root(args.project_config.project_root.as_ref())
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let mut config = load_config_for_command(&project_root, &args.project_config, &args.filters)
        .context("Failed to load configuration")?;
    apply_generate_overrides(&mut config, &args)?;

    let bundle = build_snapshot(&project_root, &config)?;

    if args.stdout {
        log::info!("Writing contents to stdout...");
        return output::write_to_stdout(&bundle.contents);
    }

    let output_dir = config.resolve_output_dir(&project_root);
    let written = bundle
        .write_to(&output_dir)
        .with_context(|| format!("Failed to write bundle to {}", output_dir.display()))?;
    if !quiet {
        output::print_generate_report(&bundle, &written);
    }
    Ok(())
}

/// Runs the full pipeline: policy, walk, classify, read, redact, assemble.
pub fn build_snapshot(project_root: &Path, config: &Config) -> Result<SnapshotBundle> {
    // Pattern errors surface here, before any scanning.
    let rules = RuleSet::from_config(&config.filters).context("Invalid filter configuration")?;
    let redactor = SecretRedactor::from_config(&config.redaction)
        .context("Invalid redaction configuration")?;

    let options = GatherOptions {
        use_gitignore: config.general.use_gitignore,
        skip_dirs: vec![config.resolve_output_dir(project_root)],
    };
    let gathered = core::gather_files(project_root, &rules, &redactor, &options)
        .context("Failed to gather project files")?;

    log::debug!("Calculating metrics...");
    let metrics =
        core::calculate_metrics(&gathered.kept).context("Failed to calculate metrics")?;

    let git_log = if config.git.enabled {
        core::git::recent_commits(project_root, config.git.max_commits)
    } else {
        log::debug!("Git history disabled.");
        None
    };

    SnapshotBundle::build(project_root, config, &gathered, &metrics, git_log)
        .context("Failed to assemble snapshot bundle")
}
