use anyhow::{Context, Result};
use colored::*;
use std::fs;
use xsnapshot_core::config::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME};
use xsnapshot_core::{AppError, Config};

use crate::cli_args::ConfigArgs;
use crate::output::write_to_stdout;

pub fn handle_config_command(args: &ConfigArgs, quiet: bool) -> Result<()> {
    let default_toml = toml::to_string_pretty(&Config::default())
        .context("Failed to serialize default config to TOML")?;

    if !args.save {
        return write_to_stdout(&default_toml);
    }

    let project_root = Config::determine_project_root(args.project_root.as_ref())
        .context("Failed to determine project root")?;
    let config_dir = project_root.join(DEFAULT_CONFIG_DIR);
    let config_path = config_dir.join(DEFAULT_CONFIG_FILENAME);

    if config_path.exists() && !args.force {
        anyhow::bail!(AppError::InvalidArgument(format!(
            "Config file already exists at '{}'. Pass --force to overwrite.",
            config_path.display()
        )));
    }

    fs::create_dir_all(&config_dir).map_err(|e| AppError::DirCreation {
        path: config_dir.clone(),
        source: e,
    })?;
    fs::write(&config_path, &default_toml).map_err(|e| AppError::FileWrite {
        path: config_path.clone(),
        source: e,
    })?;

    if !quiet {
        println!(
            "{} Default config saved to: {}",
            "✅".green(),
            config_path.display().to_string().blue()
        );
    }
    Ok(())
}
