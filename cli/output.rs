use anyhow::{Context, Result};
use colored::*;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use xsnapshot_core::{ProjectMetrics, SnapshotBundle};

use crate::cli_args::FormatOutputOpts;
use crate::commands::explain::ExplainReport;

pub fn print_structured<T: Serialize>(data: &T, format_opts: &FormatOutputOpts) -> Result<()> {
    let format = format_opts.format.as_deref().unwrap_or("json");
    let content = match format {
        "yaml" | "yml" => serde_yml::to_string(data).context("Failed to serialize to YAML")?,
        _ if format_opts.minify => {
            serde_json::to_string(data).context("Failed to serialize to JSON")?
        }
        _ => serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?,
    };
    write_to_stdout(&content)
}

pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content.as_bytes())
        .context("Failed to write to stdout")?;
    if !content.is_empty() && !content.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write newline to stdout")?;
    }
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

pub fn print_generate_report(bundle: &SnapshotBundle, written: &[PathBuf]) {
    let meta = &bundle.metadata;
    println!(
        "{} Snapshot of {} written:",
        "✅".green(),
        meta.project_name.cyan().bold()
    );
    for path in written {
        println!("   {}", path.display().to_string().blue());
    }
    println!(
        "{:<16} {} kept, {} skipped",
        "Files:".green(),
        meta.files_kept.to_string().cyan(),
        meta.files_skipped.to_string().cyan()
    );
    let reasons: Vec<String> = meta
        .skip_counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(reason, count)| format!("{} {}", reason, count))
        .collect();
    if !reasons.is_empty() {
        println!("{:<16} {}", "Skipped by:".green(), reasons.join(", ").dimmed());
    }
    println!(
        "{:<16} {} lines, {}, ~{} tokens",
        "Kept content:".green(),
        meta.totals.lines,
        meta.totals.bytes_readable,
        meta.totals.estimated_tokens
    );
    if meta.redaction_enabled {
        println!(
            "{:<16} {}",
            "Redactions:".green(),
            meta.redactions.to_string().cyan()
        );
    } else {
        println!("{:<16} {}", "Redactions:".green(), "disabled".yellow());
    }
    if meta.read_errors > 0 {
        println!(
            "{} {} file(s) could not be read; see contents.txt for markers.",
            "⚠️".yellow(),
            meta.read_errors
        );
    }
    if !meta.walk_errors.is_empty() {
        println!(
            "{} {} path(s) could not be walked; see summary.txt.",
            "⚠️".yellow(),
            meta.walk_errors.len()
        );
    }
}

pub fn print_explain_table(report: &ExplainReport) {
    if report.files.is_empty() {
        println!("{}", "(No files matched)".yellow());
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Path").fg(Color::Green),
            Cell::new("Decision").fg(Color::Green),
            Cell::new("Reason").fg(Color::Green),
            Cell::new("Rule").fg(Color::Green),
        ]);
        for entry in &report.files {
            let decision_color = if entry.decision == "keep" {
                Color::Green
            } else {
                Color::Yellow
            };
            let rule = match (entry.decided_by, entry.include_override) {
                (Some(rule), true) => format!("{} (include)", rule),
                (Some(rule), false) => rule.to_string(),
                (None, true) => "include".to_string(),
                (None, false) => "-".to_string(),
            };
            table.add_row(vec![
                Cell::new(&entry.path).fg(Color::Cyan),
                Cell::new(entry.decision).fg(decision_color),
                Cell::new(entry.reason.map(|r| r.as_str()).unwrap_or("-")),
                Cell::new(rule).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
    }
    println!(
        "{:<12} {}   {:<12} {}",
        "Kept:".green(),
        report.kept.to_string().cyan(),
        "Skipped:".green(),
        report.skip_counts.total().to_string().cyan()
    );
    for (reason, count) in report.skip_counts.iter() {
        println!("  {:<14} {}", format!("{}:", reason), count);
    }
    for walk_error in &report.walk_errors {
        println!(
            "{} {}: {}",
            "Walk error:".yellow(),
            walk_error.path.as_deref().unwrap_or("(unknown path)"),
            walk_error.error
        );
    }
}

pub fn print_metrics_pretty_table(metrics: &ProjectMetrics) -> Result<()> {
    println!();
    println!("{}", " Project Metrics Summary ".green().bold().underline());
    println!(
        "{:<20} {}",
        "Total Files:".green(),
        metrics.total_files.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Lines:".green(),
        metrics.total_lines.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Total Size:".green(),
        metrics.total_bytes_readable.cyan()
    );
    println!(
        "{:<20} {}",
        "Est. Tokens:".green(),
        metrics.estimated_tokens.to_string().cyan()
    );
    println!(
        "{:<20} {}",
        "Redactions:".green(),
        metrics.total_redactions.to_string().cyan()
    );

    if metrics.files_details.is_empty() {
        println!("\n{}", "(No files included in metrics)".yellow());
        println!();
        return Ok(());
    }

    println!("\n{}", " By Extension ".green().bold().underline());
    let mut ext_table = Table::new();
    ext_table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    ext_table.set_header(vec![
        Cell::new("Extension").fg(Color::Green),
        Cell::new("Files").fg(Color::Green),
        Cell::new("Lines").fg(Color::Green),
    ]);
    for (ext, m) in &metrics.by_extension {
        ext_table.add_row(vec![
            Cell::new(ext).fg(Color::Cyan),
            Cell::new(m.files).set_alignment(CellAlignment::Right),
            Cell::new(m.lines).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{ext_table}");

    println!("\n{}", " File Details ".green().bold().underline());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Green),
        Cell::new("Lines").fg(Color::Green),
        Cell::new("Size").fg(Color::Green),
        Cell::new("Tokens").fg(Color::Green),
    ]);
    for file in &metrics.files_details {
        table.add_row(vec![
            Cell::new(&file.path).fg(Color::Cyan),
            Cell::new(file.lines).set_alignment(CellAlignment::Right),
            Cell::new(&file.bytes_readable)
                .set_alignment(CellAlignment::Right)
                .fg(Color::DarkGrey),
            Cell::new(file.estimated_tokens).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
    println!();
    Ok(())
}
