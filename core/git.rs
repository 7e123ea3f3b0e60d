use crate::error::{AppError, Result};
use log;
use std::path::Path;
use std::process::Command;

const LOG_FORMAT: &str = "--pretty=format:%h %ad %an %s";

/// Recent commit lines (`<hash> <date> <author> <subject>`), newest first.
///
/// Returns `None` when git is missing, the directory is not a repository, or
/// the log is empty. A snapshot never fails because of git.
pub fn recent_commits(project_root: &Path, max_commits: usize) -> Option<Vec<String>> {
    if max_commits == 0 {
        return None;
    }
    match run_git_log(project_root, max_commits) {
        Ok(lines) if lines.is_empty() => None,
        Ok(lines) => Some(lines),
        Err(e) => {
            log::debug!("Git history unavailable: {}", e);
            None
        }
    }
}

fn run_git_log(project_root: &Path, max_commits: usize) -> Result<Vec<String>> {
    let output = Command::new("git")
        .arg("-C")
        .arg(project_root)
        .args(["log", "-n", &max_commits.to_string(), "--date=short", LOG_FORMAT])
        .output()
        .map_err(|e| AppError::Git(format!("failed to run git: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Git(format!(
            "git log exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<String> = stdout
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    log::debug!("Collected {} git log lines", lines.len());
    Ok(lines)
}
