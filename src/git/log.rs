use super::HistorySource;
use crate::error::{Result, StatsError};
use crate::model::{CommitRecord, LogFilter, RECORD_SEP};
use chrono::DateTime;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// History source that shells out to `git log`.
///
/// The user's global and XDG git config are masked so that options such as
/// `log.showSignature` or a custom `log.date` cannot change the record format.
pub struct GitLog {
    path: PathBuf,
    rev: String,
}

impl GitLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rev: "HEAD".to_string(),
        }
    }

    pub fn with_revision(mut self, rev: impl Into<String>) -> Self {
        self.rev = rev.into();
        self
    }

    fn args(&self, filter: &LogFilter) -> Result<Vec<String>> {
        let since = DateTime::from_timestamp(filter.since, 0)
            .ok_or_else(|| StatsError::InvalidDate(format!("Invalid timestamp: {}", filter.since)))?;

        let mut args = vec![
            "log".to_string(),
            self.rev.clone(),
            "--no-merges".to_string(),
            format!("--format=%ae{RECORD_SEP}%at"),
            format!("--since={}", since.format("%Y-%m-%d %H:%M:%S +0000")),
        ];
        if let Some(pattern) = &filter.grep {
            args.push(format!("--grep={pattern}"));
            args.push("-i".to_string());
            args.push("-E".to_string());
        }
        args.push("--".to_string());
        args.extend(filter.paths.iter().cloned());
        Ok(args)
    }
}

impl HistorySource for GitLog {
    fn query(&self, filter: &LogFilter) -> Result<Vec<CommitRecord>> {
        let args = self.args(filter)?;
        debug!(repo = %self.path.display(), ?args, "running git");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(&args)
            .env("HOME", "")
            .env("XDG_CONFIG_HOME", "")
            .env("GIT_CONFIG_NOGLOBAL", "1")
            .output()
            .map_err(|e| StatsError::Query(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            return Err(StatsError::Query(format!(
                "git log exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_records(&String::from_utf8_lossy(&output.stdout))
    }
}

/// One record per non-empty line; empty output is an empty history.
pub(crate) fn parse_records(stdout: &str) -> Result<Vec<CommitRecord>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(CommitRecord::parse_line)
        .collect()
}
