mod log;
mod repo;

pub use log::GitLog;
pub use repo::GitRepo;

use crate::error::Result;
use crate::model::{CommitRecord, LogFilter};

/// Batch access to commit history. Results are unordered and fully
/// materialized; a failing query aborts the caller.
pub trait HistorySource {
    fn query(&self, filter: &LogFilter) -> Result<Vec<CommitRecord>>;
}

impl<S: HistorySource + ?Sized> HistorySource for &S {
    fn query(&self, filter: &LogFilter) -> Result<Vec<CommitRecord>> {
        (**self).query(filter)
    }
}

/// Case-insensitive message grep, matched line by line like `git log -i -E --grep`.
pub(crate) fn grep_regex(pattern: &str) -> Result<regex::Regex> {
    Ok(regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()?)
}
