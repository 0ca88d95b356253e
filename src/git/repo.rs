use super::{grep_regex, HistorySource};
use crate::error::{Result, StatsError};
use crate::model::{CommitRecord, LogFilter};
use gix::bstr::{BStr, ByteSlice};
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

/// In-process history source backed by gix.
pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
    rev: String,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo,
            path,
            rev: "HEAD".to_string(),
        })
    }

    pub fn with_revision(mut self, rev: impl Into<String>) -> Self {
        self.rev = rev.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tip(&self) -> Result<ObjectId> {
        let id = self
            .repo
            .rev_parse_single(self.rev.as_str())
            .map_err(|e| StatsError::GitRepo(format!("Invalid revision '{}': {e}", self.rev)))?;

        let commit = id
            .object()?
            .try_into_commit()
            .map_err(|_| StatsError::GitRepo(format!("Not a commit: {}", self.rev)))?;
        Ok(commit.id)
    }

    fn touches(&self, commit_id: ObjectId, parent_id: Option<ObjectId>, globs: &[String]) -> Result<bool> {
        let commit_tree = self.repo.find_commit(commit_id)?.tree()?;
        let changes: Vec<ChangeDetached> = match parent_id {
            Some(parent_id) => {
                let parent_tree = self.repo.find_commit(parent_id)?.tree()?;
                self.repo.diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), None)?
            }
            None => self.repo.diff_tree_to_tree(None, Some(&commit_tree), None)?,
        };

        Ok(changes
            .iter()
            .flat_map(changed_paths)
            .any(|path| globs.iter().any(|glob| matches_glob(glob, path))))
    }
}

impl HistorySource for GitRepo {
    fn query(&self, filter: &LogFilter) -> Result<Vec<CommitRecord>> {
        let grep = filter.grep.as_deref().map(grep_regex).transpose()?;

        let mut records = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([self.tip()?]);

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
            for pid in &parents {
                stack.push_back(*pid);
            }

            if parents.len() > 1 {
                continue;
            }

            if commit.time()?.seconds < filter.since {
                continue;
            }

            if let Some(re) = &grep {
                let message = commit.message_raw()?;
                if !re.is_match(&message.to_str_lossy()) {
                    continue;
                }
            }

            if !filter.paths.is_empty() && !self.touches(commit_id, parents.first().copied(), &filter.paths)? {
                continue;
            }

            let author = commit.author()?;
            let authored = author
                .time()
                .map_err(|e| StatsError::InvalidDate(format!("author time of {commit_id}: {e}")))?
                .seconds;
            records.push(CommitRecord::new(author.email.to_string(), authored));
        }

        debug!(
            records = records.len(),
            visited = seen.len(),
            paths = ?filter.paths,
            grep = ?filter.grep,
            "history query finished"
        );
        Ok(records)
    }
}

fn changed_paths(change: &ChangeDetached) -> Vec<&BStr> {
    match change {
        ChangeDetached::Addition { location, .. }
        | ChangeDetached::Deletion { location, .. }
        | ChangeDetached::Modification { location, .. } => vec![location.as_bstr()],
        ChangeDetached::Rewrite {
            source_location,
            location,
            ..
        } => vec![source_location.as_bstr(), location.as_bstr()],
    }
}

/// Git pathspec glob semantics: `*` also matches `/`.
fn matches_glob(glob: &str, path: &BStr) -> bool {
    gix::glob::wildmatch(glob.as_bytes().as_bstr(), path, gix::glob::wildmatch::Mode::empty())
}
