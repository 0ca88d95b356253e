use crate::error::Result;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Commit counts for one org's files, split by bucket and by author org.
/// `None` collects authors that resolve to no selected org.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorMatrix {
    buckets: Vec<HashMap<Option<String>, u64>>,
}

impl AuthorMatrix {
    pub fn new(groups: usize) -> Self {
        Self {
            buckets: vec![HashMap::new(); groups],
        }
    }

    pub fn record(&mut self, bucket: usize, author_org: Option<&str>) {
        *self.buckets[bucket]
            .entry(author_org.map(str::to_string))
            .or_insert(0) += 1;
    }

    /// Commits to `org`'s files authored by `org` members.
    pub fn internal(&self, bucket: usize, org: &str) -> u64 {
        self.buckets
            .get(bucket)
            .and_then(|counts| counts.get(&Some(org.to_string())))
            .copied()
            .unwrap_or(0)
    }

    /// Commits to `org`'s files authored by members of other selected orgs.
    pub fn external(&self, bucket: usize, org: &str) -> u64 {
        self.buckets
            .get(bucket)
            .map(|counts| {
                counts
                    .iter()
                    .filter(|(author, _)| matches!(author, Some(a) if a != org))
                    .map(|(_, n)| *n)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn unresolved(&self, bucket: usize) -> u64 {
        self.buckets
            .get(bucket)
            .and_then(|counts| counts.get(&None))
            .copied()
            .unwrap_or(0)
    }
}

/// Per-run memo of [`AuthorMatrix`] by org. Each org is computed at most once
/// and never recomputed for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct OrgFilesCache {
    entries: HashMap<String, AuthorMatrix>,
}

impl OrgFilesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, org: &str) -> Option<&AuthorMatrix> {
        self.entries.get(org)
    }

    pub fn get_or_try_insert_with<F>(&mut self, org: &str, compute: F) -> Result<&AuthorMatrix>
    where
        F: FnOnce() -> Result<AuthorMatrix>,
    {
        match self.entries.entry(org.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(compute()?)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
