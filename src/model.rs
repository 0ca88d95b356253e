use crate::error::{Result, StatsError};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Field separator in history record lines. Never valid inside an email address.
pub const RECORD_SEP: char = '§';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub email: String,
    /// Author date, epoch seconds.
    pub timestamp: i64,
}

impl CommitRecord {
    pub fn new(email: impl Into<String>, timestamp: i64) -> Self {
        Self { email: email.into(), timestamp }
    }

    /// Parse a `<email>§<epoch-seconds>` line.
    pub fn parse_line(line: &str) -> Result<Self> {
        let (email, timestamp) = line
            .split_once(RECORD_SEP)
            .ok_or_else(|| StatsError::MalformedRecord(line.to_string()))?;
        let timestamp = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| StatsError::MalformedRecord(line.to_string()))?;
        Ok(Self::new(email, timestamp))
    }
}

/// What a history query selects. Merge commits are never included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub since: i64,
    pub paths: Vec<String>,
    pub grep: Option<String>,
}

impl LogFilter {
    pub fn since(since: i64) -> Self {
        Self {
            since,
            paths: Vec::new(),
            grep: None,
        }
    }

    pub fn with_paths(mut self, paths: &[String]) -> Self {
        self.paths = paths.to_vec();
        self
    }

    pub fn with_grep(mut self, pattern: impl Into<String>) -> Self {
        self.grep = Some(pattern.into());
        self
    }
}

pub type OrgCounts = IndexMap<String, u64>;

/// Per-bucket, per-org commit counts produced by one metric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricTable {
    buckets: Vec<OrgCounts>,
}

impl MetricTable {
    pub fn new(groups: usize) -> Self {
        Self {
            buckets: vec![OrgCounts::new(); groups],
        }
    }

    pub fn with_orgs(groups: usize, orgs: &[String]) -> Self {
        let zeroed: OrgCounts = orgs.iter().map(|org| (org.clone(), 0)).collect();
        Self {
            buckets: vec![zeroed; groups],
        }
    }

    pub fn add(&mut self, bucket: usize, org: &str, count: u64) {
        *self.buckets[bucket].entry(org.to_string()).or_insert(0) += count;
    }

    pub fn get(&self, bucket: usize, org: &str) -> u64 {
        self.buckets
            .get(bucket)
            .and_then(|counts| counts.get(org))
            .copied()
            .unwrap_or(0)
    }

    pub fn groups(&self) -> usize {
        self.buckets.len()
    }

    pub fn total(&self, org: &str) -> u64 {
        (0..self.groups()).map(|b| self.get(b, org)).sum()
    }

    pub fn into_buckets(self) -> Vec<OrgCounts> {
        self.buckets
    }
}

/// The result object handed to renderers and written as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    #[serde(deserialize_with = "whole_number")]
    pub version: u32,
    pub gen_time: NaiveDate,
    #[serde(rename = "time_period_days")]
    pub period_days: u32,
    pub repo: String,
    pub timestamps: Vec<String>,
    pub metrics: Vec<String>,
    pub orgs: Vec<String>,
    pub data: IndexMap<String, IndexMap<String, OrgCounts>>,
}

/// Accepts `1` as well as `1.0`, which older writers emit.
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u32),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(n) => Ok(n),
        Number::Float(f) if f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f) => Ok(f as u32),
        Number::Float(f) => Err(serde::de::Error::custom(format!("invalid version {f}"))),
    }
}

impl StatsReport {
    pub fn count(&self, metric: &str, timestamp: &str, org: &str) -> u64 {
        self.data
            .get(metric)
            .and_then(|by_time| by_time.get(timestamp))
            .and_then(|counts| counts.get(org))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self, metric: &str, org: &str) -> u64 {
        self.timestamps
            .iter()
            .map(|time| self.count(metric, time, org))
            .sum()
    }
}
