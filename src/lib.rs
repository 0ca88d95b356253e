pub mod bucket;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod git;
pub mod metrics;
pub mod model;
pub mod org;
pub mod output;

pub use bucket::TimeBuckets;
pub use cache::OrgFilesCache;
pub use config::{OrgConfig, RunConfig};
pub use error::{Result, StatsError};
pub use git::{GitLog, GitRepo, HistorySource};
pub use metrics::{gather_stats, GatheredStats, Metric, MetricEngine};
pub use model::{CommitRecord, LogFilter, MetricTable, StatsReport};
pub use org::OrgResolver;
