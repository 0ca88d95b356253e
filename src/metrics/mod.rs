pub mod engine;
pub mod gather;

pub use engine::MetricEngine;
pub use gather::{gather_stats, GatheredStats};

use crate::error::{Result, StatsError};
use std::fmt;
use std::str::FromStr;

/// Prefix marking a metric name as excluded in a selection list.
pub const EXCLUDE_PREFIX: char = '^';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalPatches,
    ReviewedPatches,
    InternalPatchesToOrgFiles,
    ExternalPatchesToOrgFiles,
    ReportedByPatches,
}

impl Metric {
    /// Every metric, in default run order.
    pub const ALL: [Metric; 5] = [
        Metric::TotalPatches,
        Metric::ReviewedPatches,
        Metric::InternalPatchesToOrgFiles,
        Metric::ExternalPatchesToOrgFiles,
        Metric::ReportedByPatches,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::TotalPatches => "total_patches",
            Metric::ReviewedPatches => "reviewed_patches",
            Metric::InternalPatchesToOrgFiles => "internal_patches_to_org_files",
            Metric::ExternalPatchesToOrgFiles => "external_patches_to_org_files",
            Metric::ReportedByPatches => "reported_by_patches",
        }
    }

    pub fn pretty_name(self) -> &'static str {
        match self {
            Metric::TotalPatches => "Merged patches",
            Metric::ReviewedPatches => "Reviewed patches",
            Metric::InternalPatchesToOrgFiles => "Patches to org files from members",
            Metric::ExternalPatchesToOrgFiles => "Patches to org files from non-members",
            Metric::ReportedByPatches => "Patches suggested by members",
        }
    }

    pub fn known_names() -> Vec<String> {
        Self::ALL.iter().map(|m| m.name().to_string()).collect()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| StatsError::UnknownMetric {
                name: s.to_string(),
                known: Self::known_names(),
            })
    }
}

/// Apply `^name` exclusions to a requested metric list. When nothing but
/// exclusions was requested, the exclusions apply to the full default list.
pub fn select_metrics(requested: &[String]) -> Vec<String> {
    let (excluded, included): (Vec<&String>, Vec<&String>) =
        requested.iter().partition(|m| m.starts_with(EXCLUDE_PREFIX));

    let base: Vec<String> = if included.is_empty() {
        Metric::known_names()
    } else {
        included.into_iter().cloned().collect()
    };

    base.into_iter()
        .filter(|m| !excluded.iter().any(|e| e.strip_prefix(EXCLUDE_PREFIX) == Some(m.as_str())))
        .collect()
}

/// Fails on the first unknown name, before anything runs.
pub fn parse_metrics(names: &[String]) -> Result<Vec<Metric>> {
    names.iter().map(|name| name.parse()).collect()
}
