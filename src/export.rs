use crate::config::RunConfig;
use crate::error::{Result, StatsError};
use crate::metrics::GatheredStats;
use crate::model::{OrgCounts, StatsReport, SCHEMA_VERSION};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::path::Path;

/// Build the report object from gathered, bucket-major results.
pub fn generate(run: &RunConfig, repo: &str, stats: &GatheredStats, today: NaiveDate) -> StatsReport {
    let timestamps = run.buckets.labels();

    let data = stats
        .headers
        .iter()
        .enumerate()
        .map(|(metric_id, metric)| {
            let by_time: IndexMap<String, OrgCounts> = timestamps
                .iter()
                .enumerate()
                .map(|(time_id, time)| {
                    let counts: OrgCounts = run
                        .orgs
                        .iter()
                        .map(|org| {
                            let count = stats
                                .results
                                .get(time_id)
                                .and_then(|row| row.get(metric_id))
                                .and_then(|counts| counts.get(org))
                                .copied()
                                .unwrap_or(0);
                            (org.clone(), count)
                        })
                        .collect();
                    (time.clone(), counts)
                })
                .collect();
            (metric.clone(), by_time)
        })
        .collect::<IndexMap<_, _>>();

    StatsReport {
        version: SCHEMA_VERSION,
        gen_time: today,
        period_days: run.buckets.period_days(),
        repo: repo.to_string(),
        timestamps,
        metrics: stats.headers.clone(),
        orgs: run.orgs.clone(),
        data,
    }
}

pub fn write(path: &Path, report: &StatsReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn read(path: &Path) -> Result<StatsReport> {
    let content = std::fs::read_to_string(path)?;
    let report: StatsReport = serde_json::from_str(&content)?;
    if report.version != SCHEMA_VERSION {
        return Err(StatsError::Config(format!(
            "Schema version mismatch: expected {}, found {}",
            SCHEMA_VERSION, report.version
        )));
    }
    Ok(report)
}
