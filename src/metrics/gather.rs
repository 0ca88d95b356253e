use super::{parse_metrics, MetricEngine};
use crate::cache::OrgFilesCache;
use crate::config::RunConfig;
use crate::error::Result;
use crate::git::HistorySource;
use crate::model::OrgCounts;
use console::style;
use std::time::Instant;
use tracing::info;

/// Bucket-major results: `results[bucket][i]` holds the org counts of the
/// metric named `headers[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatheredStats {
    pub results: Vec<Vec<OrgCounts>>,
    pub headers: Vec<String>,
}

/// Run `metrics` in the given order. Every name is validated before the
/// first query; any failure afterwards aborts the whole run.
pub fn gather_stats(
    source: &dyn HistorySource,
    run: &RunConfig,
    cache: &mut OrgFilesCache,
    metrics: &[String],
    show_progress: bool,
) -> Result<GatheredStats> {
    let metrics = parse_metrics(metrics)?;

    let total = metrics.len();
    let mut results: Vec<Vec<OrgCounts>> = vec![Vec::with_capacity(total); run.groups()];
    let mut headers = Vec::with_capacity(total);
    let mut engine = MetricEngine::new(source, run, cache).show_progress(show_progress);

    for (step, metric) in metrics.into_iter().enumerate() {
        if show_progress {
            println!("{}", style(format!("======= STEP {step} / {total}: {metric}")).bold());
        }
        let started = Instant::now();

        let table = engine.run(metric)?;
        for (bucket, counts) in table.into_buckets().into_iter().enumerate() {
            results[bucket].push(counts);
        }
        headers.push(metric.name().to_string());

        info!(metric = metric.name(), elapsed = ?started.elapsed(), "metric gathered");
        if show_progress {
            println!();
        }
    }

    Ok(GatheredStats { results, headers })
}
