use super::Metric;
use crate::cache::{AuthorMatrix, OrgFilesCache};
use crate::config::RunConfig;
use crate::error::Result;
use crate::git::HistorySource;
use crate::model::{LogFilter, MetricTable};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

const REVIEW_TRAILERS: &str = "acked-by|tested-by|reviewed-by";
const REPORT_TRAILERS: &str = "reported-by|suggested-by";

/// Runs metrics against one history source for one run configuration.
///
/// The org-files matrix shared by the internal and external metrics lives in
/// the borrowed [`OrgFilesCache`], so whichever of the two runs first pays for
/// the restricted-path queries.
pub struct MetricEngine<'a> {
    source: &'a dyn HistorySource,
    run: &'a RunConfig,
    cache: &'a mut OrgFilesCache,
    show_progress: bool,
}

impl<'a> MetricEngine<'a> {
    pub fn new(source: &'a dyn HistorySource, run: &'a RunConfig, cache: &'a mut OrgFilesCache) -> Self {
        Self {
            source,
            run,
            cache,
            show_progress: false,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run(&mut self, metric: Metric) -> Result<MetricTable> {
        match metric {
            Metric::TotalPatches => self.total_patches(),
            Metric::ReviewedPatches => self.count_by_trailer(REVIEW_TRAILERS, "Counting org-reviewed patches"),
            Metric::ReportedByPatches => self.count_by_trailer(REPORT_TRAILERS, "Counting org-reported patches"),
            Metric::InternalPatchesToOrgFiles => self.internal_patches_to_org_files(),
            Metric::ExternalPatchesToOrgFiles => self.external_patches_to_org_files(),
        }
    }

    fn total_patches(&mut self) -> Result<MetricTable> {
        let run = self.run;
        let mut table = MetricTable::with_orgs(run.groups(), &run.orgs);
        let log = self.source.query(&LogFilter::since(run.since))?;

        let pb = self.progress("Counting total patches", log.len());
        let mut unresolved = 0usize;
        for record in &log {
            match run.resolver.resolve(&record.email) {
                Some(org) => table.add(run.buckets.index(record.timestamp), org, 1),
                None => {
                    unresolved += 1;
                    debug!(email = %record.email, "author matches no selected org");
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if unresolved > 0 {
            debug!(unresolved, total = log.len(), "commits left out of every org's total");
        }
        Ok(table)
    }

    /// One grep query per org; matching commits count for that org regardless
    /// of who authored them.
    fn count_by_trailer(&mut self, trailers: &str, label: &str) -> Result<MetricTable> {
        let run = self.run;
        let mut table = MetricTable::with_orgs(run.groups(), &run.orgs);

        let pb = self.progress(label, run.orgs.len());
        for org in &run.orgs {
            let pattern = format!("({trailers}):.*{}", run.resolver.trailer_pattern(org));
            let log = self.source.query(&LogFilter::since(run.since).with_grep(pattern))?;
            for record in &log {
                table.add(run.buckets.index(record.timestamp), org, 1);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(table)
    }

    fn internal_patches_to_org_files(&mut self) -> Result<MetricTable> {
        let run = self.run;
        let mut table = MetricTable::with_orgs(run.groups(), &run.orgs);

        let pb = self.progress("Counting internal patches to organization files", run.orgs.len());
        for org in &run.orgs {
            let matrix = self.org_files_matrix(org)?;
            for bucket in 0..run.groups() {
                table.add(bucket, org, matrix.internal(bucket, org));
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(table)
    }

    fn external_patches_to_org_files(&mut self) -> Result<MetricTable> {
        let run = self.run;
        let mut table = MetricTable::with_orgs(run.groups(), &run.orgs);

        let pb = self.progress("Counting external patches to organization files", run.orgs.len());
        for org in &run.orgs {
            let matrix = self.org_files_matrix(org)?;
            let mut unresolved = 0;
            for bucket in 0..run.groups() {
                table.add(bucket, org, matrix.external(bucket, org));
                unresolved += matrix.unresolved(bucket);
            }
            if unresolved > 0 {
                debug!(org, unresolved, "patches to org files by authors of no selected org");
            }
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(table)
    }

    fn org_files_matrix(&mut self, org: &str) -> Result<&AuthorMatrix> {
        let source = self.source;
        let run = self.run;
        self.cache.get_or_try_insert_with(org, || {
            let mut matrix = AuthorMatrix::new(run.groups());
            let globs = run.file_globs(org);
            // no globs would turn into an unrestricted query
            if globs.is_empty() {
                debug!(org, "org has no file patterns");
                return Ok(matrix);
            }

            let log = source.query(&LogFilter::since(run.since).with_paths(globs))?;
            for record in &log {
                matrix.record(
                    run.buckets.index(record.timestamp),
                    run.resolver.resolve(&record.email),
                );
            }
            debug!(org, commits = log.len(), "org files history cached");
            Ok(matrix)
        })
    }

    fn progress(&self, label: &str, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} {percent}% ({pos} / {len}) [{elapsed_precise} / {eta_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(label.to_string());
        pb
    }
}
