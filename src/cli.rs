use crate::cache::OrgFilesCache;
use crate::config::{OrgConfig, RunConfig};
use crate::error::StatsError;
use crate::export;
use crate::git::{GitLog, GitRepo, HistorySource};
use crate::metrics::{gather_stats, parse_metrics, select_metrics, Metric};
use crate::model::StatsReport;
use crate::output;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orgstats")]
#[command(about = "Per-organization contribution metrics from git history")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, default_value_t = 10, help = "Since when to count patches (in years)")]
    pub since: u32,

    #[arg(short, long, num_args = 1.., value_name = "ORG", help = "Limit to these organizations")]
    pub orgs: Vec<String>,

    #[arg(short, long, help = "Show infos and warnings")]
    pub verbose: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Cli, help = "Output format")]
    pub format: OutputFormat,

    #[arg(short, long, default_value = "results", help = "Directory to save JSON results to")]
    pub dir: PathBuf,

    #[arg(
        short,
        long,
        default_value_t = 730,
        help = "Group the data by this period (in days); 0 uses a single group"
    )]
    pub period: u32,

    #[arg(
        short,
        long,
        num_args = 1..,
        value_name = "METRIC",
        help = "Which metrics to gather (use ^ to exclude a metric). Defaults to all",
        long_help = metrics_help()
    )]
    pub metrics: Vec<String>,

    #[arg(short = 'i', long, num_args = 1.., value_name = "ORG", help = "Highlight these organizations")]
    pub highlight: Vec<String>,

    #[arg(short, long, default_value = "HEAD", help = "Git revision to analyze")]
    pub branch: String,

    #[arg(short, long, help = "Path to git repository (defaults to the current directory)")]
    pub repo: Option<PathBuf>,

    #[arg(short = 'j', long, help = "Load results from a JSON file instead of a repository")]
    pub from_json: Option<PathBuf>,

    #[arg(long, help = "Organization config file (YAML)")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Backend::Gix, help = "How to read history")]
    pub backend: Backend,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Walk history in-process
    Gix,
    /// Run `git log`
    Git,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose);

        if let Some(path) = &self.from_json {
            let report = export::read(path)
                .with_context(|| format!("Failed to load results from '{}'", path.display()))?;
            for org in &self.highlight {
                if !report.orgs.contains(org) {
                    return Err(StatsError::Config(format!(
                        "invalid highlight: '{org}' is not in the loaded orgs"
                    ))
                    .into());
                }
            }
            return self.emit(&report, &self.highlight);
        }

        let config_path = self
            .config
            .as_ref()
            .ok_or_else(|| StatsError::Config("missing required --config file".to_string()))?;
        let org_config = OrgConfig::from_file(config_path)?;

        let now = Utc::now();
        let run = RunConfig::new(
            org_config,
            &self.orgs,
            self.since,
            self.period,
            now,
            &self.highlight,
        )?;

        let metrics = select_metrics(&self.metrics);
        parse_metrics(&metrics)?;
        debug!(
            ?metrics,
            orgs = ?run.orgs,
            years = run.timeframe_years,
            groups = run.groups(),
            "run configured"
        );

        let (source, repo_path): (Box<dyn HistorySource>, PathBuf) = match self.backend {
            Backend::Gix => {
                let repo = GitRepo::open(self.repo.as_ref())
                    .context("Failed to open git repository")?
                    .with_revision(self.branch.as_str());
                let path = repo.path().to_path_buf();
                (Box::new(repo), path)
            }
            Backend::Git => {
                let path = match &self.repo {
                    Some(path) => path.clone(),
                    None => std::env::current_dir()?,
                };
                let log = GitLog::new(path.clone()).with_revision(self.branch.as_str());
                (Box::new(log), path)
            }
        };
        info!(repo = %repo_path.display(), backend = ?self.backend, "gathering stats");

        let mut cache = OrgFilesCache::new();
        let stats = gather_stats(source.as_ref(), &run, &mut cache, &metrics, true)
            .context("Failed to gather stats")?;

        let report = export::generate(&run, &repo_name(&repo_path), &stats, now.date_naive());
        self.emit(&report, &run.highlight)
    }

    fn emit(&self, report: &StatsReport, highlight: &[String]) -> Result<()> {
        match self.format {
            OutputFormat::Cli => {
                output::print_tables(report, highlight);
            }
            OutputFormat::Json => {
                std::fs::create_dir_all(&self.dir).with_context(|| {
                    format!("--format json: failed to create out dir '{}'", self.dir.display())
                })?;
                let path = self.dir.join(format!("{}.json", report.repo));
                export::write(&path, report)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
                println!("saved {}", path.display());
            }
        }
        Ok(())
    }
}

fn repo_name(path: &Path) -> String {
    let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "repo".to_string())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "orgstats=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn metrics_help() -> String {
    let known = Metric::ALL
        .iter()
        .map(|m| format!("  {:<32} {}", m.name(), m.pretty_name()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Which metrics to gather (use ^ to exclude a metric). Defaults to all:\n{known}")
}
