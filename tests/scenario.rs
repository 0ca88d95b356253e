use chrono::{DateTime, NaiveDate, Utc};
use orgstats::export;
use orgstats::{
    gather_stats, CommitRecord, HistorySource, LogFilter, Metric, OrgConfig, OrgFilesCache,
    Result, RunConfig, StatsReport,
};
use pretty_assertions::assert_eq;
use regex::RegexBuilder;

const DAY: i64 = 86_400;

struct Commit {
    email: &'static str,
    timestamp: i64,
    files: Vec<&'static str>,
    message: &'static str,
}

/// Evaluates filters over an in-memory history the way `git log` would.
struct MemoryHistory {
    commits: Vec<Commit>,
}

impl HistorySource for MemoryHistory {
    fn query(&self, filter: &LogFilter) -> Result<Vec<CommitRecord>> {
        let grep = filter
            .grep
            .as_deref()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .transpose()?;
        Ok(self
            .commits
            .iter()
            .filter(|c| c.timestamp >= filter.since)
            .filter(|c| grep.as_ref().map_or(true, |re| re.is_match(c.message)))
            .filter(|c| {
                filter.paths.is_empty()
                    || c.files.iter().any(|f| {
                        filter
                            .paths
                            .iter()
                            .any(|glob| f.contains(glob.trim_matches('*')))
                    })
            })
            .map(|c| CommitRecord::new(c.email, c.timestamp))
            .collect())
    }
}

const CONFIG: &str = "\
org_files:
  org1: foo
  org2: dir
org_domains:
  org1: xyz
  org2: ghi
";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

fn now() -> DateTime<Utc> {
    today().and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn run_config(period: u32) -> RunConfig {
    RunConfig::new(OrgConfig::from_yaml(CONFIG).unwrap(), &[], 10, period, now(), &[]).unwrap()
}

fn four_commits(t0: i64) -> MemoryHistory {
    MemoryHistory {
        commits: vec![
            Commit {
                email: "john@xyz.com",
                timestamp: t0 + DAY,
                files: vec!["foo/bar/file"],
                message: "add foo/bar/file",
            },
            Commit {
                email: "john@xyz.com",
                timestamp: t0 + 2 * DAY,
                files: vec!["file2"],
                message: "add file2\n\nSuggested-by: bob@ghi.com",
            },
            Commit {
                email: "alice@abc.xyz.com",
                timestamp: t0 + 3 * DAY,
                files: vec!["foo/file3"],
                message: "add foo/file3\n\nReviewed-by: bob@ghi.com",
            },
            Commit {
                email: "bob@ghi.com",
                timestamp: t0 + 4 * DAY,
                files: vec!["foo/bar/two/file4"],
                message: "add foo/bar/two/file4",
            },
        ],
    }
}

fn report(history: &MemoryHistory, run: &RunConfig) -> StatsReport {
    let mut cache = OrgFilesCache::new();
    let stats = gather_stats(history, run, &mut cache, &Metric::known_names(), false).unwrap();
    export::generate(run, "repo", &stats, today())
}

#[test]
fn four_commit_scenario() {
    let run = run_config(0);
    let report = report(&four_commits(run.since), &run);

    assert_eq!(report.timestamps, vec!["2014-05-20"]);
    assert_eq!(report.period_days, 3650);
    let t = "2014-05-20";
    let expect = [
        ("total_patches", 3, 1),
        ("reviewed_patches", 0, 1),
        ("internal_patches_to_org_files", 2, 0),
        ("external_patches_to_org_files", 1, 0),
        ("reported_by_patches", 0, 1),
    ];
    for (metric, org1, org2) in expect {
        assert_eq!(report.count(metric, t, "org1"), org1, "{metric} org1");
        assert_eq!(report.count(metric, t, "org2"), org2, "{metric} org2");
    }
}

#[test]
fn late_commits_clamp_into_last_bucket() {
    let run = run_config(365);
    let history = MemoryHistory {
        commits: vec![
            Commit {
                email: "john@xyz.com",
                timestamp: run.since + 5000 * DAY,
                files: vec!["a"],
                message: "late",
            },
            Commit {
                email: "john@xyz.com",
                timestamp: run.since + 10 * DAY,
                files: vec!["a"],
                message: "early",
            },
        ],
    };
    let report = report(&history, &run);
    assert_eq!(report.timestamps.len(), 10);
    assert_eq!(report.count("total_patches", &report.timestamps[0], "org1"), 1);
    assert_eq!(report.count("total_patches", &report.timestamps[9], "org1"), 1);
}

#[test]
fn internal_plus_external_covers_resolvable_authors() {
    let run = run_config(365);
    let t0 = run.since;
    let history = MemoryHistory {
        commits: (0..40)
            .map(|i| Commit {
                email: ["a@xyz.com", "b@ghi.com", "c@example.org", "d@lab.xyz.net"][i % 4],
                timestamp: t0 + (i as i64) * 97 * DAY,
                files: if i % 3 == 0 { vec!["foo/x.c"] } else { vec!["dir/y.c", "foo/z.c"] },
                message: "change",
            })
            .collect(),
    };
    let report = report(&history, &run);

    for (b, time) in report.timestamps.iter().enumerate() {
        for org in ["org1", "org2"] {
            let glob = if org == "org1" { "foo" } else { "dir" };
            let expected = history
                .commits
                .iter()
                .filter(|c| run.buckets.index(c.timestamp) == b)
                .filter(|c| c.files.iter().any(|f| f.contains(glob)))
                .filter(|c| run.resolver.resolve(c.email).is_some())
                .count() as u64;
            let internal = report.count("internal_patches_to_org_files", time, org);
            let external = report.count("external_patches_to_org_files", time, org);
            assert_eq!(internal + external, expected, "bucket {b} org {org}");
        }
    }

    for org in ["org1", "org2"] {
        let authored = history
            .commits
            .iter()
            .filter(|c| run.resolver.resolve(c.email) == Some(org))
            .count() as u64;
        assert_eq!(report.total("total_patches", org), authored);
    }
}

#[test]
fn identical_inputs_give_identical_reports() {
    let run = run_config(730);
    let history = four_commits(run.since);
    assert_eq!(report(&history, &run), report(&history, &run));
}

#[test]
fn selected_orgs_limit_output_and_attribution() {
    let config = OrgConfig::from_yaml(CONFIG).unwrap();
    let run = RunConfig::new(config, &["org2".to_string()], 10, 0, now(), &[]).unwrap();
    let report = report(&four_commits(run.since), &run);
    assert_eq!(report.orgs, vec!["org2"]);
    assert_eq!(report.total("total_patches", "org2"), 1);
    assert!(!report.data["total_patches"]["2014-05-20"].contains_key("org1"));
}
