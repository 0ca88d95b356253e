use crate::bucket::TimeBuckets;
use crate::error::{Result, StatsError};
use crate::org::OrgResolver;
use chrono::{DateTime, Months, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

const DAYS_PER_YEAR: u32 = 365;

#[derive(Debug, Deserialize)]
struct RawConfig {
    org_files: IndexMap<String, String>,
    #[serde(default)]
    org_domains: IndexMap<String, String>,
    #[serde(default)]
    highlight: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgEntry {
    pub id: String,
    /// `*fragment*` globs, one per configured path fragment.
    pub file_globs: Vec<String>,
    pub domains: Vec<String>,
}

/// Organizations as declared in the YAML config file, in file order.
#[derive(Debug, Clone, Default)]
pub struct OrgConfig {
    orgs: Vec<OrgEntry>,
    highlight: Vec<String>,
}

impl OrgConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StatsError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(content)?;
        if raw.org_files.is_empty() {
            return Err(StatsError::Config("no organizations in 'org_files'".to_string()));
        }

        let orgs = raw
            .org_files
            .iter()
            .map(|(id, files)| OrgEntry {
                id: id.clone(),
                file_globs: files.split_whitespace().map(|p| format!("*{p}*")).collect(),
                domains: raw
                    .org_domains
                    .get(id)
                    .map(|d| d.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(Self {
            orgs,
            highlight: raw.highlight,
        })
    }

    pub fn get(&self, id: &str) -> Option<&OrgEntry> {
        self.orgs.iter().find(|entry| entry.id == id)
    }

    pub fn known_orgs(&self) -> impl Iterator<Item = &str> {
        self.orgs.iter().map(|entry| entry.id.as_str())
    }

    pub fn highlight(&self) -> &[String] {
        &self.highlight
    }

    /// Every configured org when `requested` is empty, otherwise `requested`
    /// after checking each name is configured.
    pub fn select_orgs(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.known_orgs().map(str::to_string).collect());
        }
        for org in requested {
            if self.get(org).is_none() {
                return Err(StatsError::UnknownOrg(org.clone()));
            }
        }
        Ok(requested.to_vec())
    }
}

/// Everything a metric run needs, fixed before the first query.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub orgs: Vec<String>,
    pub org_config: OrgConfig,
    pub resolver: OrgResolver,
    pub buckets: TimeBuckets,
    /// Epoch seconds; history committed before this is not queried.
    pub since: i64,
    pub timeframe_years: u32,
    pub highlight: Vec<String>,
}

impl RunConfig {
    pub fn new(
        org_config: OrgConfig,
        requested_orgs: &[String],
        since_years: u32,
        period_days: u32,
        now: DateTime<Utc>,
        highlight: &[String],
    ) -> Result<Self> {
        let orgs = org_config.select_orgs(requested_orgs)?;

        let overflow = || StatsError::Config(format!("--since {since_years} years is out of range"));
        let timeframe_days = since_years.checked_mul(DAYS_PER_YEAR).ok_or_else(overflow)?;
        let months = since_years.checked_mul(12).ok_or_else(overflow)?;

        let period_days = if period_days == 0 { timeframe_days } else { period_days };
        if period_days == 0 || period_days > timeframe_days {
            return Err(StatsError::Config(format!(
                "period of {period_days} days does not fit in a {since_years} year timeframe"
            )));
        }
        let groups = (timeframe_days / period_days) as usize;

        // history is cut at the same time of day, buckets start at midnight
        let since = now
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| StatsError::InvalidDate(format!("{since_years} years before {now}")))?;
        let initial = since
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| StatsError::InvalidDate(format!("midnight of {since}")))?
            .and_utc()
            .timestamp();

        let mut all_highlight = highlight.to_vec();
        all_highlight.extend(org_config.highlight().iter().cloned());
        for org in &all_highlight {
            if !orgs.contains(org) {
                return Err(StatsError::Config(format!(
                    "invalid highlight: '{org}' is not in the selected orgs"
                )));
            }
        }

        let resolver = OrgResolver::new(&org_config, &orgs)?;

        Ok(Self {
            orgs,
            org_config,
            resolver,
            buckets: TimeBuckets::new(initial, period_days, groups),
            since: since.timestamp(),
            timeframe_years: since_years,
            highlight: all_highlight,
        })
    }

    pub fn groups(&self) -> usize {
        self.buckets.groups()
    }

    pub fn file_globs(&self, org: &str) -> &[String] {
        self.org_config
            .get(org)
            .map(|entry| entry.file_globs.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const YAML: &str = "\
org_files:
  org1: foo
  org2: dir lib/net
org_domains:
  org1: xyz
  org2: ghi gh
highlight:
  - org2
";

    fn today() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn parses_orgs_in_file_order() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.known_orgs().collect::<Vec<_>>(), vec!["org1", "org2"]);
        let org2 = config.get("org2").unwrap();
        assert_eq!(org2.file_globs, vec!["*dir*", "*lib/net*"]);
        assert_eq!(org2.domains, vec!["ghi", "gh"]);
        assert_eq!(config.highlight(), ["org2".to_string()]);
    }

    #[test]
    fn domains_are_optional() {
        let config = OrgConfig::from_yaml("org_files:\n  acme: src\n").unwrap();
        assert!(config.get("acme").unwrap().domains.is_empty());
    }

    #[test]
    fn missing_org_files_is_an_error() {
        assert!(OrgConfig::from_yaml("org_domains:\n  a: b\n").is_err());
        assert!(matches!(
            OrgConfig::from_yaml("org_files: {}\n"),
            Err(StatsError::Config(_))
        ));
    }

    #[test]
    fn rejects_unknown_requested_org() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        let err = config.select_orgs(&["org3".to_string()]).unwrap_err();
        assert!(matches!(err, StatsError::UnknownOrg(name) if name == "org3"));
    }

    #[test]
    fn zero_period_means_one_bucket() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        let run = RunConfig::new(config, &[], 10, 0, today(), &[]).unwrap();
        assert_eq!(run.groups(), 1);
        assert_eq!(run.buckets.period_days(), 3650);
        assert_eq!(run.buckets.labels(), vec!["2014-06-15"]);
    }

    #[test]
    fn groups_floor_the_timeframe() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        let run = RunConfig::new(config, &[], 5, 730, today(), &[]).unwrap();
        assert_eq!(run.groups(), 2);
        assert_eq!(run.file_globs("org1"), ["*foo*".to_string()]);
    }

    #[test]
    fn period_longer_than_timeframe_is_rejected() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        assert!(RunConfig::new(config, &[], 1, 400, today(), &[]).is_err());
    }

    #[test]
    fn highlight_must_be_selected() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        let err = RunConfig::new(config, &["org1".to_string()], 10, 0, today(), &[]).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn since_keeps_the_time_of_day() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
            .and_utc();
        let run = RunConfig::new(config, &[], 10, 365, now, &[]).unwrap();
        let since = NaiveDate::from_ymd_opt(2014, 6, 15).unwrap().and_hms_opt(15, 30, 0).unwrap();
        assert_eq!(run.since, since.and_utc().timestamp());
        assert_eq!(run.buckets.labels()[0], "2014-06-15");
        // commits authored before the cut but committed after it fold into bucket 0
        assert_eq!(run.buckets.index(run.since - 30 * 86_400), 0);
    }

    #[test]
    fn huge_since_is_a_config_error() {
        let config = OrgConfig::from_yaml(YAML).unwrap();
        let err = RunConfig::new(config, &[], 20_000_000, 0, today(), &[]).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }
}
