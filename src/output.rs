use crate::model::{OrgCounts, StatsReport};
use console::style;

const TOTAL: &str = "total_patches";
const REVIEWED: &str = "reviewed_patches";
const INTERNAL: &str = "internal_patches_to_org_files";
pub const NON_ORG_FILES: &str = "internal_patches_to_non_org_files";

/// `reviewed / (reviewed + submitted)`, or 0 when both are zero.
pub fn review_index(reviewed: u64, submitted: u64) -> f64 {
    let total = reviewed + submitted;
    if total == 0 {
        return 0.0;
    }
    reviewed as f64 / total as f64
}

/// Rows of one timeframe: one row per org, one column per metric.
pub fn timeframe_rows(report: &StatsReport, time: &str) -> Vec<(String, Vec<u64>)> {
    report
        .orgs
        .iter()
        .map(|org| {
            let counts = report
                .metrics
                .iter()
                .map(|metric| report.count(metric, time, org))
                .collect();
            (org.clone(), counts)
        })
        .collect()
}

pub fn render_table(report: &StatsReport, time: &str, highlight: &[String]) -> String {
    let rows = timeframe_rows(report, time);
    let org_width = report.orgs.iter().map(String::len).max().unwrap_or(0).max(3);
    let widths: Vec<usize> = report.metrics.iter().map(|m| m.len()).collect();

    let mut out = String::new();
    let mut header = format!("{:<org_width$}", "");
    for (metric, &width) in report.metrics.iter().zip(&widths) {
        header.push_str(&format!("  {metric:>width$}"));
    }
    out.push_str(&format!("{}\n", style(header).bold()));

    let mut rule = "-".repeat(org_width);
    for width in &widths {
        rule.push_str("  ");
        rule.push_str(&"-".repeat(*width));
    }
    out.push_str(&rule);
    out.push('\n');

    for (org, counts) in rows {
        let mut line = format!("{org:<org_width$}");
        for (count, &width) in counts.iter().zip(&widths) {
            line.push_str(&format!("  {count:>width$}"));
        }
        if highlight.contains(&org) {
            out.push_str(&format!("{}\n", style(line).yellow()));
        } else {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Copy of `report` with an extra `total - internal` series: patches an org
/// made outside its own files. Only added when both source metrics ran.
pub fn with_non_org_files(report: &StatsReport) -> StatsReport {
    let mut out = report.clone();
    if !report.data.contains_key(TOTAL)
        || !report.data.contains_key(INTERNAL)
        || report.data.contains_key(NON_ORG_FILES)
    {
        return out;
    }

    let series = report
        .timestamps
        .iter()
        .map(|time| {
            let counts: OrgCounts = report
                .orgs
                .iter()
                .map(|org| {
                    let total = report.count(TOTAL, time, org);
                    (org.clone(), total.saturating_sub(report.count(INTERNAL, time, org)))
                })
                .collect();
            (time.clone(), counts)
        })
        .collect();
    out.metrics.push(NON_ORG_FILES.to_string());
    out.data.insert(NON_ORG_FILES.to_string(), series);
    out
}

pub fn print_tables(report: &StatsReport, highlight: &[String]) {
    let report = &with_non_org_files(report);
    for (time_id, time) in report.timestamps.iter().enumerate() {
        println!("========= TIMEFRAME {time_id} ({time})");
        print!("{}", render_table(report, time, highlight));
        println!();
    }
    print_review_index(report, highlight);
}

/// Per-org review index over the whole timeframe, highest first.
pub fn review_ranking(report: &StatsReport) -> Option<Vec<(String, f64)>> {
    if !report.metrics.iter().any(|m| m == TOTAL) || !report.metrics.iter().any(|m| m == REVIEWED) {
        return None;
    }
    let mut ranking: Vec<(String, f64)> = report
        .orgs
        .iter()
        .map(|org| {
            let index = review_index(report.total(REVIEWED, org), report.total(TOTAL, org));
            (org.clone(), index)
        })
        .collect();
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
    Some(ranking)
}

fn print_review_index(report: &StatsReport, highlight: &[String]) {
    let Some(ranking) = review_ranking(report) else {
        return;
    };
    println!("{}", style("Ratio of reviews over total patches").bold());
    for (org, index) in ranking {
        let line = format!("  {org:<20} {index:.2}");
        if highlight.contains(&org) {
            println!("{}", style(line).yellow());
        } else {
            println!("{line}");
        }
    }
}
