use chrono::{DateTime, Days, NaiveDate};

const SECS_PER_DAY: i64 = 60 * 60 * 24;

/// Fixed-width day windows starting at `initial_timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBuckets {
    initial_timestamp: i64,
    period_days: u32,
    groups: usize,
}

impl TimeBuckets {
    /// `period_days` and `groups` must both be non-zero.
    pub fn new(initial_timestamp: i64, period_days: u32, groups: usize) -> Self {
        debug_assert!(period_days > 0 && groups > 0);
        Self {
            initial_timestamp,
            period_days,
            groups,
        }
    }

    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn period_days(&self) -> u32 {
        self.period_days
    }

    /// Bucket index of `timestamp`. Commits before the first window land in
    /// bucket 0 and commits after the last one land in the last bucket.
    pub fn index(&self, timestamp: i64) -> usize {
        bucket(timestamp, self.initial_timestamp, self.period_days, self.groups)
    }

    pub fn start_date(&self, index: usize) -> Option<NaiveDate> {
        let initial = DateTime::from_timestamp(self.initial_timestamp, 0)?.date_naive();
        initial.checked_add_days(Days::new(index as u64 * u64::from(self.period_days)))
    }

    /// `YYYY-MM-DD` label of every bucket, in order.
    pub fn labels(&self) -> Vec<String> {
        (0..self.groups)
            .map(|i| {
                self.start_date(i)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .collect()
    }
}

pub fn bucket(timestamp: i64, initial_timestamp: i64, period_days: u32, groups: usize) -> usize {
    let days = (timestamp - initial_timestamp).div_euclid(SECS_PER_DAY);
    let raw = days.div_euclid(i64::from(period_days.max(1)));
    if raw < 0 {
        0
    } else {
        (raw as usize).min(groups.saturating_sub(1))
    }
}
