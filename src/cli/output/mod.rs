//! Aggregation of the time store for display.

pub mod render;

use std::{collections::HashMap, fmt::Display, sync::Arc};

use chrono::{Datelike, Days, Duration, NaiveDate};
use clap::ValueEnum;
use tracing::instrument;

use crate::{
    daemon::storage::entities::{DayRecord, TimeData},
    utils::time::{date_key, parse_date_key},
};

/// Length of the rolling weekly window, reference day included.
const WEEK_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Period {
    /// Only the reference day.
    #[default]
    Daily,
    /// The reference day and the six days before it.
    Weekly,
    /// Every day of the reference month.
    Monthly,
    /// Everything recorded.
    AllTime,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Daily => write!(f, "daily"),
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
            Period::AllTime => write!(f, "all-time"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUsage {
    pub hostname: Arc<str>,
    pub seconds: u64,
}

impl SiteUsage {
    pub fn new(hostname: impl Into<Arc<str>>, seconds: u64) -> Self {
        Self {
            hostname: hostname.into(),
            seconds,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::seconds(i64::try_from(self.seconds).unwrap_or(i64::MAX))
    }
}

/// Sums time per hostname over the days selected by `period` and sorts the result by time spent,
/// longest first. Hostnames with equal time keep the order they were first seen in.
#[instrument(skip(data))]
pub fn aggregate(data: &TimeData, period: Period, reference: NaiveDate) -> Vec<SiteUsage> {
    let mut usages: Vec<SiteUsage> = vec![];
    let mut positions = HashMap::<Arc<str>, usize>::new();

    for record in selected_days(data, period, reference) {
        for (hostname, seconds) in record.iter() {
            match positions.get(hostname) {
                Some(&position) => {
                    let usage = &mut usages[position];
                    usage.seconds = usage.seconds.saturating_add(seconds);
                }
                None => {
                    positions.insert(hostname.clone(), usages.len());
                    usages.push(SiteUsage::new(hostname.clone(), seconds));
                }
            }
        }
    }

    usages.sort_by(|a, b| b.seconds.cmp(&a.seconds));
    usages
}

/// Days taking part in `period`. Daily and weekly walk back from the reference day, the others
/// follow key order.
fn selected_days(data: &TimeData, period: Period, reference: NaiveDate) -> Vec<&DayRecord> {
    match period {
        Period::Daily => data.day(&date_key(reference)).into_iter().collect(),
        Period::Weekly => (0..WEEK_DAYS)
            .filter_map(|offset| reference.checked_sub_days(Days::new(offset)))
            .filter_map(|day| data.day(&date_key(day)))
            .collect(),
        Period::Monthly => data
            .days()
            .filter(|(key, _)| {
                parse_date_key(key).is_some_and(|day| {
                    day.year() == reference.year() && day.month() == reference.month()
                })
            })
            .map(|(_, record)| record)
            .collect(),
        Period::AllTime => data.days().map(|(_, record)| record).collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use crate::{
        daemon::storage::entities::{DayRecord, TimeData},
        utils::time::date_key,
    };

    use super::{aggregate, Period, SiteUsage};

    const NOW: NaiveDate = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

    fn days_ago(days: u64) -> String {
        date_key(NOW.checked_sub_days(Days::new(days)).unwrap())
    }

    fn day(data: &mut TimeData, key: impl Into<String>, sites: &[(&str, u64)]) {
        data.insert_day(key, DayRecord::from_iter(sites.iter().copied()));
    }

    #[test]
    fn test_daily_is_exactly_today() {
        let mut data = TimeData::default();
        day(&mut data, days_ago(0), &[("a.com", 10), ("b.com", 20)]);
        day(&mut data, days_ago(1), &[("a.com", 100)]);

        assert_eq!(
            aggregate(&data, Period::Daily, NOW),
            vec![SiteUsage::new("b.com", 20), SiteUsage::new("a.com", 10)]
        );
    }

    #[test]
    fn test_daily_without_data_is_empty() {
        let mut data = TimeData::default();
        day(&mut data, days_ago(1), &[("a.com", 100)]);

        assert!(aggregate(&data, Period::Daily, NOW).is_empty());
    }

    #[test]
    fn test_weekly_is_a_rolling_window() {
        let mut data = TimeData::default();
        day(&mut data, days_ago(0), &[("a.com", 1)]);
        day(&mut data, days_ago(3), &[("a.com", 2), ("b.com", 4)]);
        day(&mut data, days_ago(6), &[("c.com", 8)]);
        day(&mut data, days_ago(7), &[("a.com", 16)]);
        day(&mut data, days_ago(10), &[("a.com", 32)]);

        assert_eq!(
            aggregate(&data, Period::Weekly, NOW),
            vec![
                SiteUsage::new("c.com", 8),
                SiteUsage::new("b.com", 4),
                SiteUsage::new("a.com", 3)
            ]
        );
    }

    #[test]
    fn test_monthly_matches_year_and_month() {
        let mut data = TimeData::default();
        day(&mut data, "2024-04-01", &[("a.com", 1)]);
        day(&mut data, "2024-04-30", &[("a.com", 2)]);
        day(&mut data, "2024-03-31", &[("a.com", 4)]);
        day(&mut data, "2023-04-05", &[("a.com", 8)]);
        day(&mut data, "2024-04", &[("a.com", 16)]);
        day(&mut data, "broken", &[("a.com", 32)]);

        assert_eq!(
            aggregate(&data, Period::Monthly, NOW),
            vec![SiteUsage::new("a.com", 3)]
        );
    }

    #[test]
    fn test_all_time_sums_everything() -> anyhow::Result<()> {
        let data: TimeData = serde_json::from_str(
            r#"{"2024-01-01":{"a.com":10},"2024-01-02":{"a.com":5,"b.com":3}}"#,
        )?;

        assert_eq!(
            aggregate(&data, Period::AllTime, NOW),
            vec![SiteUsage::new("a.com", 15), SiteUsage::new("b.com", 3)]
        );
        Ok(())
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let mut data = TimeData::default();
        day(&mut data, "2024-01-01", &[("z.com", 5)]);
        day(&mut data, "2024-01-02", &[("a.com", 5), ("m.com", 7)]);

        assert_eq!(
            aggregate(&data, Period::AllTime, NOW),
            vec![
                SiteUsage::new("m.com", 7),
                SiteUsage::new("z.com", 5),
                SiteUsage::new("a.com", 5)
            ]
        );
    }
}
