use std::{collections::BTreeMap, num::NonZeroU32, sync::Arc};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::time::{date_key, parse_date_key};

/// Seconds spent on each hostname during one day.
#[derive(PartialEq, Eq, Debug, Default, Serialize, Deserialize, Clone)]
#[serde(transparent)]
pub struct DayRecord {
    sites: BTreeMap<Arc<str>, u64>,
}

impl DayRecord {
    pub fn get(&self, hostname: &str) -> Option<u64> {
        self.sites.get(hostname).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, u64)> {
        self.sites.iter().map(|(hostname, seconds)| (hostname, *seconds))
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Adds seconds to a hostname and returns its new total. Zero seconds never create an entry.
    pub fn add(&mut self, hostname: &str, seconds: u64) -> u64 {
        if seconds == 0 {
            return self.get(hostname).unwrap_or_default();
        }
        if let Some(total) = self.sites.get_mut(hostname) {
            *total = total.saturating_add(seconds);
            return *total;
        }
        self.sites.insert(hostname.into(), seconds);
        seconds
    }
}

impl<H: Into<Arc<str>>> FromIterator<(H, u64)> for DayRecord {
    fn from_iter<T: IntoIterator<Item = (H, u64)>>(iter: T) -> Self {
        let mut record = DayRecord::default();
        for (hostname, seconds) in iter {
            let hostname: Arc<str> = hostname.into();
            record.add(&hostname, seconds);
        }
        record
    }
}

/// The whole persisted document: date key (`YYYY-MM-DD`, local time) to [DayRecord].
///
/// Keys are kept as strings. The host only ever writes well formed keys, but the document is
/// plain json and anything found on disk is preserved.
#[derive(PartialEq, Eq, Debug, Default, Serialize, Deserialize, Clone)]
#[serde(transparent)]
pub struct TimeData {
    days: BTreeMap<String, DayRecord>,
}

impl TimeData {
    pub fn day(&self, key: &str) -> Option<&DayRecord> {
        self.days.get(key)
    }

    /// Days in ascending key order.
    pub fn days(&self) -> impl Iterator<Item = (&str, &DayRecord)> {
        self.days.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn insert_day(&mut self, key: impl Into<String>, record: DayRecord) {
        self.days.insert(key.into(), record);
    }

    /// Adds time spent on `hostname` during `date`, creating the day when needed. Zero seconds
    /// leave the document as it is.
    pub fn add(&mut self, date: NaiveDate, hostname: &str, seconds: u64) -> u64 {
        if seconds == 0 {
            return self
                .day(&date_key(date))
                .and_then(|record| record.get(hostname))
                .unwrap_or_default();
        }
        self.days.entry(date_key(date)).or_default().add(hostname, seconds)
    }

    /// Drops every day before `first_kept`. Keys that aren't dates are left alone. Returns the
    /// number of removed days.
    pub fn retain_since(&mut self, first_kept: NaiveDate) -> usize {
        let before = self.days.len();
        self.days
            .retain(|key, _| parse_date_key(key).map_or(true, |date| date >= first_kept));
        before - self.days.len()
    }
}

/// How many days of history are kept, today included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    days: NonZeroU32,
}

impl RetentionPolicy {
    pub fn new(days: u32) -> Option<Self> {
        NonZeroU32::new(days).map(|days| Self { days })
    }

    /// Oldest day that survives pruning on `today`.
    pub fn first_kept(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.days.get() - 1)))
            .unwrap_or(NaiveDate::MIN)
    }
}
