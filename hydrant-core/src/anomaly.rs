use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::usage::{UsageRecord, round_litres};
use crate::window::Window;

/// A single anomalous reading.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyEntry {
    pub device: String,
    pub timestamp: NaiveDateTime,
    pub litres: f64,
}

/// Anomalous readings that fell on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyDay {
    pub date: NaiveDate,
    pub entries: Vec<AnomalyEntry>,
}

/// Groups flagged rows by day, newest day first. Entries within a day keep
/// their input order.
pub fn group_anomalies<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Vec<AnomalyDay> {
    let mut by_day: BTreeMap<NaiveDate, Vec<AnomalyEntry>> = BTreeMap::new();
    for record in records.into_iter().filter(|r| r.anomaly) {
        by_day.entry(record.date()).or_default().push(AnomalyEntry {
            device: record.device.clone(),
            timestamp: record.timestamp,
            litres: record.volume_litres,
        });
    }
    by_day
        .into_iter()
        .rev()
        .map(|(date, entries)| AnomalyDay { date, entries })
        .collect()
}

/// Litres used by flagged rows inside `window`, rounded to centilitres.
pub fn anomalous_total<'a>(
    records: impl IntoIterator<Item = &'a UsageRecord>,
    window: &Window,
) -> f64 {
    let sum: f64 = records
        .into_iter()
        .filter(|r| r.anomaly && window.contains(r.timestamp))
        .map(|r| r.volume_litres)
        .sum();
    round_litres(sum)
}
