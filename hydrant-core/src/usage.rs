//! Simulated water-usage datasets.
//!
//! Each dataset is a CSV file with a `Timestamp`, `Device Name` and
//! `Volume Used (L)` column. The anomaly dataset additionally carries an
//! `Anomaly` column where `1` marks a row as anomalous. Forecast and anomaly
//! values are pre-computed; this module only reads, filters and sums them.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::debug;

use crate::window::Window;

/// Device names that appear in the bundled datasets.
pub const KNOWN_DEVICES: [&str; 8] = [
    "bathroom_sink",
    "bathroom_sink_2",
    "toilet",
    "toilet_2",
    "washing_machine",
    "dishwasher",
    "shower",
    "kitchen_sink",
];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("cannot open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: invalid volume {value:?}")]
    InvalidVolume { line: u64, value: String },
    #[error("line {line}: invalid timestamp {value:?}")]
    InvalidTimestamp { line: u64, value: String },
    #[error("line {line}: invalid {column} {value:?}")]
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("date range ends ({to}) before it starts ({from})")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
}

/// Which dashboard dataset a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Current,
    Forecast,
    Anomaly,
    /// The per-event log behind the demo view, see [`DemoLog`](crate::DemoLog).
    Demo,
}

impl DatasetKind {
    /// File name the dataset is shipped under.
    pub fn file_name(self) -> &'static str {
        match self {
            DatasetKind::Current => "Current.csv",
            DatasetKind::Forecast => "Forecast.csv",
            DatasetKind::Anomaly => "Anomaly.csv",
            DatasetKind::Demo => "Demo.csv",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Current => write!(f, "current"),
            DatasetKind::Forecast => write!(f, "forecast"),
            DatasetKind::Anomaly => write!(f, "anomaly"),
            DatasetKind::Demo => write!(f, "demo"),
        }
    }
}

/// One row of a usage dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub timestamp: NaiveDateTime,
    pub device: String,
    pub volume_litres: f64,
    pub anomaly: bool,
}

impl UsageRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Device Name")]
    device: String,
    #[serde(rename = "Volume Used (L)")]
    volume: String,
    #[serde(rename = "Anomaly", default)]
    anomaly: Option<String>,
}

/// A parsed dataset, rows kept in file order.
#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    records: Vec<UsageRecord>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, records: Vec<UsageRecord>) -> Self {
        Dataset { kind, records }
    }

    pub fn open(kind: DatasetKind, path: impl AsRef<Path>) -> Result<Self, UsageError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| UsageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(kind, file)
    }

    /// Parses CSV with a header row. Columns are matched by name, extra
    /// columns are ignored and blank lines are skipped.
    pub fn from_reader<R: io::Read>(kind: DatasetKind, reader: R) -> Result<Self, UsageError> {
        let mut rows = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rows.headers()?.clone();

        let mut records = Vec::new();
        for row in rows.records() {
            let row = row?;
            let line = row.position().map_or(0, |p| p.line());
            let raw: RawRow = row.deserialize(Some(&headers))?;
            records.push(parse_row(raw, line)?);
        }

        debug!(%kind, rows = records.len(), "loaded usage dataset");
        Ok(Dataset { kind, records })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    /// Date of the first row in file order.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(UsageRecord::date)
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(UsageRecord::date).min()
    }

    /// Rows inside `window` belonging to `device`, in file order.
    pub fn select(&self, window: &Window, device: &DeviceFilter) -> Vec<&UsageRecord> {
        self.records
            .iter()
            .filter(|r| window.contains(r.timestamp) && device.matches(&r.device))
            .collect()
    }
}

fn parse_row(raw: RawRow, line: u64) -> Result<UsageRecord, UsageError> {
    let timestamp =
        parse_timestamp(&raw.timestamp).ok_or_else(|| UsageError::InvalidTimestamp {
            line,
            value: raw.timestamp.clone(),
        })?;
    let volume_litres = raw
        .volume
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| UsageError::InvalidVolume {
            line,
            value: raw.volume.clone(),
        })?;

    Ok(UsageRecord {
        timestamp,
        device: raw.device,
        volume_litres,
        anomaly: raw.anomaly.as_deref().map(str::trim) == Some("1"),
    })
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Restricts a query to one device, or to none.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceFilter {
    #[default]
    All,
    Device(String),
}

impl DeviceFilter {
    pub fn matches(&self, device: &str) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::Device(wanted) => wanted == device,
        }
    }
}

impl FromStr for DeviceFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(DeviceFilter::All)
        } else {
            Ok(DeviceFilter::Device(s.to_string()))
        }
    }
}

impl fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFilter::All => write!(f, "All fixtures"),
            DeviceFilter::Device(d) => f.write_str(&display_device_name(d)),
        }
    }
}

/// Turns a dataset device name into a label: `bathroom_sink_2` -> `bathroom sink 2`.
pub fn display_device_name(device: &str) -> String {
    device.replace('_', " ")
}

/// Total volume of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub litres: f64,
}

/// Sums volumes per day, oldest day first, each total rounded to centilitres.
pub fn aggregate_by_day<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Vec<DailyUsage> {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *per_day.entry(record.date()).or_default() += record.volume_litres;
    }
    per_day
        .into_iter()
        .map(|(date, litres)| DailyUsage {
            date,
            litres: round_litres(litres),
        })
        .collect()
}

pub fn total_litres<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> f64 {
    round_litres(records.into_iter().map(|r| r.volume_litres).sum())
}

pub(crate) fn round_litres(litres: f64) -> f64 {
    (litres * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::TrailingRange;

    const CURRENT: &str = "\
Timestamp,Device Name,Volume Used (L)
2024-03-01 07:15:00,shower,45.5
2024-03-01 07:40:00,toilet,6.0

2024-03-02 19:05:00,kitchen_sink,3.333
2024-03-02 21:00:00,shower,40.25
";

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parses_rows_and_skips_blank_lines() {
        let dataset = Dataset::from_reader(DatasetKind::Current, CURRENT.as_bytes()).unwrap();

        assert_eq!(dataset.records().len(), 4);
        let first = &dataset.records()[0];
        assert_eq!(first.timestamp, at("2024-03-01 07:15:00"));
        assert_eq!(first.device, "shower");
        assert_eq!(first.volume_litres, 45.5);
        assert!(!first.anomaly);
    }

    #[test]
    fn reads_anomaly_flag() {
        let csv = "\
Timestamp,Device Name,Volume Used (L),Anomaly
2024-03-01 07:15:00,shower,45.5,0
2024-03-01 08:15:00,toilet,60.0,1
";
        let dataset = Dataset::from_reader(DatasetKind::Anomaly, csv.as_bytes()).unwrap();

        let flags: Vec<_> = dataset.records().iter().map(|r| r.anomaly).collect();
        assert_eq!(flags, [false, true]);
    }

    #[test]
    fn accepts_other_timestamp_shapes() {
        assert_eq!(parse_timestamp("2024-03-01 07:15"), Some(at("2024-03-01 07:15:00")));
        assert_eq!(parse_timestamp("2024-03-01"), Some(at("2024-03-01 00:00:00")));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn bad_volume_reports_line() {
        let csv = "\
Timestamp,Device Name,Volume Used (L)
2024-03-01 07:15:00,shower,45.5
2024-03-01 07:40:00,toilet,lots
";
        let err = Dataset::from_reader(DatasetKind::Current, csv.as_bytes()).unwrap_err();

        assert!(matches!(err, UsageError::InvalidVolume { line: 3, ref value } if value == "lots"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "Timestamp,Volume Used (L)\n2024-03-01 07:15:00,1.0\n";

        assert!(matches!(
            Dataset::from_reader(DatasetKind::Current, csv.as_bytes()),
            Err(UsageError::Csv(_))
        ));
    }

    #[test]
    fn aggregates_per_day_in_date_order() {
        let dataset = Dataset::from_reader(DatasetKind::Current, CURRENT.as_bytes()).unwrap();

        let daily = aggregate_by_day(dataset.records().iter().rev());

        assert_eq!(
            daily,
            [
                DailyUsage { date: day("2024-03-01"), litres: 51.5 },
                DailyUsage { date: day("2024-03-02"), litres: 43.58 },
            ]
        );
        assert_eq!(total_litres(dataset.records()), 95.08);
    }

    #[test]
    fn select_filters_by_window_and_device() {
        let dataset = Dataset::from_reader(DatasetKind::Current, CURRENT.as_bytes()).unwrap();
        let window = TrailingRange::Today.window(at("2024-03-02 22:00:00"));

        let showers = dataset.select(&window, &"shower".parse().unwrap());
        assert_eq!(showers.len(), 1);
        assert_eq!(showers[0].volume_litres, 40.25);

        let everything = dataset.select(&window, &DeviceFilter::All);
        assert_eq!(everything.len(), 2);
    }

    #[test]
    fn first_and_earliest_dates() {
        let csv = "\
Timestamp,Device Name,Volume Used (L)
2024-05-10 07:15:00,shower,1
2024-05-08 07:15:00,shower,1
";
        let dataset = Dataset::from_reader(DatasetKind::Forecast, csv.as_bytes()).unwrap();

        assert_eq!(dataset.first_date(), Some(day("2024-05-10")));
        assert_eq!(dataset.earliest_date(), Some(day("2024-05-08")));
        assert_eq!(Dataset::new(DatasetKind::Forecast, Vec::new()).first_date(), None);
    }

    #[test]
    fn device_filter_parsing_and_labels() {
        assert_eq!("all".parse::<DeviceFilter>().unwrap(), DeviceFilter::All);
        assert_eq!(
            "toilet_2".parse::<DeviceFilter>().unwrap(),
            DeviceFilter::Device("toilet_2".to_string())
        );
        assert_eq!(display_device_name("bathroom_sink_2"), "bathroom sink 2");
        assert_eq!(DeviceFilter::All.to_string(), "All fixtures");
    }
}
