//! The demo event log.
//!
//! `Demo.csv` records individual flushes and draws with their timing and
//! flow rate. A demo session can append simulated toilet flushes on top of
//! the recorded rows and later drop them again; simulated rows are never
//! written back to the file.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::usage::{UsageError, parse_timestamp};

const TIME_FORMAT: &str = "%H:%M:%S";

/// One recorded (or simulated) water event.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoEvent {
    pub timestamp: NaiveDateTime,
    pub device: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_secs: f64,
    pub flow_rate_lpm: f64,
    pub volume_litres: f64,
    pub event_id: String,
    pub occupants: u32,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Device Name")]
    device: String,
    #[serde(rename = "Start Time")]
    start_time: String,
    #[serde(rename = "End Time")]
    end_time: String,
    #[serde(rename = "Duration (s)")]
    duration: String,
    #[serde(rename = "Flow Rate (L/min)")]
    flow_rate: String,
    #[serde(rename = "Volume Used (L)")]
    volume: String,
    #[serde(rename = "Event ID")]
    event_id: String,
    #[serde(rename = "Occupants")]
    occupants: String,
}

/// Recorded demo events followed by any simulated ones.
#[derive(Debug, Clone, Default)]
pub struct DemoLog {
    events: Vec<DemoEvent>,
    recorded: usize,
}

impl DemoLog {
    pub fn new(recorded: Vec<DemoEvent>) -> Self {
        DemoLog {
            recorded: recorded.len(),
            events: recorded,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, UsageError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| UsageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, UsageError> {
        let mut rows = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rows.headers()?.clone();

        let mut events = Vec::new();
        for row in rows.records() {
            let row = row?;
            let line = row.position().map_or(0, |p| p.line());
            let raw: RawEvent = row.deserialize(Some(&headers))?;
            events.push(parse_event(raw, line)?);
        }

        debug!(rows = events.len(), "loaded demo events");
        Ok(DemoLog::new(events))
    }

    /// Every event, recorded ones first.
    pub fn events(&self) -> &[DemoEvent] {
        &self.events
    }

    pub fn recorded(&self) -> &[DemoEvent] {
        &self.events[..self.recorded]
    }

    pub fn simulated(&self) -> &[DemoEvent] {
        &self.events[self.recorded..]
    }

    /// Appends a simulated toilet flush happening at `now`.
    pub fn push_simulated<R: Rng + ?Sized>(&mut self, now: NaiveDateTime, rng: &mut R) -> &DemoEvent {
        self.events.push(simulate_toilet_event(now, rng));
        &self.events[self.events.len() - 1]
    }

    /// Drops every simulated event, keeping the recorded ones.
    pub fn clear_simulated(&mut self) {
        self.events.truncate(self.recorded);
    }
}

/// A plausible toilet flush starting at `now`.
///
/// Flushes last 4 to 5 seconds at 4 to 5.5 L/min and use 0.8 to 1.12 L.
pub fn simulate_toilet_event<R: Rng + ?Sized>(now: NaiveDateTime, rng: &mut R) -> DemoEvent {
    let start = now.with_nanosecond(0).unwrap_or(now);
    let duration_secs = round_to(rng.random_range(4.0..5.0), 1);
    let elapsed = TimeDelta::milliseconds((duration_secs * 1000.0).round() as i64);
    let (end_time, _) = start.time().overflowing_add_signed(elapsed);

    DemoEvent {
        timestamp: start.with_second(0).unwrap_or(start),
        device: "toilet".to_string(),
        start_time: start.time(),
        end_time: end_time.with_nanosecond(0).unwrap_or(end_time),
        duration_secs,
        flow_rate_lpm: round_to(rng.random_range(4.0..5.5), 2),
        volume_litres: round_to(rng.random_range(0.8..1.12), 3),
        event_id: format!("EVT{:05}", rng.random_range(0..1000)),
        occupants: 3,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn parse_event(raw: RawEvent, line: u64) -> Result<DemoEvent, UsageError> {
    let timestamp =
        parse_timestamp(&raw.timestamp).ok_or_else(|| UsageError::InvalidTimestamp {
            line,
            value: raw.timestamp.clone(),
        })?;

    Ok(DemoEvent {
        timestamp,
        device: raw.device,
        start_time: parse_time(&raw.start_time, line, "Start Time")?,
        end_time: parse_time(&raw.end_time, line, "End Time")?,
        duration_secs: parse_number(&raw.duration, line, "Duration (s)")?,
        flow_rate_lpm: parse_number(&raw.flow_rate, line, "Flow Rate (L/min)")?,
        volume_litres: parse_number(&raw.volume, line, "Volume Used (L)")
            .map_err(|_| UsageError::InvalidVolume {
                line,
                value: raw.volume.clone(),
            })?,
        event_id: raw.event_id,
        occupants: raw.occupants.parse().map_err(|_| UsageError::InvalidField {
            line,
            column: "Occupants",
            value: raw.occupants.clone(),
        })?,
    })
}

fn parse_time(value: &str, line: u64, column: &'static str) -> Result<NaiveTime, UsageError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| UsageError::InvalidField {
            line,
            column,
            value: value.to_string(),
        })
}

fn parse_number(value: &str, line: u64, column: &'static str) -> Result<f64, UsageError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| UsageError::InvalidField {
            line,
            column,
            value: value.to_string(),
        })
}
