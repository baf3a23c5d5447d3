use std::io::Write;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use hydrant_core::{
    DailyUsage, Dataset, DatasetKind, DemoEvent, DemoLog, DeviceFilter, ForecastHorizon,
    KNOWN_DEVICES, TrailingRange, Window, aggregate_by_day, anomalous_total, display_device_name,
    group_anomalies, total_litres,
};

use crate::config::Config;
use crate::error::HydError;

#[derive(Debug, Subcommand)]
pub enum UsageCommand {
    /// Recorded usage over a trailing range or a billing period
    Current {
        /// Path to the current-usage CSV
        #[arg(long)]
        data: Option<PathBuf>,

        /// Device name from the dataset, or "all"
        #[arg(long, default_value = "all")]
        device: DeviceFilter,

        /// today, 1week, 1month, 3months, 6months or 1year
        #[arg(long, conflicts_with_all = ["from", "to"])]
        range: Option<TrailingRange>,

        /// First day of a billing period (YYYY-MM-DD), defaults to the earliest day in the data
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day of a billing period (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Forecast usage for a period starting at a given day
    Forecast {
        /// Path to the forecast CSV
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long, default_value = "all")]
        device: DeviceFilter,

        /// 1week, 1month, 3months, 6months or 1year
        #[arg(long)]
        horizon: Option<ForecastHorizon>,

        /// Defaults to the first day in the dataset
        #[arg(long)]
        start: Option<NaiveDate>,
    },

    /// Anomalous readings grouped by day
    Anomalies {
        /// Path to the anomaly CSV
        #[arg(long)]
        data: Option<PathBuf>,

        /// Start of the range to total anomalous usage over
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// List the device names used in the datasets
    Devices,

    /// Show the demo event log, optionally with simulated toilet flushes
    Demo {
        /// Path to the demo CSV
        #[arg(long)]
        data: Option<PathBuf>,

        /// Number of flushes to simulate at the current time; they are not saved
        #[arg(long, default_value_t = 0)]
        simulate: usize,
    },
}

pub fn run(
    command: UsageCommand,
    config: &Config,
    now: NaiveDateTime,
    out: &mut impl Write,
) -> Result<(), HydError> {
    match command {
        UsageCommand::Devices => {
            for device in KNOWN_DEVICES {
                writeln!(out, "{device:<16} {}", display_device_name(device))?;
            }
        }
        UsageCommand::Current {
            data,
            device,
            range,
            from,
            to,
        } => {
            let dataset = Dataset::open(
                DatasetKind::Current,
                config.resolve_dataset(DatasetKind::Current, data),
            )?;
            let (window, period) = if from.is_none() && to.is_none() {
                let range = range.unwrap_or_default();
                (range.window(now), range.label().to_string())
            } else {
                let from = match from {
                    Some(from) => from,
                    None => dataset
                        .earliest_date()
                        .ok_or(HydError::EmptyDataset(DatasetKind::Current))?,
                };
                let to = to.unwrap_or(now.date());
                (Window::days(from, to)?, format!("{from} to {to}"))
            };

            let selected = dataset.select(&window, &device);
            writeln!(
                out,
                "Total water usage ({period}, {device}): {:.2} L",
                total_litres(selected.iter().copied())
            )?;
            write_daily(out, &aggregate_by_day(selected))?;
        }
        UsageCommand::Forecast {
            data,
            device,
            horizon,
            start,
        } => {
            let dataset = Dataset::open(
                DatasetKind::Forecast,
                config.resolve_dataset(DatasetKind::Forecast, data),
            )?;
            let start = match start {
                Some(start) => start,
                None => dataset
                    .first_date()
                    .ok_or(HydError::EmptyDataset(DatasetKind::Forecast))?,
            };
            let horizon = horizon.unwrap_or_default();

            let selected = dataset.select(&horizon.window(start), &device);
            writeln!(out, "Forecast from {start} ({horizon}, {device})")?;
            write_daily(out, &aggregate_by_day(selected))?;
        }
        UsageCommand::Demo { data, simulate } => {
            let mut log = DemoLog::open(config.resolve_dataset(DatasetKind::Demo, data))?;
            let mut rng = rand::rng();
            for _ in 0..simulate {
                log.push_simulated(now, &mut rng);
            }

            writeln!(
                out,
                "Demo events ({} recorded, {} simulated)",
                log.recorded().len(),
                log.simulated().len()
            )?;
            if log.events().is_empty() {
                writeln!(out, "No demo events")?;
            }
            for event in log.recorded() {
                write_event(out, event, false)?;
            }
            for event in log.simulated() {
                write_event(out, event, true)?;
            }
        }
        UsageCommand::Anomalies { data, from, to } => {
            let dataset = Dataset::open(
                DatasetKind::Anomaly,
                config.resolve_dataset(DatasetKind::Anomaly, data),
            )?;

            if let (Some(from), Some(to)) = (from, to) {
                let window = Window::days(from, to)?;
                writeln!(
                    out,
                    "Total anomalous usage {from} to {to}: {:.2} L",
                    anomalous_total(dataset.records(), &window)
                )?;
            }

            let groups = group_anomalies(dataset.records());
            if groups.is_empty() {
                writeln!(out, "No anomalies detected")?;
            }
            for group in groups {
                writeln!(out, "{}  {} anomalies detected", group.date, group.entries.len())?;
                for entry in &group.entries {
                    writeln!(
                        out,
                        "  {:<18} {}  {:>8.2} L",
                        display_device_name(&entry.device),
                        entry.timestamp,
                        entry.litres
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn write_daily(out: &mut impl Write, daily: &[DailyUsage]) -> std::io::Result<()> {
    if daily.is_empty() {
        return writeln!(out, "No usage in this period");
    }
    for day in daily {
        writeln!(out, "{}  {:>9.2} L", day.date, day.litres)?;
    }
    Ok(())
}

/// Simulated rows are marked with a leading `+`.
fn write_event(out: &mut impl Write, event: &DemoEvent, simulated: bool) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {}  {:<16} {}-{} {:>6.1} s {:>6.2} L/min {:>7.3} L  {}  {}",
        if simulated { '+' } else { ' ' },
        event.timestamp.format("%Y-%m-%d %H:%M"),
        display_device_name(&event.device),
        event.start_time.format("%H:%M:%S"),
        event.end_time.format("%H:%M:%S"),
        event.duration_secs,
        event.flow_rate_lpm,
        event.volume_litres,
        event.event_id,
        event.occupants
    )
}
