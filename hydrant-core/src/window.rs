use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::usage::UsageError;

/// An inclusive span of time that usage rows are selected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Window { start, end }
    }

    /// Whole calendar days from `from` through `to`, e.g. a billing period.
    pub fn days(from: NaiveDate, to: NaiveDate) -> Result<Self, UsageError> {
        if to < from {
            return Err(UsageError::InvertedRange { from, to });
        }
        let end = to
            .and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::days(1))
            .map_or(NaiveDateTime::MAX, |next| next - TimeDelta::nanoseconds(1));
        Ok(Window {
            start: from.and_time(NaiveTime::MIN),
            end,
        })
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// How far back the current-usage view looks from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingRange {
    #[default]
    Today,
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
}

impl TrailingRange {
    pub const ALL: [TrailingRange; 6] = [
        TrailingRange::Today,
        TrailingRange::Week,
        TrailingRange::Month,
        TrailingRange::ThreeMonths,
        TrailingRange::SixMonths,
        TrailingRange::Year,
    ];

    pub fn code(self) -> &'static str {
        match self {
            TrailingRange::Today => "today",
            TrailingRange::Week => "1week",
            TrailingRange::Month => "1month",
            TrailingRange::ThreeMonths => "3months",
            TrailingRange::SixMonths => "6months",
            TrailingRange::Year => "1year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrailingRange::Today => "Today",
            TrailingRange::Week => "Last 7 Days",
            TrailingRange::Month => "Last 30 Days",
            TrailingRange::ThreeMonths => "Last 3 Months",
            TrailingRange::SixMonths => "Last 6 Months",
            TrailingRange::Year => "Last 12 Months",
        }
    }

    /// The span ending at `now`. `Today` starts at the preceding midnight.
    pub fn window(self, now: NaiveDateTime) -> Window {
        let start = match self {
            TrailingRange::Today => now.date().and_time(NaiveTime::MIN),
            TrailingRange::Week => now
                .checked_sub_signed(TimeDelta::days(7))
                .unwrap_or(NaiveDateTime::MIN),
            TrailingRange::Month => months_before(now, 1),
            TrailingRange::ThreeMonths => months_before(now, 3),
            TrailingRange::SixMonths => months_before(now, 6),
            TrailingRange::Year => months_before(now, 12),
        };
        Window::new(start, now)
    }
}

fn months_before(at: NaiveDateTime, months: u32) -> NaiveDateTime {
    at.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MIN)
}

/// How far ahead of its start date the forecast view reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastHorizon {
    #[default]
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
}

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 5] = [
        ForecastHorizon::Week,
        ForecastHorizon::Month,
        ForecastHorizon::ThreeMonths,
        ForecastHorizon::SixMonths,
        ForecastHorizon::Year,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ForecastHorizon::Week => "1week",
            ForecastHorizon::Month => "1month",
            ForecastHorizon::ThreeMonths => "3months",
            ForecastHorizon::SixMonths => "6months",
            ForecastHorizon::Year => "1year",
        }
    }

    /// From midnight of `start` up to and including midnight at the horizon.
    pub fn window(self, start: NaiveDate) -> Window {
        let start = start.and_time(NaiveTime::MIN);
        let end = match self {
            ForecastHorizon::Week => start
                .checked_add_signed(TimeDelta::days(7))
                .unwrap_or(NaiveDateTime::MAX),
            ForecastHorizon::Month => months_after(start, 1),
            ForecastHorizon::ThreeMonths => months_after(start, 3),
            ForecastHorizon::SixMonths => months_after(start, 6),
            ForecastHorizon::Year => months_after(start, 12),
        };
        Window::new(start, end)
    }
}

fn months_after(at: NaiveDateTime, months: u32) -> NaiveDateTime {
    at.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown range {0:?}")]
pub struct UnknownRange(pub String);

impl FromStr for TrailingRange {
    type Err = UnknownRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrailingRange::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRange(s.to_string()))
    }
}

impl FromStr for ForecastHorizon {
    type Err = UnknownRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ForecastHorizon::ALL
            .into_iter()
            .find(|h| h.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRange(s.to_string()))
    }
}

impl fmt::Display for TrailingRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn today_starts_at_midnight() {
        let w = TrailingRange::Today.window(at("2024-03-02 15:30:00"));

        assert_eq!(w.start, at("2024-03-02 00:00:00"));
        assert_eq!(w.end, at("2024-03-02 15:30:00"));
        assert!(!w.contains(at("2024-03-01 23:59:59")));
        assert!(!w.contains(at("2024-03-02 15:30:01")));
    }

    #[test]
    fn trailing_ranges_step_back_by_calendar_months() {
        let now = at("2024-03-31 12:00:00");

        assert_eq!(TrailingRange::Week.window(now).start, at("2024-03-24 12:00:00"));
        // February has no 31st; chrono clamps to the last day.
        assert_eq!(TrailingRange::Month.window(now).start, at("2024-02-29 12:00:00"));
        assert_eq!(TrailingRange::Year.window(now).start, at("2023-03-31 12:00:00"));
    }

    #[test]
    fn billing_days_are_inclusive() {
        let w = Window::days(day("2024-03-01"), day("2024-03-02")).unwrap();

        assert!(w.contains(at("2024-03-01 00:00:00")));
        assert!(w.contains(at("2024-03-02 23:59:59")));
        assert!(!w.contains(at("2024-03-03 00:00:00")));
    }

    #[test]
    fn inverted_billing_period_is_rejected() {
        let err = Window::days(day("2024-03-05"), day("2024-03-01")).unwrap_err();
        assert!(matches!(err, UsageError::InvertedRange { .. }));
    }

    #[test]
    fn forecast_horizon_reaches_forward() {
        let w = ForecastHorizon::Week.window(day("2024-06-01"));
        assert_eq!(w.start, at("2024-06-01 00:00:00"));
        assert_eq!(w.end, at("2024-06-08 00:00:00"));

        let w = ForecastHorizon::ThreeMonths.window(day("2024-06-01"));
        assert_eq!(w.end, at("2024-09-01 00:00:00"));
    }

    #[test]
    fn windows_saturate_at_the_calendar_edges() {
        let w = Window::days(NaiveDate::MAX, NaiveDate::MAX).unwrap();
        assert_eq!(w.end, NaiveDateTime::MAX);
        assert!(w.contains(NaiveDate::MAX.and_time(NaiveTime::MIN)));

        let w = ForecastHorizon::Week.window(NaiveDate::MAX);
        assert_eq!(w.end, NaiveDateTime::MAX);

        let w = TrailingRange::Week.window(NaiveDateTime::MIN);
        assert_eq!(w.start, NaiveDateTime::MIN);
    }

    #[test]
    fn range_codes_parse() {
        assert_eq!("3months".parse::<TrailingRange>().unwrap(), TrailingRange::ThreeMonths);
        assert_eq!("1YEAR".parse::<ForecastHorizon>().unwrap(), ForecastHorizon::Year);
        assert!("today".parse::<ForecastHorizon>().is_err());
        assert_eq!(TrailingRange::Week.label(), "Last 7 Days");
    }
}
