use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;

use super::linear::LinearMapper;
use crate::error::ScaleError;

/// Average month length, used only when a timestamp falls outside chrono's range.
const AVG_MONTH_MILLIS: f64 = 365.2425 * 86_400_000.0 / 12.0;

pub fn parse_timezone(tz_str: &str) -> Result<Tz, ScaleError> {
    match tz_str {
        "UTC" | "utc" | "" => Ok(Tz::UTC),
        tz => tz
            .parse::<Tz>()
            .map_err(|_| ScaleError::InvalidTimezone(tz.to_string())),
    }
}

/// Local calendar view of an epoch-millisecond timestamp.
pub fn to_local(millis: f64, tz: &Tz) -> Option<DateTime<Tz>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis.round() as i64).map(|dt| dt.with_timezone(tz))
}

/// Epoch milliseconds of local midnight on the first of the month.
///
/// Midnight can be skipped by a DST transition in some zones; the next hour is used then.
pub fn month_start_millis(tz: &Tz, year: i32, month: u32) -> Option<i64> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    (0..3).find_map(|hour| {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp_millis())
    })
}

/// Calendar-aware time mapper.
///
/// Timestamps are mapped through a calendar coordinate (months since the epoch plus the
/// elapsed fraction of the containing month, in the configured timezone) before the
/// linear interpolation, so every month and every year occupies the same screen length.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeMapper {
    #[serde(skip)]
    tz: Tz,
    data_min: f64,
    data_max: f64,
    calendar: LinearMapper,
}

impl TimeMapper {
    pub fn new(data: (f64, f64), screen: (f64, f64)) -> Self {
        Self::with_timezone(data, screen, Tz::UTC)
    }

    pub fn with_timezone((data_min, data_max): (f64, f64), screen: (f64, f64), tz: Tz) -> Self {
        let calendar = LinearMapper::new(
            (
                calendar_coordinate(data_min, &tz),
                calendar_coordinate(data_max, &tz),
            ),
            screen,
        );
        Self {
            tz,
            data_min,
            data_max,
            calendar,
        }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    pub fn screen_start(&self) -> f64 {
        self.calendar.screen_start()
    }

    pub fn screen_end(&self) -> f64 {
        self.calendar.screen_end()
    }

    pub fn is_degenerate(&self) -> bool {
        self.data_min == self.data_max
    }

    pub fn to_screen(&self, millis: f64) -> f64 {
        self.calendar
            .to_screen(calendar_coordinate(millis, &self.tz))
    }

    pub fn to_data(&self, position: f64) -> f64 {
        if self.is_degenerate() {
            return self.data_min;
        }
        from_calendar_coordinate(self.calendar.to_data(position), &self.tz)
    }
}

fn calendar_coordinate(millis: f64, tz: &Tz) -> f64 {
    let Some(local) = to_local(millis, tz) else {
        return millis / AVG_MONTH_MILLIS;
    };
    let (year, month) = (local.year(), local.month());
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        month_start_millis(tz, year, month),
        month_start_millis(tz, next_year, next_month),
    ) {
        (Some(start), Some(end)) if end > start => {
            let months = (year as f64 - 1970.0) * 12.0 + local.month0() as f64;
            months + (millis - start as f64) / (end - start) as f64
        }
        _ => millis / AVG_MONTH_MILLIS,
    }
}

fn from_calendar_coordinate(coordinate: f64, tz: &Tz) -> f64 {
    let whole = coordinate.floor();
    let fraction = coordinate - whole;
    let months = whole as i64;
    let year = 1970 + months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let bounds = i32::try_from(year).ok().zip(i32::try_from(next_year).ok());
    match bounds.and_then(|(y, ny)| {
        month_start_millis(tz, y, month).zip(month_start_millis(tz, ny, next_month))
    }) {
        Some((start, end)) => start as f64 + fraction * (end - start) as f64,
        None => coordinate * AVG_MONTH_MILLIS,
    }
}
