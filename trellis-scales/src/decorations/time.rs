//! Calendar-unit strategies for time axes.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use strum::{EnumString, VariantNames};
use trellis_common::types::{AxisDecoration, Decorations, Orientation};
use trellis_text::measurement::TextMeasurer;

use super::{min_gap, with_bounds_from_majors, DecorationConfig, MIN_MINOR_SPACING};
use crate::mapper::time::{to_local, TimeMapper};

/// Upper bound on boundaries generated for a single strategy.
const MAX_BOUNDARIES: usize = 10_000;

const HOUR_MILLIS: f64 = 3_600_000.0;
const DAY_MILLIS: f64 = 86_400_000.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// A calendar unit and a step count: boundaries fall on every `step`-th unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStrategy {
    pub unit: TimeUnit,
    pub step: i32,
}

const fn strategy(unit: TimeUnit, step: i32) -> TimeStrategy {
    TimeStrategy { unit, step }
}

/// Finest to coarsest.
pub const STRATEGIES: &[TimeStrategy] = &[
    strategy(TimeUnit::Second, 1),
    strategy(TimeUnit::Second, 5),
    strategy(TimeUnit::Second, 15),
    strategy(TimeUnit::Second, 30),
    strategy(TimeUnit::Minute, 1),
    strategy(TimeUnit::Minute, 5),
    strategy(TimeUnit::Minute, 15),
    strategy(TimeUnit::Minute, 30),
    strategy(TimeUnit::Hour, 1),
    strategy(TimeUnit::Hour, 3),
    strategy(TimeUnit::Hour, 6),
    strategy(TimeUnit::Hour, 12),
    strategy(TimeUnit::Day, 1),
    strategy(TimeUnit::Week, 1),
    strategy(TimeUnit::Month, 1),
    strategy(TimeUnit::Month, 2),
    strategy(TimeUnit::Month, 3),
    strategy(TimeUnit::Month, 6),
    strategy(TimeUnit::Quarter, 1),
    strategy(TimeUnit::Year, 1),
    strategy(TimeUnit::Year, 2),
    strategy(TimeUnit::Year, 5),
    strategy(TimeUnit::Year, 10),
    strategy(TimeUnit::Year, 20),
    strategy(TimeUnit::Year, 50),
    strategy(TimeUnit::Year, 100),
    strategy(TimeUnit::Year, 1000),
    strategy(TimeUnit::Year, 10000),
];

/// Length of one strategy period, either in whole months or in fixed seconds.
enum Period {
    Months(i64),
    Seconds(i64),
}

impl TimeStrategy {
    fn period(&self) -> Period {
        let step = self.step as i64;
        match self.unit {
            TimeUnit::Second => Period::Seconds(step),
            TimeUnit::Minute => Period::Seconds(step * 60),
            TimeUnit::Hour => Period::Seconds(step * 3600),
            TimeUnit::Day => Period::Seconds(step * 86_400),
            TimeUnit::Week => Period::Seconds(step * 7 * 86_400),
            TimeUnit::Month => Period::Months(step),
            TimeUnit::Quarter => Period::Months(step * 3),
            TimeUnit::Year => Period::Months(step * 12),
        }
    }

    /// Longest possible real duration of one period, allowing for DST and leap days.
    fn max_millis(&self) -> f64 {
        match self.period() {
            Period::Seconds(s) if s >= 86_400 => s as f64 * 1000.0 * 25.0 / 24.0,
            Period::Seconds(s) => s as f64 * 1000.0,
            Period::Months(m) => m as f64 * 31.0 * DAY_MILLIS + HOUR_MILLIS,
        }
    }

    /// Whether every boundary of `self` is also a boundary of `finer`.
    fn nests(&self, finer: &TimeStrategy) -> bool {
        if finer.unit == TimeUnit::Week && self.unit != TimeUnit::Week {
            return false;
        }
        match (self.period(), finer.period()) {
            (Period::Months(a), Period::Months(b)) => a % b == 0,
            (Period::Seconds(a), Period::Seconds(b)) => a % b == 0,
            (Period::Months(_), Period::Seconds(b)) => 86_400 % b == 0,
            (Period::Seconds(_), Period::Months(_)) => false,
        }
    }

    /// Start of the period containing `dt`, in local wall-clock time.
    fn floor(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        let n = self.step as u32;
        let date = dt.date();
        match self.unit {
            TimeUnit::Second => date.and_hms_opt(dt.hour(), dt.minute(), dt.second() / n * n),
            TimeUnit::Minute => date.and_hms_opt(dt.hour(), dt.minute() / n * n, 0),
            TimeUnit::Hour => date.and_hms_opt(dt.hour() / n * n, 0, 0),
            TimeUnit::Day => date.and_hms_opt(0, 0, 0),
            TimeUnit::Week => {
                // Weeks start on Sunday
                let days_since_sunday = date.weekday().num_days_from_sunday() as i64;
                (date - Duration::days(days_since_sunday)).and_hms_opt(0, 0, 0)
            }
            TimeUnit::Month | TimeUnit::Quarter => {
                let months = match self.period() {
                    Period::Months(m) => m as u32,
                    Period::Seconds(_) => 1,
                };
                let month0 = date.month0() / months * months;
                NaiveDate::from_ymd_opt(date.year(), month0 + 1, 1)?.and_hms_opt(0, 0, 0)
            }
            TimeUnit::Year => {
                let year = date.year() - date.year().rem_euclid(self.step);
                NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)
            }
        }
    }

    /// The next boundary after `dt`, which must itself be a boundary.
    fn advance(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        match self.period() {
            Period::Seconds(s) => dt.checked_add_signed(Duration::seconds(s)),
            Period::Months(m) => {
                let months = dt.year() as i64 * 12 + dt.month0() as i64 + m;
                let year = i32::try_from(months.div_euclid(12)).ok()?;
                let month = months.rem_euclid(12) as u32 + 1;
                NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)
            }
        }
    }

    fn label(&self, dt: NaiveDateTime) -> String {
        match self.unit {
            TimeUnit::Second => dt.format("%H:%M:%S").to_string(),
            TimeUnit::Minute | TimeUnit::Hour => dt.format("%H:%M").to_string(),
            TimeUnit::Day | TimeUnit::Week => dt.format("%b %-d").to_string(),
            TimeUnit::Month => dt.format("%b %Y").to_string(),
            TimeUnit::Quarter => format!("Q{} {}", dt.month0() / 3 + 1, dt.year()),
            TimeUnit::Year => dt.format("%Y").to_string(),
        }
    }

    /// Boundaries inside `[min, max]` as `(epoch millis, local time)` pairs.
    fn boundaries(&self, min: f64, max: f64, tz: &Tz) -> Vec<(f64, NaiveDateTime)> {
        let Some(start) = to_local(min, tz).and_then(|dt| self.floor(dt.naive_local())) else {
            return vec![];
        };
        let mut out = vec![];
        let mut current = Some(start);
        while let Some(local) = current {
            let Some(millis) = local_millis(tz, local) else {
                break;
            };
            if millis > max + 1.0 || out.len() >= MAX_BOUNDARIES {
                break;
            }
            if millis >= min - 1.0 {
                out.push((millis, local));
            }
            current = self.advance(local);
        }
        out
    }
}

/// Epoch millis of a local wall-clock time, skipping forward over DST gaps.
fn local_millis(tz: &Tz, local: NaiveDateTime) -> Option<f64> {
    (0..3).find_map(|hour| {
        let shifted = local.checked_add_signed(Duration::hours(hour))?;
        tz.from_local_datetime(&shifted)
            .earliest()
            .map(|dt| dt.timestamp_millis() as f64)
    })
}

/// A strategy boundary with its measured label.
struct BoundaryLabel {
    millis: f64,
    position: f64,
    label: String,
    /// Label size along the axis
    extent: f64,
    /// Left aligned at the start of the axis rather than centered
    leading: bool,
}

impl BoundaryLabel {
    fn before(&self) -> f64 {
        if self.leading {
            0.0
        } else {
            self.extent / 2.0
        }
    }

    fn after(&self) -> f64 {
        if self.leading {
            self.extent
        } else {
            self.extent / 2.0
        }
    }
}

/// Picks the finest calendar strategy whose labels fit.
pub struct TimeSupplier<'a> {
    config: &'a DecorationConfig,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> TimeSupplier<'a> {
    pub fn new(config: &'a DecorationConfig, measurer: &'a dyn TextMeasurer) -> Self {
        Self { config, measurer }
    }

    pub fn supply(&self, mapper: &TimeMapper) -> Decorations {
        let tz = mapper.timezone();
        let (min, max) = if mapper.data_min() <= mapper.data_max() {
            (mapper.data_min(), mapper.data_max())
        } else {
            (mapper.data_max(), mapper.data_min())
        };
        let midpoint = (mapper.screen_start() + mapper.screen_end()) / 2.0;

        if mapper.is_degenerate() {
            let label = to_local(min, tz)
                .map(|dt| instant_label(dt.naive_local()))
                .unwrap_or_default();
            return Decorations::new(vec![AxisDecoration::labeled_line(min, midpoint, label)])
                .with_bounds(min, max);
        }

        let candidates = STRATEGIES
            .iter()
            .enumerate()
            .filter(|(_, s)| self.config.granularity.map_or(true, |g| s.unit >= g));
        for (index, strategy) in candidates {
            let Some(majors) = self.try_strategy(strategy, mapper, min, max) else {
                continue;
            };
            tracing::debug!("time axis strategy {:?} x{}", strategy.unit, strategy.step);
            let mut decorations = Decorations::new(majors);
            if self.config.minor_gridline_count != Some(0) {
                if let Some(minors) = self.minor_gridlines(index, mapper, min, max) {
                    decorations = decorations.with_minor_gridlines(minors);
                }
            }
            return with_bounds_from_majors(decorations);
        }

        tracing::debug!("no time strategy fits, merging the range into one label");
        let label = match (to_local(min, tz), to_local(max, tz)) {
            (Some(a), Some(b)) => merged_label(a.naive_local(), b.naive_local()),
            _ => String::new(),
        };
        Decorations::new(vec![AxisDecoration::label_only(min, midpoint, label)])
            .with_bounds(min, max)
    }

    fn try_strategy(
        &self,
        strategy: &TimeStrategy,
        mapper: &TimeMapper,
        min: f64,
        max: f64,
    ) -> Option<Vec<AxisDecoration>> {
        let length = (mapper.screen_end() - mapper.screen_start()).abs();
        let max_labels = length / self.config.min_label_distance.max(1.0) + 1.0;
        // Every period yields at least this many boundaries
        if ((max - min) / strategy.max_millis()).floor() > max_labels {
            return None;
        }

        let boundaries = strategy.boundaries(min, max, mapper.timezone());
        if boundaries.len() < 2 {
            return None;
        }

        // A boundary on the start of an increasing axis labels the period that follows it
        let increasing = mapper.screen_end() > mapper.screen_start();
        let labeled: Vec<BoundaryLabel> = boundaries
            .into_iter()
            .enumerate()
            .map(|(i, (millis, local))| {
                let label = strategy.label(local);
                let bounds = self.measurer.measure(&label, &self.config.text_style);
                let position = mapper.to_screen(millis);
                BoundaryLabel {
                    millis,
                    position,
                    extent: match self.config.orientation {
                        Orientation::Horizontal => bounds.width,
                        Orientation::Vertical => bounds.height,
                    },
                    leading: i == 0
                        && increasing
                        && (position - mapper.screen_start()).abs() < 0.5,
                    label,
                }
            })
            .collect();

        let fits = labeled.windows(2).all(|w| {
            let gap = (w[1].position - w[0].position).abs() - w[0].after() - w[1].before();
            gap >= self.config.min_label_distance
        });
        if !fits {
            return None;
        }
        Some(
            labeled
                .into_iter()
                .map(|b| {
                    if b.leading {
                        AxisDecoration::left_aligned_label(b.millis, b.position, b.label)
                    } else {
                        AxisDecoration::labeled_line(b.millis, b.position, b.label)
                    }
                })
                .collect(),
        )
    }

    /// Boundaries of the next finer strategy that nests inside the major one.
    fn minor_gridlines(
        &self,
        major_index: usize,
        mapper: &TimeMapper,
        min: f64,
        max: f64,
    ) -> Option<Vec<AxisDecoration>> {
        let major = STRATEGIES.get(major_index)?;
        let minor = STRATEGIES[..major_index]
            .iter()
            .rev()
            .filter(|s| self.config.granularity.map_or(true, |g| s.unit >= g))
            .find(|s| major.nests(s))?;

        let length = (mapper.screen_end() - mapper.screen_start()).abs();
        if ((max - min) / minor.max_millis()).floor() > length / MIN_MINOR_SPACING + 1.0 {
            return None;
        }
        let boundaries = minor.boundaries(min, max, mapper.timezone());
        let positions: Vec<f64> = boundaries.iter().map(|(m, _)| mapper.to_screen(*m)).collect();
        if boundaries.len() < 2 || min_gap(&positions) < MIN_MINOR_SPACING {
            return None;
        }
        let tz = mapper.timezone();
        Some(
            boundaries
                .into_iter()
                .zip(positions)
                .filter(|((millis, _), _)| {
                    // Skip boundaries that coincide with a major one
                    to_local(*millis, tz)
                        .and_then(|dt| major.floor(dt.naive_local()))
                        .and_then(|floor| local_millis(tz, floor))
                        .map_or(true, |floor| (floor - millis).abs() > 1.0)
                })
                .map(|((millis, _), position)| AxisDecoration::line_only(millis, position))
                .collect(),
        )
    }
}

fn instant_label(dt: NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%b %-d, %Y").to_string()
    } else {
        dt.format("%b %-d, %Y %H:%M:%S").to_string()
    }
}

/// Shortest description of the whole range: `2000-2010`, `Jan-Mar 2000`, ...
fn merged_label(a: NaiveDateTime, b: NaiveDateTime) -> String {
    if a.year() != b.year() {
        format!("{}-{}", a.year(), b.year())
    } else if a.month() != b.month() {
        format!("{}-{} {}", a.format("%b"), b.format("%b"), a.year())
    } else if a.day() != b.day() {
        format!("{} {}-{}, {}", a.format("%b"), a.day(), b.day(), a.year())
    } else {
        format!("{}-{}", a.format("%H:%M"), b.format("%H:%M"))
    }
}
