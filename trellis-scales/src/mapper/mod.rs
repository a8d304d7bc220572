pub mod linear;
pub mod power;
pub mod time;

use linear::LinearMapper;
use power::PowerMapper;
use serde::Serialize;
use time::TimeMapper;

/// Bidirectional transform between a data interval and a screen interval.
///
/// `to_screen` and `to_data` are total (they extrapolate outside the data interval),
/// monotonic, and inverse to each other up to floating point tolerance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mapper {
    Linear(LinearMapper),
    Power(PowerMapper),
    Time(TimeMapper),
}

impl Mapper {
    pub fn to_screen(&self, value: f64) -> f64 {
        match self {
            Mapper::Linear(m) => m.to_screen(value),
            Mapper::Power(m) => m.to_screen(value),
            Mapper::Time(m) => m.to_screen(value),
        }
    }

    pub fn to_data(&self, position: f64) -> f64 {
        match self {
            Mapper::Linear(m) => m.to_data(position),
            Mapper::Power(m) => m.to_data(position),
            Mapper::Time(m) => m.to_data(position),
        }
    }

    pub fn data_min(&self) -> f64 {
        match self {
            Mapper::Linear(m) => m.data_min(),
            Mapper::Power(m) => m.data_min(),
            Mapper::Time(m) => m.data_min(),
        }
    }

    pub fn data_max(&self) -> f64 {
        match self {
            Mapper::Linear(m) => m.data_max(),
            Mapper::Power(m) => m.data_max(),
            Mapper::Time(m) => m.data_max(),
        }
    }

    pub fn screen_start(&self) -> f64 {
        match self {
            Mapper::Linear(m) => m.screen_start(),
            Mapper::Power(m) => m.screen_start(),
            Mapper::Time(m) => m.screen_start(),
        }
    }

    pub fn screen_end(&self) -> f64 {
        match self {
            Mapper::Linear(m) => m.screen_end(),
            Mapper::Power(m) => m.screen_end(),
            Mapper::Time(m) => m.screen_end(),
        }
    }

    pub fn screen_midpoint(&self) -> f64 {
        (self.screen_start() + self.screen_end()) / 2.0
    }

    pub fn screen_length(&self) -> f64 {
        (self.screen_end() - self.screen_start()).abs()
    }

    pub fn is_degenerate(&self) -> bool {
        self.data_min() == self.data_max()
    }

    /// Whether screen positions grow with data values.
    pub fn is_increasing(&self) -> bool {
        self.screen_end() >= self.screen_start()
    }
}

impl From<LinearMapper> for Mapper {
    fn from(value: LinearMapper) -> Self {
        Mapper::Linear(value)
    }
}

impl From<PowerMapper> for Mapper {
    fn from(value: PowerMapper) -> Self {
        Mapper::Power(value)
    }
}

impl From<TimeMapper> for Mapper {
    fn from(value: TimeMapper) -> Self {
        Mapper::Time(value)
    }
}
