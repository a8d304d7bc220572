use serde::Serialize;

/// Affine map between a data interval and a screen interval.
///
/// The screen interval may run backwards (`screen_start > screen_end`), which is how
/// vertical value axes put the data minimum at the bottom.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LinearMapper {
    data_min: f64,
    data_max: f64,
    screen_start: f64,
    screen_end: f64,
}

impl LinearMapper {
    pub fn new((data_min, data_max): (f64, f64), (screen_start, screen_end): (f64, f64)) -> Self {
        Self {
            data_min,
            data_max,
            screen_start,
            screen_end,
        }
    }

    pub fn data_min(&self) -> f64 {
        self.data_min
    }

    pub fn data_max(&self) -> f64 {
        self.data_max
    }

    pub fn screen_start(&self) -> f64 {
        self.screen_start
    }

    pub fn screen_end(&self) -> f64 {
        self.screen_end
    }

    pub fn screen_midpoint(&self) -> f64 {
        (self.screen_start + self.screen_end) / 2.0
    }

    /// True when the data interval collapses to a single value.
    pub fn is_degenerate(&self) -> bool {
        self.data_min == self.data_max
    }

    pub fn to_screen(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return self.screen_midpoint();
        }
        let t = (value - self.data_min) / (self.data_max - self.data_min);
        self.screen_start + t * (self.screen_end - self.screen_start)
    }

    pub fn to_data(&self, position: f64) -> f64 {
        if self.is_degenerate() || self.screen_start == self.screen_end {
            return self.data_min;
        }
        let t = (position - self.screen_start) / (self.screen_end - self.screen_start);
        self.data_min + t * (self.data_max - self.data_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_reversed_screen() {
        let mapper = LinearMapper::new((0.0, 100.0), (400.0, 0.0));
        assert_approx_eq!(f64, mapper.to_screen(0.0), 400.0);
        assert_approx_eq!(f64, mapper.to_screen(25.0), 300.0);
        // Extrapolates
        assert_approx_eq!(f64, mapper.to_screen(150.0), -200.0);
        assert_approx_eq!(f64, mapper.to_data(100.0), 75.0);
    }

    #[test]
    fn test_degenerate() {
        let mapper = LinearMapper::new((5.0, 5.0), (0.0, 200.0));
        assert_approx_eq!(f64, mapper.to_screen(5.0), 100.0);
        assert_approx_eq!(f64, mapper.to_screen(-40.0), 100.0);
        assert_approx_eq!(f64, mapper.to_data(17.0), 5.0);
    }
}
