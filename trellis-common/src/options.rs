//! Read-only chart configuration.
//!
//! Options are a JSON tree addressed by dotted paths (`"vAxis.viewWindow.min"`,
//! `"series.0.targetAxisIndex"`). Every lookup takes an ordered list of candidate paths;
//! the first path that resolves to a value of the requested type wins, otherwise the
//! default is returned. Lookups never fail and never mutate.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    root: Value,
}

/// A length that is either absolute pixels or a percentage of some containing length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SizeSpec {
    Absolute(f64),
    Percent(f64),
}

impl SizeSpec {
    pub fn resolve(&self, total: f64) -> f64 {
        match self {
            SizeSpec::Absolute(px) => *px,
            SizeSpec::Percent(pct) => total * pct / 100.0,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(SizeSpec::Absolute),
            Value::String(s) => {
                let s = s.trim();
                if let Some(pct) = s.strip_suffix('%') {
                    pct.trim().parse::<f64>().ok().map(SizeSpec::Percent)
                } else {
                    s.parse::<f64>().ok().map(SizeSpec::Absolute)
                }
            }
            _ => None,
        }
    }
}

impl Options {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn empty() -> Self {
        Self::new(Value::Object(Default::default()))
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Resolves a single dotted path. Numeric segments index into arrays as well as
    /// objects keyed by the number (`"series.1"` works for both shapes).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        match current {
            Value::Null => None,
            v => Some(v),
        }
    }

    /// First value found along the candidate paths.
    pub fn infer_value<P: AsRef<str>>(&self, paths: &[P]) -> Option<&Value> {
        paths.iter().find_map(|p| self.lookup(p.as_ref()))
    }

    fn infer_with<P: AsRef<str>, T>(
        &self,
        paths: &[P],
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Option<T> {
        paths
            .iter()
            .filter_map(|p| self.lookup(p.as_ref()))
            .find_map(convert)
    }

    pub fn infer_opt_f64<P: AsRef<str>>(&self, paths: &[P]) -> Option<f64> {
        self.infer_with(paths, |v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite())
    }

    pub fn infer_f64<P: AsRef<str>>(&self, paths: &[P], default: f64) -> f64 {
        self.infer_opt_f64(paths).unwrap_or(default)
    }

    pub fn infer_usize<P: AsRef<str>>(&self, paths: &[P], default: usize) -> usize {
        self.infer_opt_f64(paths)
            .filter(|v| *v >= 0.0)
            .map(|v| v as usize)
            .unwrap_or(default)
    }

    pub fn infer_opt_bool<P: AsRef<str>>(&self, paths: &[P]) -> Option<bool> {
        self.infer_with(paths, |v| match v {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        })
    }

    pub fn infer_bool<P: AsRef<str>>(&self, paths: &[P], default: bool) -> bool {
        self.infer_opt_bool(paths).unwrap_or(default)
    }

    pub fn infer_opt_str<P: AsRef<str>>(&self, paths: &[P]) -> Option<String> {
        self.infer_with(paths, |v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn infer_str<P: AsRef<str>>(&self, paths: &[P], default: &str) -> String {
        self.infer_opt_str(paths)
            .unwrap_or_else(|| default.to_string())
    }

    /// Parses the first string value that names a variant of `T`. Values that are not
    /// variant names are skipped, so a bad alias falls through to the next path.
    pub fn infer_enum<P: AsRef<str>, T: FromStr>(&self, paths: &[P], default: T) -> T {
        self.infer_with(paths, |v| match v {
            Value::String(s) => s.parse::<T>().ok(),
            Value::Bool(b) => b.to_string().parse::<T>().ok(),
            _ => None,
        })
        .unwrap_or(default)
    }

    pub fn infer_size<P: AsRef<str>>(&self, paths: &[P]) -> Option<SizeSpec> {
        self.infer_with(paths, SizeSpec::from_value)
    }
}

impl From<Value> for Options {
    fn from(value: Value) -> Self {
        Options::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use serde_json::json;
    use strum::EnumString;

    #[derive(Debug, PartialEq, EnumString)]
    #[strum(serialize_all = "lowercase")]
    enum Mode {
        Pretty,
        Maximized,
    }

    fn options() -> Options {
        Options::new(json!({
            "vAxis": {"minValue": 3, "viewWindow": {"max": "40"}, "format": "#,###"},
            "vAxes": [{"minValue": 7}],
            "series": {"1": {"type": "line"}},
            "bar": {"groupWidth": "75%", "gap": 4},
            "isStacked": true,
            "viewWindowMode": "maximized",
        }))
    }

    #[test]
    fn test_fallback_paths() {
        let opts = options();
        assert_eq!(opts.infer_f64(&["vAxes.0.minValue", "vAxis.minValue"], 0.0), 7.0);
        assert_eq!(opts.infer_f64(&["vAxes.1.minValue", "vAxis.minValue"], 0.0), 3.0);
        assert_eq!(opts.infer_f64(&["hAxis.minValue"], -1.0), -1.0);
        assert_eq!(opts.infer_opt_f64(&["vAxis.viewWindow.max"]), Some(40.0));
    }

    #[test]
    fn test_typed_lookups() {
        let opts = options();
        assert_eq!(opts.infer_str(&["series.1.type"], "bars"), "line");
        assert!(opts.infer_bool(&["isStacked"], false));
        assert_eq!(
            opts.infer_enum(&["viewWindowMode"], Mode::Pretty),
            Mode::Maximized
        );
        // Wrong type at the first path falls through to the default
        assert_eq!(opts.infer_enum(&["vAxis.format"], Mode::Pretty), Mode::Pretty);
    }

    #[test]
    fn test_size_spec() {
        let opts = options();
        let width = opts.infer_size(&["bar.groupWidth"]).unwrap();
        assert_eq!(width, SizeSpec::Percent(75.0));
        assert_eq!(width.resolve(40.0), 30.0);
        assert_eq!(opts.infer_size(&["bar.gap"]), Some(SizeSpec::Absolute(4.0)));
        assert_eq!(opts.infer_size(&["bar.width"]), None);
    }

    #[rstest]
    #[case(json!(12), 12.0)]
    #[case(json!("12"), 12.0)]
    #[case(json!(" 30 % "), 60.0)]
    #[case(json!("12.5%"), 25.0)]
    fn test_size_resolve(#[case] value: Value, #[case] expected: f64) {
        let opts = Options::new(json!({ "width": value }));
        let size = opts.infer_size(&["width"]).unwrap();
        assert_approx_eq!(f64, size.resolve(200.0), expected);
    }
}
