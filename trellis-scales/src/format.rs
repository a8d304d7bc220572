//! Number formatting for axis labels.
//!
//! Accepts the familiar `#,##0.00` style patterns plus a few named presets:
//!
//! ```text
//! [prefix][#,0 integer digits][.fraction digits][E0 exponent][suffix]
//! ```
//!
//! A `,` anywhere in the integer part turns on thousands grouping, `0`s set the minimum
//! digit counts and `#`s the optional ones. A `%` in the suffix multiplies by 100.
//! Named presets are `decimal`, `scientific`, `percent`, `short` and `long`.
//!
//! ```
//! use trellis_scales::format::NumberFormat;
//!
//! let fmt = NumberFormat::parse("$#,##0.00").unwrap();
//! assert_eq!(fmt.format(1234.5), "$1,234.50");
//! assert_eq!(NumberFormat::parse("short").unwrap().format(42_000.0), "42K");
//! ```
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ScaleError;
use crate::ticks::decimals_for_step;

lazy_static! {
    static ref PATTERN_RE: Regex = Regex::new(
        r"^(?P<prefix>[^#0,.]*?)(?P<int>[#0,]+)(?:\.(?P<frac>[#0]+))?(?:E(?P<exp>0+))?(?P<suffix>[^#0,]*)$"
    )
    .unwrap();
}

const COMPACT_UNITS: [(f64, &str, &str); 4] = [
    (1e12, "T", " trillion"),
    (1e9, "B", " billion"),
    (1e6, "M", " million"),
    (1e3, "K", " thousand"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactStyle {
    Short,
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    prefix: String,
    suffix: String,
    grouping: bool,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
    scientific: bool,
    multiplier: f64,
    compact: Option<CompactStyle>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::decimal()
    }
}

impl NumberFormat {
    /// Grouped decimal with up to three fraction digits.
    pub fn decimal() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            grouping: true,
            min_integer_digits: 1,
            min_fraction_digits: 0,
            max_fraction_digits: 3,
            scientific: false,
            multiplier: 1.0,
            compact: None,
        }
    }

    /// Grouped decimal with exactly enough fraction digits for multiples of `step`.
    pub fn for_step(step: f64) -> Self {
        Self::decimal().with_fraction_digits(0, decimals_for_step(step))
    }

    pub fn parse(pattern: &str) -> Result<Self, ScaleError> {
        match pattern.trim() {
            "" | "decimal" => return Ok(Self::decimal()),
            "scientific" => return Self::parse("0.###E0"),
            "percent" => return Self::parse("#,##0%"),
            "short" => return Ok(Self::compact(CompactStyle::Short)),
            "long" => return Ok(Self::compact(CompactStyle::Long)),
            _ => {}
        }

        let caps = PATTERN_RE
            .captures(pattern)
            .ok_or_else(|| ScaleError::InvalidFormat(pattern.to_string()))?;
        let int = caps.name("int").map(|m| m.as_str()).unwrap_or_default();
        let frac = caps.name("frac").map(|m| m.as_str()).unwrap_or_default();
        let suffix = caps.name("suffix").map(|m| m.as_str()).unwrap_or_default();

        Ok(Self {
            prefix: caps
                .name("prefix")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            suffix: suffix.to_string(),
            grouping: int.contains(','),
            min_integer_digits: int.chars().filter(|c| *c == '0').count(),
            min_fraction_digits: frac.chars().filter(|c| *c == '0').count(),
            max_fraction_digits: frac.len(),
            scientific: caps.name("exp").is_some(),
            multiplier: if suffix.contains('%') { 100.0 } else { 1.0 },
            compact: None,
        })
    }

    fn compact(style: CompactStyle) -> Self {
        Self {
            max_fraction_digits: 1,
            compact: Some(style),
            ..Self::decimal()
        }
    }

    pub fn with_fraction_digits(mut self, min: usize, max: usize) -> Self {
        self.min_fraction_digits = min.min(max);
        self.max_fraction_digits = max;
        self
    }

    /// Raises the fraction digits so multiples of `step` remain distinguishable.
    pub fn with_precision_for_step(mut self, step: f64) -> Self {
        if self.compact.is_none() && !self.scientific {
            let needed = decimals_for_step(step * self.multiplier);
            self.max_fraction_digits = self.max_fraction_digits.max(needed);
        }
        self
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }
        let value = value * self.multiplier;
        let body = if let Some(style) = self.compact {
            self.format_compact(value, style)
        } else if self.scientific {
            self.format_scientific(value)
        } else {
            self.format_fixed(value)
        };
        format!("{}{}{}", self.prefix, body, self.suffix)
    }

    fn format_fixed(&self, value: f64) -> String {
        let rounded = format!("{:.*}", self.max_fraction_digits, value.abs());
        let (int_part, frac_part) = match rounded.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (rounded.clone(), String::new()),
        };

        let mut frac = frac_part;
        while frac.len() > self.min_fraction_digits && frac.ends_with('0') {
            frac.pop();
        }

        let mut int = int_part;
        while int.len() < self.min_integer_digits {
            int.insert(0, '0');
        }
        if self.grouping {
            int = group_thousands(&int);
        }

        let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
        let sign = if value < 0.0 && !is_zero { "-" } else { "" };
        if frac.is_empty() {
            format!("{sign}{int}")
        } else {
            format!("{sign}{int}.{frac}")
        }
    }

    fn format_scientific(&self, value: f64) -> String {
        if value == 0.0 {
            return format!("{}E0", self.format_fixed(0.0));
        }
        let mut exponent = value.abs().log10().floor() as i32;
        let mut mantissa = value / 10f64.powi(exponent);
        let unit = 10f64.powi(self.max_fraction_digits as i32);
        if (mantissa.abs() * unit).round() / unit >= 10.0 {
            mantissa /= 10.0;
            exponent += 1;
        }
        let mantissa_format = Self {
            grouping: false,
            scientific: false,
            ..self.clone()
        };
        format!("{}E{}", mantissa_format.format_fixed(mantissa), exponent)
    }

    fn format_compact(&self, value: f64, style: CompactStyle) -> String {
        let fixed = Self {
            compact: None,
            ..self.clone()
        };
        for (threshold, short, long) in COMPACT_UNITS {
            if value.abs() >= threshold {
                let unit = match style {
                    CompactStyle::Short => short,
                    CompactStyle::Long => long,
                };
                return format!("{}{}", fixed.format_fixed(value / threshold), unit);
            }
        }
        fixed.format_fixed(value)
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
