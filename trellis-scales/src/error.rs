#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScaleError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid number format pattern: {0:?}")]
    InvalidFormat(String),

    #[error("Invalid log epsilon {0}: must be finite and positive")]
    InvalidEpsilon(f64),

    #[error("Invalid log base {0}: must be finite and greater than 1")]
    InvalidBase(f64),

    #[error("Non-finite scale bound: [{0}, {1}]")]
    NonFiniteRange(f64, f64),
}
