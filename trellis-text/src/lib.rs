pub mod measurement;
pub mod types;
