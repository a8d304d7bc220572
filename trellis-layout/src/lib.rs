pub mod annotation;
pub mod axis;
pub mod chart;
pub mod collision;
pub mod datum;
pub mod division;
pub mod error;
