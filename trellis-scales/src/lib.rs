pub mod decorations;
pub mod error;
pub mod format;
pub mod mapper;
pub mod ticks;
