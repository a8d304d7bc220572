pub mod options;
pub mod table;
pub mod types;
