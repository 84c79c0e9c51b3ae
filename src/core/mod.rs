pub mod availability;
pub mod compression;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod format;
pub mod grid;
pub mod locator;
pub mod read;
pub mod schema;
pub mod source;
pub mod time_range;
