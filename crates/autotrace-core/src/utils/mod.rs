//! Display helpers shared by front ends.

pub mod format;

pub use format::{format_date, format_km, format_optional, truncate};
