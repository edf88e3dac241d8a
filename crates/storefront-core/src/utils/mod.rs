//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{capitalize_first, format_dob, truncate_string};
