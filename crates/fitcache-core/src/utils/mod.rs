//! Utility functions for date and number formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    days_in_month, format_calories, format_date_range, month_label, truncate_string, week_bounds,
};
