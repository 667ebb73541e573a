use chrono::{Datelike, Duration, NaiveDate};

/// Format an inclusive date range compactly.
///
/// - same day: `Jan 5, 2025`
/// - same month: `Jan 5 - 11, 2025`
/// - same year: `Jan 29 - Feb 4, 2025`
/// - otherwise: `Dec 29, 2024 - Jan 4, 2025`
///
/// Reversed bounds are swapped.
pub fn format_date_range(start: NaiveDate, end: NaiveDate) -> String {
    let (start, end) = if end < start { (end, start) } else { (start, end) };

    if start == end {
        start.format("%b %-d, %Y").to_string()
    } else if start.year() == end.year() && start.month() == end.month() {
        format!(
            "{} - {}, {}",
            start.format("%b %-d"),
            end.format("%-d"),
            end.year()
        )
    } else if start.year() == end.year() {
        format!(
            "{} - {}, {}",
            start.format("%b %-d"),
            end.format("%b %-d"),
            end.year()
        )
    } else {
        format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    }
}

/// Monday and Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_monday() as i64;
    let monday = date - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

/// Number of days in a month, or None if the month is out of range.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// `January 2025`, or the raw numbers if the month is invalid
pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d.format("%B %Y").to_string(),
        None => format!("{}-{:02}", year, month),
    }
}

/// Format a calorie count with a thousands separator, e.g. `2,150 kcal`
pub fn format_calories(calories: u32) -> String {
    let digits = calories.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{} kcal", out)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
