//! Human-readable forecast summaries

use crate::providers::DailyForecast;

/// Days included in a waypoint summary
pub const SUMMARY_DAYS: usize = 2;

/// Summary used when the provider returned no days
pub const NO_DAILY_DATA: &str = "No daily data";

/// Summarize the first two days, e.g. `Clear (min 55°, max 71.5°); Rain (min 50°, max 60°)`
pub fn summarize(days: &[DailyForecast]) -> String {
    if days.is_empty() {
        return NO_DAILY_DATA.to_string();
    }

    days.iter()
        .take(SUMMARY_DAYS)
        .map(format_day)
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_day(day: &DailyForecast) -> String {
    format!(
        "{} (min {}°, max {}°)",
        day.condition.as_deref().unwrap_or("?"),
        format_temperature(day.min),
        format_temperature(day.max)
    )
}

/// Whole numbers print without a fraction; missing values print as `?`
pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v}"),
        _ => "?".to_string(),
    }
}
