//! The four dashboard panels and the semantic search page shared by jobs and
//! resumes. Each owns its handlers, its view models and its client-side
//! rules such as validation, filtering and percentages.

pub mod analytics;
pub mod jobs;
pub mod matching;
pub mod resumes;
pub mod search;

/// `part / whole` as a percentage; 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}

/// Bar width for CSS, clamped to 0–100 and rounded to one decimal.
pub fn bar_width(value: f64) -> f64 {
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Trimmed value, or `None` for missing and blank form/query fields.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
