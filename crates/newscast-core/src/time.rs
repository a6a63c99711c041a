//! Beijing-time helpers.
//!
//! The bulletin is produced for a Chinese audience; all user-facing dates and
//! the prompt's time context use UTC+8 regardless of the host timezone.

use chrono::{DateTime, Datelike, FixedOffset, Utc};

const WEEKDAYS_CN: [&str; 7] = [
    "星期一",
    "星期二",
    "星期三",
    "星期四",
    "星期五",
    "星期六",
    "星期日",
];

/// Current time in Beijing (UTC+8).
pub fn beijing_now() -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset");
    Utc::now().with_timezone(&offset)
}

/// Format a date as `YYYY年MM月DD日`.
pub fn format_date_cn(datetime: &DateTime<FixedOffset>) -> String {
    format!(
        "{}年{:02}月{:02}日",
        datetime.year(),
        datetime.month(),
        datetime.day()
    )
}

/// Chinese weekday name for a date.
pub fn weekday_cn(datetime: &DateTime<FixedOffset>) -> &'static str {
    WEEKDAYS_CN[datetime.weekday().num_days_from_monday() as usize]
}
