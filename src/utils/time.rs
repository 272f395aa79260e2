use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use std::sync::Arc;

/// Source of "now" for every state change.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// Monday and Sunday of the week containing `day`.
pub fn week_bounds(day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

pub fn current_week(clock: &dyn Clock) -> (NaiveDate, NaiveDate) {
    week_bounds(clock.now().date_naive())
}

pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// ISO week label such as `2024-W07`.
pub fn iso_week_label(day: NaiveDate) -> String {
    let week = day.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

const QUERY_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Lenient date parsing for query strings coming from date pickers.
pub fn parse_query_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.replace('.', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    QUERY_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}

/// Date window for reports; defaults to the last 30 days through `today`.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    let from = start
        .and_then(parse_query_date)
        .unwrap_or(today - Duration::days(30));
    let to = end.and_then(parse_query_date).unwrap_or(today);
    (from, to)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn minutes_to_hours(minutes: i64) -> f64 {
    round2(minutes as f64 / 60.0)
}
