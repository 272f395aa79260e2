use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::utils::time::{minutes_to_hours, round2};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Option<Uuid>,
    pub work_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub break_minutes: i32,
    pub duration_minutes: i32,
    pub billable: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkSession {
    pub fn is_running(&self) -> bool {
        self.stopped_at.is_none()
    }

    /// `stop - start` for finished sessions, `now - start` while running. Never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let end = self.stopped_at.unwrap_or(now);
        (end - self.started_at).num_seconds().max(0)
    }

    /// Stored net minutes for finished sessions, live elapsed time otherwise.
    pub fn hours(&self, now: DateTime<Utc>) -> f64 {
        if self.is_running() {
            round2(self.elapsed_seconds(now) as f64 / 3600.0)
        } else {
            minutes_to_hours(self.duration_minutes as i64)
        }
    }

    /// A running session has no end yet, so it claims everything from its start on.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self.stopped_at {
            Some(stopped_at) => intervals_overlap(self.started_at, stopped_at, start, end),
            None => end > self.started_at,
        }
    }
}

/// Stop timestamp for a running timer. Clock skew that would put `now` before
/// the start is clamped to a zero-length session.
pub fn clamp_stop(started_at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(started_at)
}

/// Whole minutes recorded for a timer run; timers carry no break.
pub fn timer_minutes(started_at: DateTime<Utc>, stopped_at: DateTime<Utc>) -> i32 {
    let seconds = (stopped_at - started_at).num_seconds().max(0);
    (seconds / 60) as i32
}

/// Net minutes for a manually entered interval.
pub fn net_minutes(
    started_at: DateTime<Utc>,
    stopped_at: DateTime<Utc>,
    break_minutes: i32,
) -> Result<i32> {
    if break_minutes < 0 {
        return Err(Error::BadRequest(
            "Break minutes cannot be negative.".to_string(),
        ));
    }
    if stopped_at <= started_at {
        return Err(Error::BadRequest(
            "End time must be after start time.".to_string(),
        ));
    }
    let raw = (stopped_at - started_at).num_seconds() / 60 - break_minutes as i64;
    if raw <= 0 {
        return Err(Error::BadRequest(
            "Duration must be greater than zero after break.".to_string(),
        ));
    }
    Ok(raw as i32)
}

/// Half-open overlap: intervals that only touch do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, h, m, 0).unwrap()
    }

    fn session(start: DateTime<Utc>, stop: Option<DateTime<Utc>>, minutes: i32) -> WorkSession {
        WorkSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            project_id: None,
            work_date: start.date_naive(),
            started_at: start,
            stopped_at: stop,
            break_minutes: 0,
            duration_minutes: minutes,
            billable: true,
            notes: String::new(),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn elapsed_is_stop_minus_start() {
        let s = session(at(9, 0), Some(at(17, 30)), 510);
        assert_eq!(s.elapsed_seconds(at(23, 0)), 8 * 3600 + 1800);
        assert_eq!(s.hours(at(23, 0)), 8.5);
        assert!(!s.is_running());
    }

    #[test]
    fn running_session_reports_live_hours() {
        let s = session(at(9, 0), None, 0);
        assert!(s.is_running());
        assert_eq!(s.hours(at(10, 15)), 1.25);
        assert_eq!(s.elapsed_seconds(at(8, 0)), 0);
    }

    #[test]
    fn skewed_clock_clamps_to_zero_length() {
        let start = at(9, 0);
        let skewed = start - Duration::seconds(42);
        let stop = clamp_stop(start, skewed);
        assert_eq!(stop, start);
        assert_eq!(timer_minutes(start, stop), 0);
        assert_eq!(clamp_stop(start, at(10, 0)), at(10, 0));
    }

    #[test]
    fn timer_minutes_truncate_partial_minutes() {
        let start = at(9, 0);
        assert_eq!(timer_minutes(start, start + Duration::seconds(119)), 1);
        assert_eq!(timer_minutes(start, at(11, 0)), 120);
    }

    #[test]
    fn manual_entries_subtract_breaks() {
        assert_eq!(net_minutes(at(9, 0), at(17, 0), 30).unwrap(), 450);
    }

    #[test]
    fn manual_entries_reject_bad_intervals() {
        let err = net_minutes(at(17, 0), at(9, 0), 0).unwrap_err();
        assert_eq!(err.to_string(), "Bad request: End time must be after start time.");
        assert!(net_minutes(at(9, 0), at(9, 0), 0).is_err());
        assert!(net_minutes(at(9, 0), at(9, 30), 30).is_err());
        assert!(net_minutes(at(9, 0), at(10, 0), -5).is_err());
    }

    #[test]
    fn overlap_ignores_touching_intervals() {
        assert!(intervals_overlap(at(9, 0), at(12, 0), at(11, 0), at(13, 0)));
        assert!(intervals_overlap(at(9, 0), at(12, 0), at(10, 0), at(11, 0)));
        assert!(!intervals_overlap(at(9, 0), at(12, 0), at(12, 0), at(13, 0)));
        assert!(!intervals_overlap(at(13, 0), at(14, 0), at(9, 0), at(13, 0)));
    }

    #[test]
    fn running_session_claims_everything_after_its_start() {
        let running = session(at(9, 0), None, 0);
        assert!(running.overlaps(at(9, 30), at(10, 0)));
        assert!(running.overlaps(at(14, 0), at(15, 0)));
        assert!(running.overlaps(at(8, 0), at(9, 1)));
        assert!(!running.overlaps(at(7, 0), at(9, 0)));

        let done = session(at(9, 0), Some(at(10, 0)), 60);
        assert!(done.overlaps(at(9, 30), at(10, 30)));
        assert!(!done.overlaps(at(10, 0), at(11, 0)));
    }
}
