use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::{debug, warn};

use crate::utils::time::stored_precision;

use super::document::{CurrentSession, Document, Segment};

/// Result of pausing the stopwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// There was no open session.
    NotRunning,
    Recorded(Segment),
    /// The clock went backwards or didn't move, so there was nothing to record. The session is
    /// closed regardless.
    Discarded,
}

impl Document {
    /// Opens a session on the calendar day of `now`. Does nothing if one is already open.
    pub fn start_session<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        if let Some(session) = &self.current_session {
            debug!("Session started at {} is already running", session.start);
            return false;
        }
        let date = now.date_naive();
        self.days.entry(date).or_default();
        self.current_session = Some(CurrentSession {
            date,
            start: stored_precision(now.with_timezone(&Utc)),
        });
        true
    }

    /// Closes the open session, adding it to its day.
    pub fn pause_session<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> PauseOutcome {
        let Some(session) = self.current_session.take() else {
            return PauseOutcome::NotRunning;
        };
        let end = stored_precision(now.with_timezone(&Utc));
        let Some(segment) = Segment::new_opt(session.start, end) else {
            warn!(
                "Discarding session with start {} and end {}",
                session.start, end
            );
            return PauseOutcome::Discarded;
        };
        self.days
            .entry(session.date)
            .or_default()
            .segments
            .push(segment);
        PauseOutcome::Recorded(segment)
    }

    /// Drops everything recorded on `today`, including an open session that belongs to it.
    /// Returns whether an open session was dropped.
    pub fn reset_day(&mut self, today: NaiveDate) -> bool {
        self.days.entry(today).or_default().segments.clear();
        match self.current_session {
            Some(session) if session.date == today => {
                self.current_session = None;
                true
            }
            Some(_) | None => false,
        }
    }
}
