use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::utils::{
    percentage::{progress_percentage, Percentage},
    time::{date_to_key, previous_day, saturating_add},
};

use super::document::Document;

/// A day with at least this much study time keeps the streak alive.
pub const PRODUCTIVE_THRESHOLD: Duration = Duration::minutes(30);

/// Upper bound on how far back a streak is followed.
const MAX_STREAK_DAYS: u32 = 365;

/// Number of recorded days shown in history and summed into the weekly total.
pub const HISTORY_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl DayLabel {
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            DayLabel::Today
        } else if previous_day(today) == Some(date) {
            DayLabel::Yesterday
        } else {
            DayLabel::Date(date)
        }
    }
}

impl Display for DayLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayLabel::Today => write!(f, "Today"),
            DayLabel::Yesterday => write!(f, "Yesterday"),
            DayLabel::Date(date) => write!(f, "{}", date_to_key(*date)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub label: DayLabel,
    pub total: Duration,
}

/// Everything the dashboard shows, derived from the document at a single moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStats {
    pub today: NaiveDate,
    pub running: bool,
    pub session_elapsed: Duration,
    pub today_total: Duration,
    pub daily_goal: Duration,
    pub daily_progress: Percentage,
    pub weekly_total: Duration,
    pub weekly_goal: Duration,
    pub weekly_progress: Percentage,
    pub streak_days: u32,
    pub history: Vec<HistoryEntry>,
    pub open_tasks: usize,
    pub completed_tasks: usize,
}

impl Document {
    /// Time studied on `date`, including the open session when it belongs to that day.
    pub fn total_for_date(&self, date: NaiveDate, now: DateTime<Utc>) -> Duration {
        let recorded = self
            .days
            .get(&date)
            .map_or_else(Duration::zero, |day| day.recorded());
        match &self.current_session {
            Some(session) if session.date == date => {
                saturating_add(recorded, session.elapsed(now))
            }
            Some(_) | None => recorded,
        }
    }

    pub fn session_elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.current_session
            .map_or_else(Duration::zero, |session| session.elapsed(now))
    }

    /// The most recent days that have a record, newest first. Days without any record are
    /// skipped rather than counted as zero.
    pub fn recent_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().rev().take(HISTORY_DAYS).copied()
    }

    pub fn history(&self, today: NaiveDate, now: DateTime<Utc>) -> Vec<HistoryEntry> {
        self.recent_days()
            .map(|date| HistoryEntry {
                date,
                label: DayLabel::new(date, today),
                total: self.total_for_date(date, now),
            })
            .collect()
    }

    pub fn weekly_total(&self, now: DateTime<Utc>) -> Duration {
        self.recent_days()
            .fold(Duration::zero(), |sum, date| {
                saturating_add(sum, self.total_for_date(date, now))
            })
    }

    /// Consecutive days, ending with `today`, that reached [PRODUCTIVE_THRESHOLD]. A today that
    /// hasn't reached it yet means a streak of 0.
    pub fn streak(&self, today: NaiveDate, now: DateTime<Utc>) -> u32 {
        let mut streak = 0;
        let mut day = Some(today);
        while let Some(current) = day {
            if streak >= MAX_STREAK_DAYS {
                break;
            }
            if self.total_for_date(current, now) < PRODUCTIVE_THRESHOLD {
                break;
            }
            streak += 1;
            day = previous_day(current);
        }
        streak
    }

    pub fn snapshot<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DerivedStats {
        let today = now.date_naive();
        let now = now.with_timezone(&Utc);

        let today_total = self.total_for_date(today, now);
        let weekly_total = self.weekly_total(now);
        let daily_goal = self.settings.daily_goal();
        let weekly_goal = self.settings.weekly_goal();
        let completed_tasks = self.todos.completed();

        DerivedStats {
            today,
            running: self.is_running(),
            session_elapsed: self.session_elapsed(now),
            today_total,
            daily_goal,
            daily_progress: progress_percentage(today_total, daily_goal),
            weekly_total,
            weekly_goal,
            weekly_progress: progress_percentage(weekly_total, weekly_goal),
            streak_days: self.streak(today, now),
            history: self.history(today, now),
            open_tasks: self.todos.len() - completed_tasks,
            completed_tasks,
        }
    }
}
