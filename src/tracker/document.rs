use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::utils::time::saturating_add;

use super::{settings::Settings, tasks::TaskList};

/// Bumped whenever the stored shape changes. Older documents are repaired on load.
pub const DOCUMENT_VERSION: u32 = 1;

/// A completed study interval. Only intervals with a positive duration are ever created.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Clone, Copy)]
pub struct Segment {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

impl Segment {
    pub fn new_opt(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn duration(&self) -> Duration {
        (self.end - self.start).max(Duration::zero())
    }
}

#[derive(PartialEq, Eq, Debug, Serialize, Clone, Default)]
pub struct DayRecord {
    pub segments: Vec<Segment>,
}

impl DayRecord {
    pub fn recorded(&self) -> Duration {
        self.segments
            .iter()
            .fold(Duration::zero(), |sum, segment| {
                saturating_add(sum, segment.duration())
            })
    }
}

/// The open session. Its day is fixed when the session starts, so a session running past
/// midnight keeps accruing to the day it began on.
#[derive(PartialEq, Eq, Debug, Serialize, Clone, Copy)]
pub struct CurrentSession {
    #[serde(rename = "dateKey")]
    pub date: NaiveDate,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
}

impl CurrentSession {
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start).max(Duration::zero())
    }
}

/// Everything that gets persisted. Stored as a single JSON blob and overwritten as a whole.
#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    pub days: BTreeMap<NaiveDate, DayRecord>,
    pub current_session: Option<CurrentSession>,
    pub todos: TaskList,
    pub settings: Settings,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            days: BTreeMap::new(),
            current_session: None,
            todos: TaskList::default(),
            settings: Settings::default(),
        }
    }
}

impl Document {
    pub fn is_running(&self) -> bool {
        self.current_session.is_some()
    }
}
