//! The time-accounting engine.
//!
//! [Document] holds all state and implements the pure operations on it. [StudyTracker] owns a
//! document together with the store it was loaded from, and saves after every mutation.

pub mod document;
pub mod normalize;
pub mod session;
pub mod settings;
pub mod stats;
pub mod tasks;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use document::Document;
use normalize::load_document;
use session::PauseOutcome;
use settings::GoalKind;
use stats::DerivedStats;
use tasks::Todo;
use tracing::{debug, error, info};

use crate::{storage::DocumentStore, utils::clock::Clock};

pub struct StudyTracker<S, Tz: TimeZone = Local> {
    document: Document,
    store: S,
    clock: Box<dyn Clock>,
    timezone: Tz,
}

impl<S: DocumentStore> StudyTracker<S, Local> {
    pub fn open(store: S, clock: Box<dyn Clock>) -> Self {
        Self::open_in(store, clock, Local)
    }
}

impl<S: DocumentStore, Tz: TimeZone> StudyTracker<S, Tz> {
    /// Loads the stored document. Calendar days are taken in `timezone`.
    pub fn open_in(store: S, clock: Box<dyn Clock>, timezone: Tz) -> Self {
        let stored = store
            .load()
            .inspect_err(|e| error!("Failed to read stored document {e:?}"))
            .ok()
            .flatten();
        let document = load_document(stored.as_deref());
        info!(
            "Loaded document with {} days and {} todos",
            document.days.len(),
            document.todos.len()
        );
        Self {
            document,
            store,
            clock,
            timezone,
        }
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.time().with_timezone(&self.timezone)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Replaces the in-memory document with what is stored now, picking up changes made by other
    /// processes. A failed read or a missing document keeps the current one.
    pub fn reload(&mut self) {
        match self.store.load() {
            Ok(Some(bytes)) => self.document = load_document(Some(bytes.as_slice())),
            Ok(None) => debug!("Nothing stored yet, keeping current document"),
            Err(e) => error!("Failed to reload stored document {e:?}"),
        }
    }

    pub fn snapshot(&self) -> DerivedStats {
        self.document.snapshot(&self.now())
    }

    /// Writes the whole document. Failures are only logged, the in-memory document stays
    /// authoritative.
    fn persist(&self) {
        let result = serde_json::to_vec(&self.document)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| self.store.save(&bytes));
        if let Err(e) = result {
            error!("Failed to save document {e:?}");
        }
    }

    pub fn start(&mut self) -> bool {
        let now = self.now();
        let started = self.document.start_session(&now);
        if started {
            info!("Started session");
            self.persist();
        }
        started
    }

    pub fn pause(&mut self) -> PauseOutcome {
        let now = self.now();
        let outcome = self.document.pause_session(&now);
        match outcome {
            PauseOutcome::NotRunning => {}
            PauseOutcome::Recorded(segment) => {
                info!("Paused session, recorded {}s", segment.duration().num_seconds());
                self.persist();
            }
            PauseOutcome::Discarded => self.persist(),
        }
        outcome
    }

    /// Clears today's record. Asking the user for confirmation is up to the caller.
    pub fn reset_today(&mut self) {
        let today = self.now().date_naive();
        let dropped_session = self.document.reset_day(today);
        info!("Reset {today}, dropped open session: {dropped_session}");
        self.persist();
    }

    pub fn add_task(&mut self, text: &str) -> Option<Todo> {
        let todo = self.document.todos.add(text).cloned()?;
        debug!("Added task {todo:?}");
        self.persist();
        Some(todo)
    }

    pub fn toggle_task(&mut self, id: u64) -> Option<bool> {
        let done = self.document.todos.toggle(id)?;
        debug!("Task {id} done: {done}");
        self.persist();
        Some(done)
    }

    pub fn delete_task(&mut self, id: u64) -> bool {
        let deleted = self.document.todos.delete(id);
        if deleted {
            debug!("Deleted task {id}");
            self.persist();
        }
        deleted
    }

    pub fn clear_completed(&mut self) -> usize {
        let removed = self.document.todos.clear_completed();
        if removed > 0 {
            debug!("Cleared {removed} completed tasks");
            self.persist();
        }
        removed
    }

    /// Validates and stores a goal. Invalid input leaves the settings untouched.
    pub fn set_goal(&mut self, kind: GoalKind, input: &str) -> Result<u32> {
        let value = kind.parse_input(input)?;
        self.document.settings.set_goal(kind, value);
        debug!("Set {kind} goal to {value}");
        self.persist();
        Ok(value)
    }
}
