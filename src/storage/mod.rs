//! Storage keeps the whole tracker state as one blob under a fixed key.
//! The basic idea is:
//!  - [DocumentStore] only knows about bytes. Shape validation happens in
//!    [normalize](crate::tracker::normalize) on load.
//!  - Every save overwrites the previous blob entirely.

pub mod file_store;

use std::ops::Deref;

use anyhow::Result;

/// Name the document is stored under.
pub const STORAGE_KEY: &str = "study-tracker.json";

/// Interface for abstracting storage of the tracker document.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentStore {
    /// Returns `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<u8>>>;

    fn save(&self, bytes: &[u8]) -> Result<()>;
}

impl<T: Deref> DocumentStore for T
where
    T::Target: DocumentStore,
{
    fn load(&self) -> Result<Option<Vec<u8>>> {
        self.deref().load()
    }

    fn save(&self, bytes: &[u8]) -> Result<()> {
        self.deref().save(bytes)
    }
}
