//! Study-time tracker: a stopwatch that keeps one record per calendar day, a small task list, and
//! a dashboard with daily and weekly goals and a streak.
//!
//! All state lives in a single JSON document, see [tracker::document::Document].

pub mod cli;
pub mod storage;
pub mod tracker;
pub mod utils;
