//! Turns whatever was found in the store into a well formed [Document].
//!
//! Every field is repaired on its own, so a single broken field never costs the rest of the
//! document. Nothing here fails: the worst case is an empty document.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::utils::time::key_to_date;

use super::{
    document::{CurrentSession, DayRecord, Document, Segment, DOCUMENT_VERSION},
    settings::{GoalKind, Settings},
    tasks::{TaskList, Todo},
};

/// Loads a document from stored bytes. Missing or unreadable data yields an empty document.
pub fn load_document(bytes: Option<&[u8]>) -> Document {
    let Some(bytes) = bytes else {
        debug!("No stored document, starting fresh");
        return Document::default();
    };
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => normalize(value),
        Err(e) => {
            warn!("Stored document is not valid json, starting fresh: {e}");
            Document::default()
        }
    }
}

pub fn normalize(value: Value) -> Document {
    let Value::Object(mut root) = value else {
        warn!("Stored document is not an object, starting fresh");
        return Document::default();
    };

    match root.get("version").and_then(Value::as_u64) {
        Some(version) if version == DOCUMENT_VERSION as u64 => {}
        version => debug!("Upgrading document from version {version:?}"),
    }

    let mut days = root
        .remove("days")
        .map(normalize_days)
        .unwrap_or_default();

    let current_session = root
        .remove("currentSession")
        .and_then(|v| normalize_session(&v));
    if let Some(session) = &current_session {
        days.entry(session.date).or_default();
    }

    let todos = root
        .remove("todos")
        .map(normalize_todos)
        .unwrap_or_default();

    let settings = root
        .remove("settings")
        .map(|v| normalize_settings(&v))
        .unwrap_or_default();

    Document {
        version: DOCUMENT_VERSION,
        days,
        current_session,
        todos,
        settings,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let millis = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })?;
    DateTime::from_timestamp_millis(millis)
}

fn normalize_days(value: Value) -> BTreeMap<NaiveDate, DayRecord> {
    let Value::Object(days) = value else {
        warn!("Stored days are not an object, dropping them");
        return BTreeMap::new();
    };
    days.into_iter()
        .filter_map(|(key, day)| {
            let Some(date) = key_to_date(&key) else {
                warn!("Dropping day with illegal key {key:?}");
                return None;
            };
            Some((date, normalize_day(&day)))
        })
        .collect()
}

fn normalize_day(value: &Value) -> DayRecord {
    let Some(stored) = value.get("segments").and_then(Value::as_array) else {
        return DayRecord::default();
    };
    let segments = stored
        .iter()
        .filter_map(|segment| {
            let start = segment.get("start").and_then(timestamp)?;
            let end = segment.get("end").and_then(timestamp)?;
            Segment::new_opt(start, end)
        })
        .collect::<Vec<_>>();
    if segments.len() != stored.len() {
        warn!("Dropped illegal segments from a stored day");
    }
    DayRecord { segments }
}

fn normalize_session(value: &Value) -> Option<CurrentSession> {
    if value.is_null() {
        return None;
    }
    let date = value.get("dateKey").and_then(Value::as_str).and_then(key_to_date);
    let start = value.get("start").and_then(timestamp);
    match (date, start) {
        (Some(date), Some(start)) => Some(CurrentSession { date, start }),
        _ => {
            warn!("Dropping illegal open session {value}");
            None
        }
    }
}

fn normalize_todos(value: Value) -> TaskList {
    let Value::Array(items) = value else {
        warn!("Stored todos are not a list, dropping them");
        return TaskList::default();
    };
    TaskList::from_items(items.into_iter().filter_map(|item| {
        let todo = Todo {
            id: item.get("id").and_then(Value::as_u64)?,
            text: item.get("text").and_then(Value::as_str)?.to_string(),
            done: item.get("done").and_then(Value::as_bool).unwrap_or(false),
        };
        Some(todo)
    }))
}

fn goal_field(settings: &Map<String, Value>, field: &str, kind: GoalKind, default: u32) -> u32 {
    settings
        .get(field)
        .and_then(|v| v.as_i64().or_else(|| v.as_u64().map(|_| i64::MAX)))
        .map_or(default, |v| kind.clamp(v))
}

fn normalize_settings(value: &Value) -> Settings {
    let defaults = Settings::default();
    let Value::Object(settings) = value else {
        return defaults;
    };
    Settings {
        daily_goal_minutes: goal_field(
            settings,
            "dailyGoalMinutes",
            GoalKind::Daily,
            defaults.daily_goal_minutes,
        ),
        weekly_goal_hours: goal_field(
            settings,
            "weeklyGoalHours",
            GoalKind::Weekly,
            defaults.weekly_goal_hours,
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use serde_json::json;

    use crate::tracker::{
        document::{CurrentSession, Document, DOCUMENT_VERSION},
        settings::Settings,
    };

    use super::{load_document, normalize};

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_missing_and_corrupted_blobs_yield_empty_document() {
        assert_eq!(load_document(None), Document::default());
        assert_eq!(load_document(Some(b"".as_slice())), Document::default());
        assert_eq!(load_document(Some(b"{\"days\": ".as_slice())), Document::default());
        assert_eq!(load_document(Some(b"[1, 2, 3]".as_slice())), Document::default());
        assert_eq!(load_document(Some(b"null".as_slice())), Document::default());
    }

    #[test]
    fn test_legacy_document_gets_defaults() {
        let document = normalize(json!({
            "days": {
                "2024-05-01": { "segments": [ { "start": 1714557600000_i64, "end": 1714557660000_i64 } ] }
            }
        }));
        assert_eq!(document.version, DOCUMENT_VERSION);
        assert_eq!(document.settings, Settings::default());
        assert!(document.todos.is_empty());
        assert_eq!(document.current_session, None);
        assert_eq!(
            document.days[&may_first()].recorded(),
            Duration::minutes(1)
        );
    }

    #[test]
    fn test_wrong_field_types_are_replaced() {
        let document = normalize(json!({
            "version": 1,
            "days": [1, 2],
            "currentSession": "yes",
            "todos": { "id": 1 },
            "settings": 12
        }));
        assert_eq!(document, Document::default());
    }

    #[test]
    fn test_illegal_entries_are_dropped() {
        let document = normalize(json!({
            "days": {
                "not a date": { "segments": [] },
                "2024-5-1": { "segments": [] },
                "2024-05-01": { "segments": [
                    { "start": 1714557600000_i64, "end": 1714557600000_i64 },
                    { "start": 1714557600000_i64, "end": 1714557500000_i64 },
                    { "start": "soon", "end": 1714557500000_i64 },
                    { "start": 1714557600000_i64 },
                    { "start": 1714557600000_i64, "end": 1714557630000_i64 }
                ] },
                "2024-05-02": { "segments": "none" },
                "2024-05-03": 5
            },
            "todos": [
                { "id": 1, "text": "kept" },
                { "id": 2 },
                { "text": "no id" },
                { "id": 1, "text": "repeated id", "done": true },
                { "id": 3, "text": "done", "done": true },
                "text"
            ]
        }));

        assert_eq!(document.days.len(), 3);
        assert_eq!(document.days[&may_first()].segments.len(), 1);
        assert!(document.days.values().skip(1).all(|day| day.segments.is_empty()));

        let todos = document
            .todos
            .iter()
            .map(|todo| (todo.id, todo.text.as_str(), todo.done))
            .collect::<Vec<_>>();
        assert_eq!(todos, vec![(1, "kept", false), (3, "done", true)]);
    }

    #[test]
    fn test_settings_are_merged_and_clamped() {
        let document = normalize(json!({ "settings": { "dailyGoalMinutes": 5000 } }));
        assert_eq!(document.settings.daily_goal_minutes, 1440);
        assert_eq!(
            document.settings.weekly_goal_hours,
            Settings::default().weekly_goal_hours
        );

        let document = normalize(json!({
            "settings": { "dailyGoalMinutes": "lots", "weeklyGoalHours": -4 }
        }));
        assert_eq!(
            document.settings.daily_goal_minutes,
            Settings::default().daily_goal_minutes
        );
        assert_eq!(document.settings.weekly_goal_hours, 0);
    }

    #[test]
    fn test_session_without_day_gets_one() {
        let document = normalize(json!({
            "currentSession": { "dateKey": "2024-05-01", "start": 1714557600000_i64 }
        }));
        assert_eq!(
            document.current_session,
            Some(CurrentSession {
                date: may_first(),
                start: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            })
        );
        assert!(document.days[&may_first()].segments.is_empty());

        let document = normalize(json!({
            "currentSession": { "dateKey": "tomorrow", "start": 1714557600000_i64 }
        }));
        assert_eq!(document.current_session, None);
        assert!(document.days.is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() -> anyhow::Result<()> {
        let raw = json!({
            "days": {
                "2024-05-01": { "segments": [
                    { "start": 1714557600000_i64, "end": 1714557630000_i64 },
                    { "start": 1714557600000_i64, "end": 1714557500000_i64 }
                ] },
                "bogus": {}
            },
            "currentSession": { "dateKey": "2024-05-02", "start": 1714644000000_i64 },
            "todos": [ { "id": 7, "text": "x" }, { "id": 7, "text": "y" } ],
            "settings": { "weeklyGoalHours": 999 }
        });

        let first = normalize(raw);
        let second = load_document(Some(serde_json::to_vec(&first)?.as_slice()));
        let third = load_document(Some(serde_json::to_vec(&second)?.as_slice()));
        assert_eq!(first, second);
        assert_eq!(second, third);
        Ok(())
    }
}
