use std::{fmt::Display, ops::Deref};

use chrono::Duration;

/// Goal progress. Always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Percentage(u8);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Percentage {
    pub const FULL: Percentage = Percentage(100);
}

impl Deref for Percentage {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `goal` covered by `value`, rounded to the nearest integer and clamped to 100. A zero
/// goal yields 0.
pub fn progress_percentage(value: Duration, goal: Duration) -> Percentage {
    let goal_ms = goal.num_milliseconds();
    if goal_ms <= 0 {
        return Percentage::default();
    }
    let value_ms = value.num_milliseconds().max(0);
    let rounded = (value_ms as f64 * 100. / goal_ms as f64).round();
    Percentage(rounded.min(100.) as u8)
}
