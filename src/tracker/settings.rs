use std::fmt::Display;

use anyhow::{anyhow, Result};
use chrono::Duration;
use serde::Serialize;

pub const DEFAULT_DAILY_GOAL_MINUTES: u32 = 120;
pub const DEFAULT_WEEKLY_GOAL_HOURS: u32 = 14;
pub const MAX_DAILY_GOAL_MINUTES: u32 = 24 * 60;
pub const MAX_WEEKLY_GOAL_HOURS: u32 = 7 * 24;

#[derive(PartialEq, Eq, Debug, Serialize, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub daily_goal_minutes: u32,
    pub weekly_goal_hours: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal_minutes: DEFAULT_DAILY_GOAL_MINUTES,
            weekly_goal_hours: DEFAULT_WEEKLY_GOAL_HOURS,
        }
    }
}

impl Settings {
    pub fn daily_goal(&self) -> Duration {
        Duration::minutes(self.daily_goal_minutes as i64)
    }

    pub fn weekly_goal(&self) -> Duration {
        Duration::hours(self.weekly_goal_hours as i64)
    }

    pub fn set_goal(&mut self, kind: GoalKind, value: u32) {
        let value = kind.clamp(value as i64);
        match kind {
            GoalKind::Daily => self.daily_goal_minutes = value,
            GoalKind::Weekly => self.weekly_goal_hours = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalKind {
    /// Measured in minutes.
    Daily,
    /// Measured in hours.
    Weekly,
}

impl Display for GoalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoalKind::Daily => write!(f, "daily"),
            GoalKind::Weekly => write!(f, "weekly"),
        }
    }
}

impl GoalKind {
    pub fn max(&self) -> u32 {
        match self {
            GoalKind::Daily => MAX_DAILY_GOAL_MINUTES,
            GoalKind::Weekly => MAX_WEEKLY_GOAL_HOURS,
        }
    }

    pub fn clamp(&self, value: i64) -> u32 {
        value.clamp(0, self.max() as i64) as u32
    }

    /// Parses user input for a goal. Numbers are truncated to integers and clamped into range,
    /// anything that isn't a number is rejected.
    pub fn parse_input(&self, input: &str) -> Result<u32> {
        let input = input.trim();
        let value = match input.parse::<i64>() {
            Ok(v) => v,
            Err(_) => input
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
                .ok_or_else(|| anyhow!("Can't parse {input:?} into a {self} goal"))?,
        };
        Ok(self.clamp(value))
    }
}
