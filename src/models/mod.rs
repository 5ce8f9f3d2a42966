//! Data models for Weekbank state.
//!
//! This module defines the core data structures:
//! - `WeekRecord` - one week's raw inputs and derived banking fields
//! - `GoalItem` - a single checklist entry in a week's goal list
//! - `StateSnapshot` - the entire persisted state, read/written wholesale
//!
//! The snapshot keeps its week and goal maps as raw JSON objects so that
//! clients with older or partially-formed payloads round-trip without loss;
//! `WeekRecord` is the typed shape this crate itself produces.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default weekly work-unit target when a week record carries none.
pub const DEFAULT_TARGET: i64 = 40;

/// Key prefix for week entries in `allWeeksData` (e.g. `week_3`).
pub const WEEK_KEY_PREFIX: &str = "week_";

fn default_target() -> i64 {
    DEFAULT_TARGET
}

/// One tracked week: raw inputs plus derived banking fields.
///
/// The derived fields (`banked_from_previous`, `surplus`,
/// `banked_for_next_week`) are overwritten on every recalculation and are
/// never authoritative on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekRecord {
    /// Week number; matches the `week_<n>` key suffix when present
    #[serde(rename = "weekNum", skip_serializing_if = "Option::is_none")]
    pub week_num: Option<i64>,

    /// Timestamp marking the start of the week
    #[serde(rename = "weekStart", skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,

    /// Work-unit goal for the week
    #[serde(default = "default_target")]
    pub target: i64,

    /// Work units actually logged
    #[serde(default)]
    pub completed: i64,

    /// Per-day unit counts keyed by day label (informational only)
    #[serde(rename = "dailyUnits", default, skip_serializing_if = "Map::is_empty")]
    pub daily_units: Map<String, Value>,

    /// Surplus carried in from the immediately preceding week
    #[serde(rename = "bankedFromPrevious", default)]
    pub banked_from_previous: i64,

    /// Units completed beyond this week's target
    #[serde(default)]
    pub surplus: i64,

    /// Total surplus available to the following week
    #[serde(rename = "bankedForNextWeek", default)]
    pub banked_for_next_week: i64,

    /// Unknown fields preserved round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeekRecord {
    /// Create a week with the given number and default inputs.
    pub fn new(week_num: i64) -> Self {
        Self {
            week_num: Some(week_num),
            week_start: None,
            target: DEFAULT_TARGET,
            completed: 0,
            daily_units: Map::new(),
            banked_from_previous: 0,
            surplus: 0,
            banked_for_next_week: 0,
            extra: Map::new(),
        }
    }
}

/// A single entry in a week's goal checklist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

/// The entire persisted state object.
///
/// Read, transformed, and rewritten wholesale on every store interaction;
/// there are no partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Week records keyed by `week_<n>`
    #[serde(rename = "allWeeksData", default)]
    pub all_weeks_data: Map<String, Value>,

    /// Goal lists keyed by `week_<n>`, independent lifecycle from weeks
    #[serde(rename = "allWeeklyGoals", default)]
    pub all_weekly_goals: Map<String, Value>,

    /// Opaque logged session records, append-only
    #[serde(default)]
    pub sessions: Vec<Value>,

    /// When this snapshot was last persisted (ISO 8601)
    #[serde(rename = "lastModified", default = "now_iso")]
    pub last_modified: String,
}

/// Current time formatted the way every snapshot timestamp is stored.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl StateSnapshot {
    /// An empty snapshot with a fresh timestamp.
    pub fn empty() -> Self {
        Self {
            all_weeks_data: Map::new(),
            all_weekly_goals: Map::new(),
            sessions: Vec::new(),
            last_modified: now_iso(),
        }
    }

    /// Build the default seed snapshot used when the store has never been
    /// written: one week with a small surplus already banked, one blank
    /// three-item goal list, no sessions.
    ///
    /// Always constructs a fresh value; callers must never share or mutate
    /// a common seed instance.
    pub fn seed() -> Self {
        let mut week = WeekRecord::new(1);
        week.week_start = Some(now_iso());
        week.completed = 42;
        week.surplus = 2;
        week.banked_for_next_week = 2;

        let mut weeks = Map::new();
        weeks.insert(
            "week_1".to_string(),
            serde_json::to_value(&week).unwrap_or(Value::Null),
        );

        let goals: Vec<GoalItem> = (0..3).map(|_| GoalItem::default()).collect();
        let mut goal_map = Map::new();
        goal_map.insert(
            "week_1".to_string(),
            serde_json::to_value(&goals).unwrap_or(Value::Null),
        );

        Self {
            all_weeks_data: weeks,
            all_weekly_goals: goal_map,
            sessions: Vec::new(),
            last_modified: now_iso(),
        }
    }
}
