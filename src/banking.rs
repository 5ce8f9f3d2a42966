//! The banking-chain recalculation.
//!
//! Derived banking fields (`bankedFromPrevious`, `surplus`,
//! `bankedForNextWeek`) are a pure function of each week's raw
//! `{target, completed}` inputs and week ordering. This module recomputes
//! them for an entire `allWeeksData` map in one pass; callers run it on
//! every read and every write so persisted derived fields are never
//! authoritative.
//!
//! The pass never fails: malformed fields fall back to defaults, entries
//! whose keys don't parse are skipped with a warning, and non-week keys
//! pass through untouched.

use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::{DEFAULT_TARGET, WEEK_KEY_PREFIX};

/// Parse the week number out of a `week_<n>` key. Returns `None` for keys
/// that don't carry the prefix or whose suffix is not a positive integer.
pub fn parse_week_key(key: &str) -> Option<i64> {
    let suffix = key.strip_prefix(WEEK_KEY_PREFIX)?;
    suffix.parse::<i64>().ok().filter(|n| *n >= 1)
}

/// Read an integer field off a raw week object, tolerating absent or
/// mis-typed values.
fn int_field(obj: &Map<String, Value>, key: &str, default: i64) -> i64 {
    obj.get(key).and_then(Value::as_i64).unwrap_or(default)
}

/// Recompute the banking chain over `allWeeksData`.
///
/// Weeks are ordered by effective week number: an entry's own `weekNum`
/// field when present, else its key suffix. Each week's incoming bank is
/// the computed `bankedForNextWeek` of the week numbered exactly one less;
/// when that week is absent the incoming bank is zero (numbering gaps reset
/// the chain rather than inheriting from earlier weeks).
///
/// Non-week entries are returned byte-identical and never participate in
/// the chain. The input is not mutated.
pub fn recalculate(all_weeks_data: &Map<String, Value>) -> Map<String, Value> {
    let mut result = all_weeks_data.clone();

    // (key, effective week number) for every entry that joins the chain.
    let mut chain: Vec<(&String, i64)> = Vec::new();
    for (key, value) in all_weeks_data {
        if !key.starts_with(WEEK_KEY_PREFIX) {
            continue;
        }
        let Some(key_num) = parse_week_key(key) else {
            warn!(%key, "skipping week entry with unparseable key");
            continue;
        };
        let Some(obj) = value.as_object() else {
            warn!(%key, "skipping week entry that is not an object");
            continue;
        };
        let effective = obj
            .get("weekNum")
            .and_then(Value::as_i64)
            .unwrap_or(key_num);
        chain.push((key, effective));
    }

    // Stable sort: duplicate numbers keep map order (a data-quality issue,
    // not an error).
    chain.sort_by_key(|(_, n)| *n);

    // bankedForNextWeek computed so far, by effective week number.
    let mut banked: HashMap<i64, i64> = HashMap::new();

    for (key, week_num) in chain {
        let Some(obj) = result.get_mut(key).and_then(Value::as_object_mut) else {
            continue;
        };

        let target = int_field(obj, "target", DEFAULT_TARGET);
        let completed = int_field(obj, "completed", 0).max(0);

        // Saturating arithmetic: extreme client-supplied values must clamp,
        // never wrap or panic.
        let banked_from_previous = week_num
            .checked_sub(1)
            .and_then(|prev| banked.get(&prev).copied())
            .unwrap_or(0);
        let surplus = completed.saturating_sub(target).max(0);
        let banked_for_next_week = banked_from_previous.saturating_add(surplus);

        obj.insert("bankedFromPrevious".into(), banked_from_previous.into());
        obj.insert("surplus".into(), surplus.into());
        obj.insert("bankedForNextWeek".into(), banked_for_next_week.into());

        if banked.insert(week_num, banked_for_next_week).is_some() {
            debug!(week_num, "duplicate effective week number in chain");
        }
    }

    result
}

/// Defensive wrapper for untyped input: recalculates when given a JSON
/// object, returns anything else unchanged.
pub fn recalculate_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(recalculate(&map)),
        other => {
            debug!("allWeeksData is not an object; passing through");
            other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weeks(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_chain_propagates_surplus() {
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 42},
            "week_2": {"target": 40, "completed": 30},
        }));
        let out = recalculate(&input);

        assert_eq!(out["week_1"]["bankedFromPrevious"], 0);
        assert_eq!(out["week_1"]["surplus"], 2);
        assert_eq!(out["week_1"]["bankedForNextWeek"], 2);

        assert_eq!(out["week_2"]["bankedFromPrevious"], 2);
        assert_eq!(out["week_2"]["surplus"], 0);
        assert_eq!(out["week_2"]["bankedForNextWeek"], 2);
    }

    #[test]
    fn test_bank_accumulates_across_surplus_weeks() {
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 45},
            "week_2": {"target": 40, "completed": 43},
            "week_3": {"target": 40, "completed": 40},
        }));
        let out = recalculate(&input);

        assert_eq!(out["week_2"]["bankedFromPrevious"], 5);
        assert_eq!(out["week_2"]["bankedForNextWeek"], 8);
        assert_eq!(out["week_3"]["bankedFromPrevious"], 8);
        assert_eq!(out["week_3"]["bankedForNextWeek"], 8);
    }

    #[test]
    fn test_gap_resets_incoming_bank() {
        // No week_2, so week_3 has no exact predecessor to draw from.
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 42},
            "week_3": {"target": 40, "completed": 10},
        }));
        let out = recalculate(&input);

        assert_eq!(out["week_1"]["bankedForNextWeek"], 2);
        assert_eq!(out["week_3"]["bankedFromPrevious"], 0);
        assert_eq!(out["week_3"]["bankedForNextWeek"], 0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let input = weeks(json!({
            "week_1": {"completed": 50},
            "week_2": {"target": 30},
        }));
        let out = recalculate(&input);

        // Missing target defaults to 40.
        assert_eq!(out["week_1"]["surplus"], 10);
        // Missing completed defaults to 0.
        assert_eq!(out["week_2"]["surplus"], 0);
        assert_eq!(out["week_2"]["bankedFromPrevious"], 10);
    }

    #[test]
    fn test_malformed_fields_use_defaults() {
        let input = weeks(json!({
            "week_1": {"target": "forty", "completed": 44},
        }));
        let out = recalculate(&input);
        assert_eq!(out["week_1"]["surplus"], 4);
    }

    #[test]
    fn test_derived_fields_in_input_are_overwritten() {
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 40, "surplus": 99,
                       "bankedFromPrevious": 99, "bankedForNextWeek": 99},
        }));
        let out = recalculate(&input);
        assert_eq!(out["week_1"]["bankedFromPrevious"], 0);
        assert_eq!(out["week_1"]["surplus"], 0);
        assert_eq!(out["week_1"]["bankedForNextWeek"], 0);
    }

    #[test]
    fn test_week_num_field_overrides_key_suffix() {
        // week_9's own weekNum places it right after week_1 in the chain.
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 45},
            "week_9": {"weekNum": 2, "target": 40, "completed": 0},
        }));
        let out = recalculate(&input);
        assert_eq!(out["week_9"]["bankedFromPrevious"], 5);
    }

    #[test]
    fn test_non_week_keys_pass_through() {
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 42},
            "notes": {"completed": 1000, "target": 0},
        }));
        let out = recalculate(&input);
        assert_eq!(out["notes"], json!({"completed": 1000, "target": 0}));
        assert!(out["notes"].get("surplus").is_none());
    }

    #[test]
    fn test_unparseable_week_keys_are_skipped() {
        let input = weeks(json!({
            "week_abc": {"target": 40, "completed": 99},
            "week_0": {"target": 40, "completed": 99},
            "week_1": {"target": 40, "completed": 41},
        }));
        let out = recalculate(&input);
        assert!(out["week_abc"].get("surplus").is_none());
        assert!(out["week_0"].get("surplus").is_none());
        assert_eq!(out["week_1"]["surplus"], 1);
    }

    #[test]
    fn test_non_object_week_entry_is_left_alone() {
        let input = weeks(json!({
            "week_1": 42,
            "week_2": {"target": 40, "completed": 45},
        }));
        let out = recalculate(&input);
        assert_eq!(out["week_1"], json!(42));
        // week_1 never joined the chain, so week_2 sees no predecessor.
        assert_eq!(out["week_2"]["bankedFromPrevious"], 0);
        assert_eq!(out["week_2"]["surplus"], 5);
    }

    #[test]
    fn test_empty_map() {
        let out = recalculate(&Map::new());
        assert!(out.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let input = weeks(json!({
            "week_1": {"target": 40, "completed": 48},
            "week_2": {"target": 35, "completed": 36},
            "week_4": {"completed": 50},
            "notes": "keep",
        }));
        let once = recalculate(&input);
        let twice = recalculate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_invariant_bank_equals_previous_plus_surplus() {
        let input = weeks(json!({
            "week_1": {"target": 10, "completed": 25},
            "week_2": {"target": 40, "completed": 12},
            "week_3": {"target": 20, "completed": 31},
        }));
        let out = recalculate(&input);
        for n in 1..=3 {
            let week = &out[&format!("week_{}", n)];
            let prev = week["bankedFromPrevious"].as_i64().unwrap();
            let surplus = week["surplus"].as_i64().unwrap();
            let next = week["bankedForNextWeek"].as_i64().unwrap();
            assert!(surplus >= 0);
            assert!(prev >= 0);
            assert_eq!(next, prev + surplus);
        }
    }

    #[test]
    fn test_negative_completed_clamps_to_zero() {
        let input = weeks(json!({
            "week_1": {"target": 0, "completed": -5},
        }));
        let out = recalculate(&input);
        assert_eq!(out["week_1"]["surplus"], 0);
    }

    #[test]
    fn test_extreme_values_saturate_instead_of_overflowing() {
        let input = weeks(json!({
            "week_1": {"target": i64::MIN, "completed": 1},
            "week_2": {"target": 0, "completed": i64::MAX},
        }));
        let out = recalculate(&input);

        // 1 - i64::MIN clamps to i64::MAX rather than wrapping.
        assert_eq!(out["week_1"]["surplus"], i64::MAX);
        assert_eq!(out["week_1"]["bankedForNextWeek"], i64::MAX);
        // Carrying that bank into another max-surplus week clamps too.
        assert_eq!(out["week_2"]["bankedFromPrevious"], i64::MAX);
        assert_eq!(out["week_2"]["surplus"], i64::MAX);
        assert_eq!(out["week_2"]["bankedForNextWeek"], i64::MAX);
    }

    #[test]
    fn test_extreme_week_num_has_no_predecessor() {
        let input = weeks(json!({
            "week_1": {"weekNum": i64::MIN, "target": 40, "completed": 45},
        }));
        let out = recalculate(&input);
        assert_eq!(out["week_1"]["bankedFromPrevious"], 0);
        assert_eq!(out["week_1"]["surplus"], 5);
    }

    #[test]
    fn test_recalculate_value_passes_through_non_objects() {
        assert_eq!(recalculate_value(json!([1, 2])), json!([1, 2]));
        assert_eq!(recalculate_value(json!(null)), json!(null));
        assert_eq!(recalculate_value(json!("x")), json!("x"));
    }

    #[test]
    fn test_recalculate_value_recalculates_objects() {
        let out = recalculate_value(json!({
            "week_1": {"target": 40, "completed": 42},
        }));
        assert_eq!(out["week_1"]["bankedForNextWeek"], 2);
    }
}
