//! Threshold and comparison rules deciding whether an observation is alert-worthy.
//!
//! Every rule is a pure function of the new value and its reference value.

use crate::alerting::model::{DataStoreSnapshot, StorageFillFact};
use crate::types::Megabytes;
use chrono::{DateTime, Duration, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const SECONDS_PER_DAY: i64 = 86_400;

/// Direction of a value relative to its reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Increase,
    Decrease,
    Unchanged,
}

impl Direction {
    fn between(value: Decimal, reference: Decimal) -> Self {
        match value.cmp(&reference) {
            Ordering::Greater => Direction::Increase,
            Ordering::Less => Direction::Decrease,
            Ordering::Equal => Direction::Unchanged,
        }
    }
}

/// Outcome of a numeric rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub triggered: bool,
    pub direction: Direction,
    /// Whole percent of change, rounded down. `None` when the reference is
    /// zero and the change is therefore unbounded.
    pub percentage_delta: Option<Decimal>,
}

/// Outcome of the creation time rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEvaluation {
    pub triggered: bool,
    /// `Increase` when the backup started later than expected
    pub direction: Direction,
    pub deviation: Duration,
}

/// Tunables for the rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleThresholds {
    /// Relative size change above which a size alert is raised (0.2 = 20 %)
    pub size_change: Decimal,
    /// Allowed distance between the actual and the scheduled start time
    pub creation_time_tolerance: Duration,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            size_change: Decimal::new(2, 1),
            creation_time_tolerance: Duration::minutes(60),
        }
    }
}

/// Compare a backup size against the size of the previous backup.
pub fn evaluate_size(size: Megabytes, reference: Megabytes, threshold: Decimal) -> Evaluation {
    let value = size.value();
    let reference = reference.value();
    let direction = Direction::between(value, reference);

    if reference.is_zero() {
        // Growing from nothing is an infinite change
        return Evaluation {
            triggered: !value.is_zero(),
            direction,
            percentage_delta: if value.is_zero() {
                Some(Decimal::ZERO)
            } else {
                None
            },
        };
    }

    let ratio = value / reference;
    let relative_change = (ratio - Decimal::ONE).abs();
    let percentage_delta = match direction {
        Direction::Decrease => ((Decimal::ONE - ratio) * Decimal::ONE_HUNDRED).floor(),
        Direction::Increase => ((ratio - Decimal::ONE) * Decimal::ONE_HUNDRED).floor(),
        Direction::Unchanged => Decimal::ZERO,
    };

    Evaluation {
        triggered: relative_change > threshold,
        direction,
        percentage_delta: Some(percentage_delta),
    }
}

/// Compare the fill level of a data store against its high-water mark.
pub fn evaluate_storage_fill(filled: Decimal, high_water_mark: Decimal) -> Evaluation {
    let direction = Direction::between(filled, high_water_mark);
    let percentage_delta = if high_water_mark.is_zero() {
        None
    } else {
        Some(((filled / high_water_mark - Decimal::ONE).abs() * Decimal::ONE_HUNDRED).floor())
    };

    Evaluation {
        triggered: filled > high_water_mark,
        direction,
        percentage_delta,
    }
}

/// Compare the time of day a backup started with the time of day it was
/// scheduled for. Deviations wrap around midnight, so 23:30 is 30 minutes
/// early for a 00:00 schedule.
pub fn evaluate_creation_time(
    date: DateTime<Utc>,
    reference: DateTime<Utc>,
    tolerance: Duration,
) -> TimeEvaluation {
    let actual = i64::from(date.time().num_seconds_from_midnight());
    let expected = i64::from(reference.time().num_seconds_from_midnight());

    let mut offset = (actual - expected).rem_euclid(SECONDS_PER_DAY);
    if offset > SECONDS_PER_DAY / 2 {
        offset -= SECONDS_PER_DAY;
    }

    let direction = match offset.cmp(&0) {
        Ordering::Greater => Direction::Increase,
        Ordering::Less => Direction::Decrease,
        Ordering::Equal => Direction::Unchanged,
    };
    let deviation = Duration::seconds(offset.abs());

    TimeEvaluation {
        triggered: deviation > tolerance,
        direction,
        deviation,
    }
}

/// Turn raw data store records into storage fill facts.
///
/// Records with a missing value are skipped, as are stores below their
/// high-water mark. At most `limit` facts are returned (`None` = all).
pub fn storage_fill_facts(
    snapshots: &[DataStoreSnapshot],
    limit: Option<usize>,
) -> Vec<StorageFillFact> {
    let facts = snapshots.iter().filter_map(|snapshot| {
        let (Some(capacity), Some(high_water_mark), Some(filled)) =
            (snapshot.capacity, snapshot.high_water_mark, snapshot.filled)
        else {
            log::debug!("Skipping data store {} with incomplete fill data", snapshot.name);
            return None;
        };

        if !evaluate_storage_fill(filled, high_water_mark).triggered {
            return None;
        }

        Some(StorageFillFact {
            data_store_name: snapshot.name.clone(),
            filled,
            high_water_mark,
            capacity,
        })
    });

    match limit {
        Some(limit) => facts.take(limit).collect(),
        None => facts.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataStoreName;

    fn mb(value: i64) -> Megabytes {
        Megabytes::new(Decimal::new(value, 0))
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn threshold() -> Decimal {
        RuleThresholds::default().size_change
    }

    #[test]
    fn test_size_increase_over_threshold_triggers() {
        let eval = evaluate_size(mb(121), mb(100), threshold());
        assert!(eval.triggered);
        assert_eq!(eval.direction, Direction::Increase);
        assert_eq!(eval.percentage_delta, Some(Decimal::new(21, 0)));
    }

    #[test]
    fn test_size_change_on_threshold_does_not_trigger() {
        let eval = evaluate_size(mb(120), mb(100), threshold());
        assert!(!eval.triggered);

        let eval = evaluate_size(mb(99), mb(100), threshold());
        assert!(!eval.triggered);
        assert_eq!(eval.direction, Direction::Decrease);
        assert_eq!(eval.percentage_delta, Some(Decimal::ONE));
    }

    #[test]
    fn test_size_large_decrease_triggers() {
        let eval = evaluate_size(mb(1), mb(100), threshold());
        assert!(eval.triggered);
        assert_eq!(eval.direction, Direction::Decrease);
        assert_eq!(eval.percentage_delta, Some(Decimal::new(99, 0)));
    }

    #[test]
    fn test_size_with_zero_reference() {
        let eval = evaluate_size(mb(0), mb(0), threshold());
        assert!(!eval.triggered);
        assert_eq!(eval.direction, Direction::Unchanged);

        let eval = evaluate_size(mb(5), mb(0), threshold());
        assert!(eval.triggered);
        assert_eq!(eval.percentage_delta, None);
    }

    #[test]
    fn test_storage_fill_above_high_water_mark() {
        let eval = evaluate_storage_fill(Decimal::new(80, 0), Decimal::new(70, 0));
        assert!(eval.triggered);
        assert_eq!(eval.direction, Direction::Increase);
        assert_eq!(eval.percentage_delta, Some(Decimal::new(14, 0)));
    }

    #[test]
    fn test_storage_fill_at_high_water_mark_is_fine() {
        let eval = evaluate_storage_fill(Decimal::new(70, 0), Decimal::new(70, 0));
        assert!(!eval.triggered);
        assert_eq!(eval.direction, Direction::Unchanged);

        let eval = evaluate_storage_fill(Decimal::new(10, 0), Decimal::ZERO);
        assert!(eval.triggered);
        assert_eq!(eval.percentage_delta, None);
    }

    #[test]
    fn test_creation_time_exact_and_small_deviation() {
        let tolerance = Duration::minutes(60);
        let eval = evaluate_creation_time(
            at("2000-01-02T03:00:00Z"),
            at("2000-01-01T03:00:00Z"),
            tolerance,
        );
        assert!(!eval.triggered);
        assert_eq!(eval.direction, Direction::Unchanged);

        let eval = evaluate_creation_time(
            at("2000-03-01T12:15:00Z"),
            at("2000-01-01T12:00:00Z"),
            tolerance,
        );
        assert!(!eval.triggered);
        assert_eq!(eval.deviation, Duration::minutes(15));
    }

    #[test]
    fn test_creation_time_exactly_on_tolerance_does_not_trigger() {
        let eval = evaluate_creation_time(
            at("2000-01-02T13:00:00Z"),
            at("2000-01-01T12:00:00Z"),
            Duration::minutes(60),
        );
        assert!(!eval.triggered);
        assert_eq!(eval.direction, Direction::Increase);
    }

    #[test]
    fn test_creation_time_unusual_time_triggers() {
        let eval = evaluate_creation_time(
            at("2000-01-04T18:00:00Z"),
            at("2000-01-04T12:00:00Z"),
            Duration::minutes(60),
        );
        assert!(eval.triggered);
        assert_eq!(eval.deviation, Duration::hours(6));
    }

    #[test]
    fn test_creation_time_wraps_around_midnight() {
        let eval = evaluate_creation_time(
            at("2000-01-01T23:30:00Z"),
            at("2000-01-01T00:00:00Z"),
            Duration::minutes(60),
        );
        assert!(!eval.triggered);
        assert_eq!(eval.direction, Direction::Decrease);
        assert_eq!(eval.deviation, Duration::minutes(30));

        let eval = evaluate_creation_time(
            at("2000-01-02T02:00:00Z"),
            at("2000-01-01T00:00:00Z"),
            Duration::minutes(60),
        );
        assert!(eval.triggered);
    }

    fn snapshot(name: &str, filled: Option<i64>, hwm: Option<i64>) -> DataStoreSnapshot {
        DataStoreSnapshot {
            name: DataStoreName::new(name),
            capacity: Some(Decimal::new(100, 0)),
            high_water_mark: hwm.map(|v| Decimal::new(v, 0)),
            filled: filled.map(|v| Decimal::new(v, 0)),
        }
    }

    #[test]
    fn test_storage_fill_facts_keeps_only_overfilled_complete_records() {
        let snapshots = vec![
            snapshot("A", Some(80), Some(70)),
            snapshot("B", Some(50), Some(70)),
            snapshot("C", None, Some(70)),
            snapshot("D", Some(90), None),
            snapshot("E", Some(95), Some(90)),
        ];

        let facts = storage_fill_facts(&snapshots, None);
        let names: Vec<&str> = facts.iter().map(|f| f.data_store_name.as_str()).collect();
        assert_eq!(names, vec!["A", "E"]);
        assert_eq!(facts[0].capacity, Decimal::new(100, 0));
    }

    #[test]
    fn test_storage_fill_facts_respects_limit() {
        let snapshots: Vec<_> = (0..5)
            .map(|i| snapshot(&format!("store-{}", i), Some(90), Some(60)))
            .collect();

        assert_eq!(storage_fill_facts(&snapshots, Some(3)).len(), 3);
        assert_eq!(storage_fill_facts(&snapshots, None).len(), 5);
        assert!(storage_fill_facts(&snapshots, Some(0)).is_empty());
    }
}
