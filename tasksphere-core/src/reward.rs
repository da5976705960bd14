//! Reward calculator: task attributes -> integer point award.
//!
//! Deterministic and pure. The constants are policy: the accumulator's
//! idempotence tests depend on exact integers, so changing them is a breaking
//! change for stored profiles.

use crate::task::{Priority, Task};

/// Points per estimated hour, by priority.
pub fn multiplier(priority: Priority) -> u32 {
    match priority {
        Priority::Low => 5,
        Priority::Medium => 10,
        Priority::High => 15,
    }
}

/// Flat award when a task carries no estimate (a nominal two-hour task).
pub fn flat_award(priority: Priority) -> u32 {
    match priority {
        Priority::Low => 10,
        Priority::Medium => 20,
        Priority::High => 30,
    }
}

/// Compute the point award for completing `task`.
///
/// `round(estimated_hours * multiplier)` when an estimate is present;
/// otherwise the flat per-priority award. Non-positive estimates are treated
/// as absent so a malformed document can never produce a negative award.
pub fn points_for(task: &Task) -> u32 {
    match task.estimated_hours {
        Some(h) if h > 0.0 => (h * f64::from(multiplier(task.priority))).round() as u32,
        _ => flat_award(task.priority),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use chrono::{TimeZone, Utc};

    fn task(priority: Priority, hours: Option<f64>) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let t = Task::new("t1", "any", "u1", now).with_priority(priority);
        match hours {
            Some(h) => t.with_estimated_hours(h),
            None => t,
        }
    }

    #[test]
    fn eight_high_priority_hours_award_120() {
        assert_eq!(points_for(&task(Priority::High, Some(8.0))), 120);
    }

    #[test]
    fn estimates_scale_by_priority_multiplier() {
        assert_eq!(points_for(&task(Priority::Low, Some(4.0))), 20);
        assert_eq!(points_for(&task(Priority::Medium, Some(4.0))), 40);
        assert_eq!(points_for(&task(Priority::High, Some(4.0))), 60);
        // Fractional estimates round to the nearest integer.
        assert_eq!(points_for(&task(Priority::Medium, Some(2.55))), 26);
    }

    #[test]
    fn missing_estimate_falls_back_to_flat_award() {
        assert_eq!(points_for(&task(Priority::Low, None)), 10);
        assert_eq!(points_for(&task(Priority::Medium, None)), 20);
        assert_eq!(points_for(&task(Priority::High, None)), 30);
    }

    #[test]
    fn non_positive_estimate_is_treated_as_absent() {
        assert_eq!(points_for(&task(Priority::High, Some(0.0))), 30);
        assert_eq!(points_for(&task(Priority::High, Some(-3.0))), 30);
    }

    #[test]
    fn award_is_deterministic_per_snapshot() {
        let t = task(Priority::Medium, Some(7.25));
        assert_eq!(points_for(&t), points_for(&t));
    }
}
