// 🔬 Follicle Engine - recheck cadence and reminder urgency
//
// The cadence tightens as follicles grow: monthly while small, every two
// weeks through the 20–30mm window, weekly once past 30mm.

use crate::entities::FollicleCheck;
use crate::hatch::days_until;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const BIWEEKLY_FROM_MM: u32 = 20;
const WEEKLY_ABOVE_MM: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecheckCadence {
    Monthly,
    Biweekly,
    Weekly,
}

impl RecheckCadence {
    pub fn for_size(size_mm: u32) -> Self {
        if size_mm < BIWEEKLY_FROM_MM {
            RecheckCadence::Monthly
        } else if size_mm <= WEEKLY_ABOVE_MM {
            RecheckCadence::Biweekly
        } else {
            RecheckCadence::Weekly
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            RecheckCadence::Monthly => 30,
            RecheckCadence::Biweekly => 14,
            RecheckCadence::Weekly => 7,
        }
    }
}

/// Date the next follicle check is due after observing `size_mm` on `observed_on`.
pub fn next_check_due(size_mm: u32, observed_on: NaiveDate) -> NaiveDate {
    observed_on + Duration::days(RecheckCadence::for_size(size_mm).days())
}

// ============================================================================
// LATEST CHECK
// ============================================================================

/// The most recent check by `checked_at`.
///
/// When several checks share the latest date, the one appearing last in
/// `checks` wins, so the result never depends on anything but input order.
pub fn latest_check(checks: &[FollicleCheck]) -> Option<&FollicleCheck> {
    checks.iter().max_by_key(|check| check.checked_at)
}

/// `next_check_due` of the latest check, if it has one.
pub fn pairing_next_check_due(checks: &[FollicleCheck]) -> Option<NaiveDate> {
    latest_check(checks).and_then(|check| check.next_check_due)
}

// ============================================================================
// REMINDER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReminder {
    pub text: String,
    pub urgent: bool,
}

/// Classify a next-check-due date: overdue, today and tomorrow are urgent,
/// anything later just shows its date.
pub fn next_check_reminder(due: Option<NaiveDate>, today: NaiveDate) -> CheckReminder {
    let Some(due) = due else {
        return CheckReminder {
            text: "Not scheduled".to_string(),
            urgent: false,
        };
    };

    let (text, urgent) = match days_until(due, today) {
        d if d < 0 => (format!("{}d overdue", d.abs()), true),
        0 => ("Due today".to_string(), true),
        1 => ("Tomorrow".to_string(), true),
        _ => (short_date(due), false),
    };
    CheckReminder { text, urgent }
}

/// `Jun 10` style date used on cards.
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn check(id: &str, checked_at: NaiveDate, size: u32) -> FollicleCheck {
        let mut c = FollicleCheck::new("pairing-1", checked_at, Some(size));
        c.id = id.to_string();
        c
    }

    #[test]
    fn test_cadence_boundaries() {
        let day = date(2025, 3, 1);
        assert_eq!(next_check_due(15, day), date(2025, 3, 31));
        assert_eq!(next_check_due(19, day), date(2025, 3, 31));
        assert_eq!(next_check_due(20, day), date(2025, 3, 15));
        assert_eq!(next_check_due(30, day), date(2025, 3, 15));
        assert_eq!(next_check_due(31, day), date(2025, 3, 8));
    }

    #[test]
    fn test_cadence_for_size() {
        assert_eq!(RecheckCadence::for_size(0), RecheckCadence::Monthly);
        assert_eq!(RecheckCadence::for_size(25), RecheckCadence::Biweekly);
        assert_eq!(RecheckCadence::for_size(45), RecheckCadence::Weekly);
    }

    #[test]
    fn test_latest_check_picks_max_date() {
        let checks = vec![
            check("a", date(2025, 1, 5), 12),
            check("b", date(2025, 2, 9), 22),
            check("c", date(2025, 1, 20), 18),
        ];
        assert_eq!(latest_check(&checks).unwrap().id, "b");
        assert_eq!(pairing_next_check_due(&checks), Some(date(2025, 2, 23)));
    }

    #[test]
    fn test_latest_check_tie_goes_to_last_in_input() {
        let checks = vec![
            check("first", date(2025, 2, 9), 22),
            check("older", date(2025, 1, 1), 10),
            check("second", date(2025, 2, 9), 33),
        ];
        assert_eq!(latest_check(&checks).unwrap().id, "second");
        assert_eq!(pairing_next_check_due(&checks), Some(date(2025, 2, 16)));
    }

    #[test]
    fn test_no_checks() {
        assert!(latest_check(&[]).is_none());
        assert_eq!(pairing_next_check_due(&[]), None);
    }

    #[test]
    fn test_latest_check_without_size_has_no_due_date() {
        let mut no_size = FollicleCheck::new("pairing-1", date(2025, 3, 1), None);
        no_size.id = "no-size".to_string();
        let checks = vec![check("sized", date(2025, 2, 1), 25), no_size];
        assert_eq!(pairing_next_check_due(&checks), None);
    }

    #[test]
    fn test_reminder_tiers() {
        let today = date(2025, 6, 1);

        let overdue = next_check_reminder(Some(date(2025, 5, 29)), today);
        assert_eq!(overdue.text, "3d overdue");
        assert!(overdue.urgent);

        let due = next_check_reminder(Some(today), today);
        assert_eq!(due.text, "Due today");
        assert!(due.urgent);

        let tomorrow = next_check_reminder(Some(date(2025, 6, 2)), today);
        assert_eq!(tomorrow.text, "Tomorrow");
        assert!(tomorrow.urgent);

        let later = next_check_reminder(Some(date(2025, 6, 10)), today);
        assert_eq!(later.text, "Jun 10");
        assert!(!later.urgent);
    }

    #[test]
    fn test_reminder_not_scheduled() {
        let r = next_check_reminder(None, date(2025, 6, 1));
        assert_eq!(r.text, "Not scheduled");
        assert!(!r.urgent);
    }
}
