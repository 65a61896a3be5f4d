// ⏰ Hatch Engine - incubation projection and countdown urgency
//
// All arithmetic is on calendar dates (`NaiveDate`), never timestamps, so a
// countdown cannot drift by a day across timezones or DST changes.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days from lay to expected hatch for fertile eggs.
pub const INCUBATION_DAYS: i64 = 57;

/// Countdowns at or under this many days are urgent.
const RED_WITHIN_DAYS: i64 = 7;

/// Countdowns at or under this many days (and over the red threshold) are a warning.
const YELLOW_WITHIN_DAYS: i64 = 14;

/// Today's local calendar date. Every engine function takes `today` as a
/// parameter; front ends call this once and pass it down.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole calendar days from `today` until `target` (negative when past).
pub fn days_until(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days()
}

/// Expected hatch date for a clutch laid on `lay_date`.
pub fn expected_hatch_date(lay_date: NaiveDate) -> NaiveDate {
    lay_date + Duration::days(INCUBATION_DAYS)
}

// ============================================================================
// URGENCY
// ============================================================================

/// Display tier for a hatch countdown.
///
/// Tiers are compared by equality only; each maps to its own visual treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Complete,
    Green,
    Yellow,
    Red,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Complete => "complete",
            Urgency::Green => "green",
            Urgency::Yellow => "yellow",
            Urgency::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub text: String,
    pub urgency: Urgency,
}

impl Countdown {
    fn new(text: impl Into<String>, urgency: Urgency) -> Self {
        Countdown {
            text: text.into(),
            urgency,
        }
    }
}

/// Classify a clutch's hatch countdown.
///
/// A recorded hatch wins over everything else, including a missing or past
/// expected date.
pub fn hatch_countdown(
    expected: Option<NaiveDate>,
    actual: Option<NaiveDate>,
    today: NaiveDate,
) -> Countdown {
    if actual.is_some() {
        return Countdown::new("Hatched!", Urgency::Complete);
    }

    let Some(expected) = expected else {
        return Countdown::new("No hatch date", Urgency::Green);
    };

    let days = days_until(expected, today);
    match days {
        d if d < 0 => Countdown::new(format!("{} days overdue", d.abs()), Urgency::Red),
        0 => Countdown::new("Due today!", Urgency::Red),
        1 => Countdown::new("1 day to hatch", Urgency::Red),
        d if d <= RED_WITHIN_DAYS => Countdown::new(format!("{d} days to hatch"), Urgency::Red),
        d if d <= YELLOW_WITHIN_DAYS => {
            Countdown::new(format!("{d} days to hatch"), Urgency::Yellow)
        }
        d => Countdown::new(format!("{d} days to hatch"), Urgency::Green),
    }
}

impl crate::entities::Clutch {
    pub fn countdown(&self, today: NaiveDate) -> Countdown {
        hatch_countdown(self.expected_hatch_date, self.actual_hatch_date, today)
    }
}
