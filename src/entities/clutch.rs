// 🥚 Clutch Entity - one batch of eggs from one lay
//
// A clutch is incubating while `actual_hatch_date` is empty and hatched once
// it is set. Egg counts are stored as entered: egg_count is not forced to
// equal fertile + slug, and hatch_count may exceed egg_count in historic data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clutch {
    pub id: String,

    /// Breeder's clutch identifier, e.g. `C14-25`
    pub clutch_number: String,

    pub pairing_id: Option<String>,
    pub lay_date: Option<NaiveDate>,

    pub egg_count: u32,
    pub fertile_count: u32,
    pub slug_count: u32,
    pub kink_count: u32,

    /// lay_date + incubation period, absent when lay_date is absent
    pub expected_hatch_date: Option<NaiveDate>,
    pub actual_hatch_date: Option<NaiveDate>,
    pub hatch_count: u32,

    pub remarks: Option<String>,
}

impl Clutch {
    /// Create a clutch from its lay date; the expected hatch date is derived.
    pub fn new(clutch_number: &str, lay_date: Option<NaiveDate>) -> Self {
        Clutch {
            id: uuid::Uuid::new_v4().to_string(),
            clutch_number: clutch_number.to_string(),
            pairing_id: None,
            lay_date,
            egg_count: 0,
            fertile_count: 0,
            slug_count: 0,
            kink_count: 0,
            expected_hatch_date: lay_date.map(crate::hatch::expected_hatch_date),
            actual_hatch_date: None,
            hatch_count: 0,
            remarks: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.actual_hatch_date.is_none()
    }

    pub fn is_hatched(&self) -> bool {
        self.actual_hatch_date.is_some()
    }
}

/// Fields a caller supplies when adding or editing a clutch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClutch {
    pub clutch_number: String,
    pub pairing_id: Option<String>,
    pub lay_date: Option<NaiveDate>,
    pub egg_count: u32,
    pub fertile_count: u32,
    pub slug_count: u32,
    pub kink_count: u32,
    pub actual_hatch_date: Option<NaiveDate>,
    pub hatch_count: u32,
    pub remarks: Option<String>,
}

impl NewClutch {
    pub fn expected_hatch_date(&self) -> Option<NaiveDate> {
        self.lay_date.map(crate::hatch::expected_hatch_date)
    }
}
