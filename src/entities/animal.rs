// 🐍 Animal Entity - identity, status, weight history
//
// An animal's UUID is its identity; `animal_number` is the stable sequence
// number the store hands out at creation and is what the collection shows
// when no breeder ID has been assigned.

use crate::error::RecordError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SEX
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    Unknown,
}

impl Sex {
    /// Storage code (`M`/`F`); unknown sex is stored as NULL.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Sex::Male => Some("M"),
            Sex::Female => Some("F"),
            Sex::Unknown => None,
        }
    }

    pub fn from_code(code: Option<&str>) -> Result<Self, RecordError> {
        match code.map(str::trim) {
            None | Some("") => Ok(Sex::Unknown),
            Some("M") | Some("m") => Ok(Sex::Male),
            Some("F") | Some("f") => Ok(Sex::Female),
            Some(other) => Err(RecordError::UnknownSex(other.to_string())),
        }
    }

    /// Single character for cards: `M`, `F` or `?`.
    pub fn symbol(&self) -> &'static str {
        self.code().unwrap_or("?")
    }
}

// ============================================================================
// ANIMAL STATUS
// ============================================================================

/// Lifecycle status of an animal in the collection.
///
/// Transitions are free-form user edits; nothing here restricts which status
/// may follow which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimalStatus {
    #[serde(rename = "F_BREEDER")]
    FemaleBreeder,
    #[serde(rename = "M_BREEDER")]
    MaleBreeder,
    #[serde(rename = "F_HOLDBACK")]
    FemaleHoldback,
    #[serde(rename = "M_HOLDBACK")]
    MaleHoldback,
    #[serde(rename = "F_AVAILABLE")]
    FemaleAvailable,
    #[serde(rename = "M_AVAILABLE")]
    MaleAvailable,
    #[serde(rename = "ON_HOLD")]
    OnHold,
}

impl AnimalStatus {
    /// Display order of the collection buckets.
    pub const ALL: [AnimalStatus; 7] = [
        AnimalStatus::FemaleBreeder,
        AnimalStatus::MaleBreeder,
        AnimalStatus::FemaleHoldback,
        AnimalStatus::MaleHoldback,
        AnimalStatus::FemaleAvailable,
        AnimalStatus::MaleAvailable,
        AnimalStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalStatus::FemaleBreeder => "F_BREEDER",
            AnimalStatus::MaleBreeder => "M_BREEDER",
            AnimalStatus::FemaleHoldback => "F_HOLDBACK",
            AnimalStatus::MaleHoldback => "M_HOLDBACK",
            AnimalStatus::FemaleAvailable => "F_AVAILABLE",
            AnimalStatus::MaleAvailable => "M_AVAILABLE",
            AnimalStatus::OnHold => "ON_HOLD",
        }
    }

    /// Heading used for a collection bucket.
    pub fn heading(&self) -> &'static str {
        match self {
            AnimalStatus::FemaleBreeder => "Female Breeders",
            AnimalStatus::MaleBreeder => "Male Breeders",
            AnimalStatus::FemaleHoldback => "Female Holdbacks",
            AnimalStatus::MaleHoldback => "Male Holdbacks",
            AnimalStatus::FemaleAvailable => "Females Available",
            AnimalStatus::MaleAvailable => "Males Available",
            AnimalStatus::OnHold => "On Hold",
        }
    }

    /// Status code with underscores spaced out, e.g. `F BREEDER`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for AnimalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnimalStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        AnimalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == code)
            .ok_or_else(|| RecordError::UnknownStatus(s.to_string()))
    }
}

// ============================================================================
// ANIMAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    /// Stable identity (UUID)
    pub id: String,

    /// Sequence number assigned by the store at creation
    pub animal_number: i64,

    pub name: Option<String>,

    /// Identifier the breeder uses in their own records, e.g. `#21 C5-23-A`
    pub breeder_id: Option<String>,

    pub sex: Sex,
    pub morph: Option<String>,
    pub genetics: Option<String>,
    pub date_of_birth: Option<NaiveDate>,

    /// Current weight in grams (mirrors the newest weight record)
    pub weight_grams: Option<u32>,

    /// `None` is displayed as on-hold
    pub status: Option<AnimalStatus>,

    pub price: Option<f64>,
    pub notes: Option<String>,

    /// Clutch this animal hatched from, and its birth-order letter in it
    pub clutch_id: Option<String>,
    pub clutch_letter: Option<String>,
}

impl Animal {
    /// Create a blank animal with a fresh UUID.
    pub fn new(animal_number: i64) -> Self {
        Animal {
            id: uuid::Uuid::new_v4().to_string(),
            animal_number,
            name: None,
            breeder_id: None,
            sex: Sex::Unknown,
            morph: None,
            genetics: None,
            date_of_birth: None,
            weight_grams: None,
            status: None,
            price: None,
            notes: None,
            clutch_id: None,
            clutch_letter: None,
        }
    }

    /// Status bucket this animal is displayed under.
    pub fn effective_status(&self) -> AnimalStatus {
        self.status.unwrap_or(AnimalStatus::OnHold)
    }
}

/// Fields a caller supplies when adding an animal; the store assigns
/// `id` and `animal_number`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAnimal {
    pub name: Option<String>,
    pub breeder_id: Option<String>,
    pub sex: Sex,
    pub morph: Option<String>,
    pub genetics: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_grams: Option<u32>,
    pub status: Option<AnimalStatus>,
    pub price: Option<f64>,
    pub notes: Option<String>,
    pub clutch_id: Option<String>,
    pub clutch_letter: Option<String>,
}

// ============================================================================
// WEIGHT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub id: String,
    pub animal_id: String,
    pub weight_grams: u32,
    pub recorded_at: NaiveDate,
    pub notes: Option<String>,
}

impl WeightRecord {
    pub fn new(animal_id: &str, weight_grams: u32, recorded_at: NaiveDate) -> Self {
        WeightRecord {
            id: uuid::Uuid::new_v4().to_string(),
            animal_id: animal_id.to_string(),
            weight_grams,
            recorded_at,
            notes: None,
        }
    }
}
