// 💞 Pairing Entity - one female, her males, and her follicle checks
//
// A pairing snapshot carries its male associations and follicle checks so the
// engine can classify it without another round-trip to the store.

use crate::error::RecordError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PAIRING STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PairingStatus {
    Active,
    Ovulated,
    Laid,
    Complete,
}

impl PairingStatus {
    pub const ALL: [PairingStatus; 4] = [
        PairingStatus::Active,
        PairingStatus::Ovulated,
        PairingStatus::Laid,
        PairingStatus::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PairingStatus::Active => "ACTIVE",
            PairingStatus::Ovulated => "OVULATED",
            PairingStatus::Laid => "LAID",
            PairingStatus::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PairingStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        PairingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == code)
            .ok_or_else(|| RecordError::UnknownPairingStatus(s.to_string()))
    }
}

// ============================================================================
// PAIRING MALE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingMale {
    pub id: String,
    pub pairing_id: String,
    pub male_id: String,

    /// Number of locks observed between this male and the female
    pub lock_count: u32,
    pub last_lock_date: Option<NaiveDate>,
}

impl PairingMale {
    pub fn new(pairing_id: &str, male_id: &str) -> Self {
        PairingMale {
            id: uuid::Uuid::new_v4().to_string(),
            pairing_id: pairing_id.to_string(),
            male_id: male_id.to_string(),
            lock_count: 0,
            last_lock_date: None,
        }
    }
}

// ============================================================================
// FOLLICLE CHECK
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollicleCheck {
    pub id: String,
    pub pairing_id: String,
    pub checked_at: NaiveDate,
    pub follicle_size_mm: Option<u32>,

    /// Computed from size and check date when the check is recorded
    pub next_check_due: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl FollicleCheck {
    pub fn new(pairing_id: &str, checked_at: NaiveDate, follicle_size_mm: Option<u32>) -> Self {
        FollicleCheck {
            id: uuid::Uuid::new_v4().to_string(),
            pairing_id: pairing_id.to_string(),
            checked_at,
            follicle_size_mm,
            next_check_due: follicle_size_mm
                .map(|size| crate::follicle::next_check_due(size, checked_at)),
            notes: None,
        }
    }
}

// ============================================================================
// PAIRING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub id: String,
    pub female_id: String,
    pub status: PairingStatus,
    pub pairing_start: Option<NaiveDate>,
    pub ovulation_date: Option<NaiveDate>,
    pub pre_lay_shed_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,

    pub males: Vec<PairingMale>,
    pub follicle_checks: Vec<FollicleCheck>,
}

impl Pairing {
    pub fn new(female_id: &str) -> Self {
        Pairing {
            id: uuid::Uuid::new_v4().to_string(),
            female_id: female_id.to_string(),
            status: PairingStatus::Active,
            pairing_start: None,
            ovulation_date: None,
            pre_lay_shed_date: None,
            notes: None,
            created_at: Utc::now(),
            males: Vec::new(),
            follicle_checks: Vec::new(),
        }
    }

    pub fn has_male(&self, male_id: &str) -> bool {
        self.males.iter().any(|m| m.male_id == male_id)
    }

    pub fn total_locks(&self) -> u32 {
        self.males.iter().map(|m| m.lock_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_status_parse() {
        assert_eq!("laid".parse::<PairingStatus>().unwrap(), PairingStatus::Laid);
        assert_eq!(
            "DONE".parse::<PairingStatus>().unwrap_err(),
            RecordError::UnknownPairingStatus("DONE".to_string())
        );
    }

    #[test]
    fn test_pairing_status_serde() {
        let json = serde_json::to_string(&PairingStatus::Ovulated).unwrap();
        assert_eq!(json, "\"OVULATED\"");
    }

    #[test]
    fn test_new_pairing_starts_active() {
        let pairing = Pairing::new("female-1");
        assert_eq!(pairing.status, PairingStatus::Active);
        assert!(pairing.males.is_empty());
        assert_eq!(pairing.total_locks(), 0);
    }

    #[test]
    fn test_total_locks_and_has_male() {
        let mut pairing = Pairing::new("female-1");
        let mut a = PairingMale::new(&pairing.id, "male-a");
        a.lock_count = 3;
        let mut b = PairingMale::new(&pairing.id, "male-b");
        b.lock_count = 1;
        pairing.males = vec![a, b];

        assert_eq!(pairing.total_locks(), 4);
        assert!(pairing.has_male("male-b"));
        assert!(!pairing.has_male("male-c"));
    }

    #[test]
    fn test_follicle_check_computes_next_due() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let check = FollicleCheck::new("p", day, Some(25));
        assert_eq!(check.next_check_due, NaiveDate::from_ymd_opt(2025, 3, 15));

        let no_size = FollicleCheck::new("p", day, None);
        assert_eq!(no_size.next_check_due, None);
    }
}
