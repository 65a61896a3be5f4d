// ✅ Data Quality Engine - consistency checks for breeding records
//
// Historic records legitimately break "obvious" rules (a clutch logged with
// its euthanized hatchling only in the remarks, a hatch count above the egg
// count), so nothing here rejects data. Every rule produces an issue that
// the front ends can show next to the record.

use crate::entities::{Animal, AnimalStatus, Clutch, Pairing};
use crate::hatch::expected_hatch_date;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Record contradicts an invariant of the model
    Warning,  // Record is questionable and worth a second look
    Info,     // Record is valid but incomplete
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub rule: String,
    pub severity: Severity,
    pub field: String,
    pub issue: String,
}

impl QualityIssue {
    fn new(rule: &str, severity: Severity, field: &str, issue: String) -> Self {
        QualityIssue {
            rule: rule.to_string(),
            severity,
            field: field.to_string(),
            issue,
        }
    }
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub entity_type: String,
    pub entity_id: String,

    /// Human label, e.g. the clutch number
    pub label: String,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.count(Severity::Critical) > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {}: {} issues ({} critical, {} warnings)",
            self.entity_type,
            self.label,
            self.issues.len(),
            self.count(Severity::Critical),
            self.count(Severity::Warning)
        )
    }
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine;

impl DataQualityEngine {
    pub fn new() -> Self {
        DataQualityEngine
    }

    pub fn check_clutch(&self, clutch: &Clutch) -> QualityReport {
        let mut issues = Vec::new();

        let counted = clutch.fertile_count.saturating_add(clutch.slug_count);
        if clutch.egg_count != counted {
            issues.push(QualityIssue::new(
                "egg_count_mismatch",
                Severity::Warning,
                "egg_count",
                format!(
                    "{} eggs recorded but fertile + slug = {}",
                    clutch.egg_count, counted
                ),
            ));
        }

        if clutch.hatch_count > clutch.egg_count {
            issues.push(QualityIssue::new(
                "hatch_exceeds_eggs",
                Severity::Warning,
                "hatch_count",
                format!(
                    "{} hatched from {} eggs",
                    clutch.hatch_count, clutch.egg_count
                ),
            ));
        }

        match clutch.lay_date {
            None => issues.push(QualityIssue::new(
                "lay_date_missing",
                Severity::Info,
                "lay_date",
                "No lay date, so no hatch countdown".to_string(),
            )),
            Some(lay) => {
                if let Some(hatched) = clutch.actual_hatch_date {
                    if hatched < lay {
                        issues.push(QualityIssue::new(
                            "hatched_before_laid",
                            Severity::Warning,
                            "actual_hatch_date",
                            format!("Hatched {hatched} before lay date {lay}"),
                        ));
                    }
                }

                let projected = expected_hatch_date(lay);
                if clutch.expected_hatch_date != Some(projected) {
                    issues.push(QualityIssue::new(
                        "expected_hatch_stale",
                        Severity::Info,
                        "expected_hatch_date",
                        format!("Expected hatch should be {projected}"),
                    ));
                }
            }
        }

        QualityReport {
            entity_type: "clutch".to_string(),
            entity_id: clutch.id.clone(),
            label: clutch.clutch_number.clone(),
            issues,
        }
    }

    /// Check a pairing against the animals it references.
    pub fn check_pairing(&self, pairing: &Pairing, animals: &[Animal]) -> QualityReport {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for male in &pairing.males {
            if !seen.insert(male.male_id.as_str()) {
                issues.push(QualityIssue::new(
                    "duplicate_male",
                    Severity::Critical,
                    "males",
                    format!("Male {} listed more than once", male.male_id),
                ));
            }
        }

        if pairing.males.is_empty() {
            issues.push(QualityIssue::new(
                "no_males",
                Severity::Info,
                "males",
                "No males added".to_string(),
            ));
        }

        let female = animals.iter().find(|a| a.id == pairing.female_id);
        let label = match female {
            Some(f) => crate::derived::female_label(f),
            None => pairing.female_id.clone(),
        };
        match female {
            None => issues.push(QualityIssue::new(
                "female_missing",
                Severity::Warning,
                "female_id",
                format!("Female {} is not in the collection", pairing.female_id),
            )),
            Some(f) if f.status != Some(AnimalStatus::FemaleBreeder) => {
                issues.push(QualityIssue::new(
                    "female_not_breeder",
                    Severity::Info,
                    "female_id",
                    format!("Female status is {}", f.effective_status().label()),
                ))
            }
            Some(_) => {}
        }

        QualityReport {
            entity_type: "pairing".to_string(),
            entity_id: pairing.id.clone(),
            label,
            issues,
        }
    }

    pub fn check_clutches(&self, clutches: &[Clutch]) -> Vec<QualityReport> {
        clutches.iter().map(|c| self.check_clutch(c)).collect()
    }

    pub fn batch_summary(&self, reports: &[QualityReport]) -> BatchSummary {
        BatchSummary {
            total_records: reports.len(),
            clean_count: reports.iter().filter(|r| r.is_clean()).count(),
            warning_count: reports.iter().map(|r| r.count(Severity::Warning)).sum(),
            critical_count: reports.iter().map(|r| r.count(Severity::Critical)).sum(),
        }
    }
}

impl Default for DataQualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// BATCH SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_records: usize,
    pub clean_count: usize,
    pub warning_count: usize,
    pub critical_count: usize,
}

impl BatchSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} records: {} clean | {} warnings, {} critical",
            self.total_records, self.clean_count, self.warning_count, self.critical_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PairingMale;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn consistent_clutch() -> Clutch {
        let mut c = Clutch::new("C6-23", Some(date(2023, 5, 5)));
        c.egg_count = 5;
        c.fertile_count = 5;
        c.actual_hatch_date = Some(date(2023, 7, 1));
        c.hatch_count = 2;
        c
    }

    #[test]
    fn test_consistent_clutch_is_clean() {
        let engine = DataQualityEngine::new();
        let report = engine.check_clutch(&consistent_clutch());
        assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn test_count_anomalies_are_warnings_not_errors() {
        let engine = DataQualityEngine::new();
        let mut clutch = consistent_clutch();
        clutch.egg_count = 4;
        clutch.hatch_count = 6;

        let report = engine.check_clutch(&clutch);
        let rules: Vec<&str> = report.issues.iter().map(|i| i.rule.as_str()).collect();
        assert_eq!(rules, vec!["egg_count_mismatch", "hatch_exceeds_eggs"]);
        assert!(!report.has_critical_issues());
    }

    #[test]
    fn test_huge_counts_report_mismatch() {
        let engine = DataQualityEngine::new();
        let mut clutch = consistent_clutch();
        clutch.fertile_count = u32::MAX;
        clutch.slug_count = 5;
        clutch.egg_count = 5;

        let report = engine.check_clutch(&clutch);
        assert!(report.issues.iter().any(|i| i.rule == "egg_count_mismatch"));
    }

    #[test]
    fn test_hatch_before_lay_and_stale_projection() {
        let engine = DataQualityEngine::new();
        let mut clutch = consistent_clutch();
        clutch.actual_hatch_date = Some(date(2023, 5, 1));
        clutch.expected_hatch_date = Some(date(2023, 6, 30));

        let report = engine.check_clutch(&clutch);
        assert!(report.issues.iter().any(|i| i.rule == "hatched_before_laid"));
        assert!(report.issues.iter().any(|i| i.rule == "expected_hatch_stale"));
    }

    #[test]
    fn test_missing_lay_date_is_info() {
        let engine = DataQualityEngine::new();
        let clutch = Clutch::new("C0", None);
        let report = engine.check_clutch(&clutch);
        assert_eq!(report.count(Severity::Info), 1);
        assert_eq!(report.issues[0].rule, "lay_date_missing");
    }

    #[test]
    fn test_pairing_checks() {
        let engine = DataQualityEngine::new();
        let mut female = Animal::new(1);
        female.name = Some("Penny".to_string());
        female.status = Some(AnimalStatus::FemaleHoldback);

        let mut pairing = Pairing::new(&female.id);
        pairing.males = vec![
            PairingMale::new(&pairing.id, "m1"),
            PairingMale::new(&pairing.id, "m1"),
        ];

        let report = engine.check_pairing(&pairing, &[female]);
        assert_eq!(report.label, "Penny");
        assert!(report.has_critical_issues());
        assert!(report.issues.iter().any(|i| i.rule == "female_not_breeder"));
    }

    #[test]
    fn test_pairing_with_unknown_female() {
        let engine = DataQualityEngine::new();
        let pairing = Pairing::new("ghost");
        let report = engine.check_pairing(&pairing, &[]);
        let rules: Vec<&str> = report.issues.iter().map(|i| i.rule.as_str()).collect();
        assert_eq!(rules, vec!["no_males", "female_missing"]);
    }

    #[test]
    fn test_batch_summary() {
        let engine = DataQualityEngine::new();
        let mut odd = consistent_clutch();
        odd.egg_count = 9;
        let reports = engine.check_clutches(&[consistent_clutch(), odd]);
        let summary = engine.batch_summary(&reports);
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.clean_count, 1);
        assert_eq!(summary.warning_count, 1);
        assert!(summary.summary().starts_with("2 records"));
    }
}
