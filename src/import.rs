// 📥 Import - bulk loading of historic clutches and breeder IDs
//
// Both imports read a CSV with headers. Dates are `YYYY-MM-DD`; an empty
// cell means the value is absent.

use crate::db::{get_all_animals, insert_clutch, set_breeder_id};
use crate::entities::{Animal, NewClutch};
use crate::error::parse_optional_date;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Animals whose weight differs from the mapping by this much or more are
/// not considered the same animal.
pub const WEIGHT_MATCH_TOLERANCE_GRAMS: u32 = 20;

// ============================================================================
// CLUTCH CSV
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClutchRow {
    pub clutch_number: String,
    pub lay_date: Option<String>,
    #[serde(default)]
    pub fertile_count: Option<u32>,
    #[serde(default)]
    pub slug_count: Option<u32>,
    #[serde(default)]
    pub kink_count: Option<u32>,
    pub actual_hatch_date: Option<String>,
    #[serde(default)]
    pub hatch_count: Option<u32>,
    pub remarks: Option<String>,
}

impl ClutchRow {
    /// Typed clutch for this row. Egg count is fertile plus slugs.
    pub fn to_new_clutch(&self) -> Result<NewClutch> {
        let fertile_count = self.fertile_count.unwrap_or(0);
        let slug_count = self.slug_count.unwrap_or(0);
        let egg_count = fertile_count.checked_add(slug_count).ok_or_else(|| {
            anyhow::anyhow!("egg count overflows: {fertile_count} fertile + {slug_count} slug")
        })?;

        Ok(NewClutch {
            clutch_number: self.clutch_number.trim().to_string(),
            pairing_id: None,
            lay_date: parse_optional_date("lay_date", self.lay_date.as_deref())?,
            egg_count,
            fertile_count,
            slug_count,
            kink_count: self.kink_count.unwrap_or(0),
            actual_hatch_date: parse_optional_date(
                "actual_hatch_date",
                self.actual_hatch_date.as_deref(),
            )?,
            hatch_count: self.hatch_count.unwrap_or(0),
            remarks: self.remarks.clone().filter(|r| !r.trim().is_empty()),
        })
    }
}

/// Read and validate every row; the first bad row fails the whole file.
pub fn load_clutch_csv(csv_path: &Path) -> Result<Vec<NewClutch>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open clutch CSV {}", csv_path.display()))?;

    let mut clutches = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let row: ClutchRow = result.with_context(|| format!("Failed to read clutch row {}", i + 1))?;
        let clutch = row
            .to_new_clutch()
            .with_context(|| format!("Invalid clutch row {} ({})", i + 1, row.clutch_number))?;
        clutches.push(clutch);
    }

    Ok(clutches)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClutchImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Insert clutches, skipping any already stored with the same number and
/// lay date. Safe to run repeatedly.
pub fn import_clutches(conn: &Connection, clutches: &[NewClutch]) -> Result<ClutchImportSummary> {
    let mut summary = ClutchImportSummary::default();

    for clutch in clutches {
        match insert_clutch(conn, clutch)? {
            Some(_) => summary.inserted += 1,
            None => summary.duplicates += 1,
        }
    }

    info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        "clutch import finished"
    );
    Ok(summary)
}

// ============================================================================
// BREEDER ID CSV
// ============================================================================

/// One line of a breeder-ID sheet. Unnamed animals are identified by morph
/// and, when known, weight.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BreederIdMapping {
    pub name: Option<String>,
    pub morph: Option<String>,
    pub breeder_id: String,
    #[serde(default)]
    pub weight: Option<u32>,
}

impl BreederIdMapping {
    fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Does this mapping describe `animal`?
    pub fn matches(&self, animal: &Animal) -> bool {
        let animal_name = animal
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match (self.name(), animal_name) {
            (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
            (None, None) => {
                let same_morph = match (self.morph.as_deref(), animal.morph.as_deref()) {
                    (Some(a), Some(b)) => a.trim() == b.trim(),
                    _ => false,
                };
                let close_weight = match (self.weight, animal.weight_grams) {
                    (Some(a), Some(b)) => a.abs_diff(b) < WEIGHT_MATCH_TOLERANCE_GRAMS,
                    _ => true,
                };
                same_morph && close_weight
            }
            _ => false,
        }
    }
}

pub fn load_breeder_id_csv(csv_path: &Path) -> Result<Vec<BreederIdMapping>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open breeder ID CSV {}", csv_path.display()))?;

    let mappings = rdr
        .deserialize()
        .collect::<Result<Vec<BreederIdMapping>, _>>()
        .context("Failed to read breeder ID rows")?;
    Ok(mappings)
}

/// First mapping that describes the animal, if any.
pub fn match_breeder_id<'a>(
    animal: &Animal,
    mappings: &'a [BreederIdMapping],
) -> Option<&'a BreederIdMapping> {
    mappings.iter().find(|mapping| mapping.matches(animal))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BreederIdReport {
    pub updated: usize,

    /// Animals without a breeder ID that no mapping described
    pub unmatched: Vec<Animal>,
}

/// Give each animal that has no breeder ID the ID of its matching mapping.
/// Animals that already carry an ID are never touched.
pub fn assign_breeder_ids(conn: &Connection, mappings: &[BreederIdMapping]) -> Result<BreederIdReport> {
    let mut report = BreederIdReport::default();

    for animal in get_all_animals(conn)? {
        if animal.breeder_id.as_deref().is_some_and(|id| !id.is_empty()) {
            continue;
        }

        match match_breeder_id(&animal, mappings) {
            Some(mapping) => {
                set_breeder_id(conn, &animal.id, &mapping.breeder_id)?;
                report.updated += 1;
            }
            None => {
                warn!(
                    animal_number = animal.animal_number,
                    name = ?animal.name,
                    morph = ?animal.morph,
                    "no breeder ID mapping"
                );
                report.unmatched.push(animal);
            }
        }
    }

    info!(
        updated = report.updated,
        unmatched = report.unmatched.len(),
        "breeder ID assignment finished"
    );
    Ok(report)
}
