// 🧮 Derived Fields - display strings and weight trends
//
// Small pure helpers the front ends use to render cards: egg summaries,
// identifiers, labels and weight changes.

use crate::entities::{Animal, Clutch, WeightRecord};
use serde::Serialize;
use std::cmp::Reverse;

// ============================================================================
// CLUTCH
// ============================================================================

/// `(5 fertile, 1 slug, 1 kinked)`, leaving out zero counts. Empty when all
/// three counts are zero.
pub fn egg_detail(clutch: &Clutch) -> String {
    let parts: Vec<String> = [
        (clutch.fertile_count, "fertile"),
        (clutch.slug_count, "slug"),
        (clutch.kink_count, "kinked"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count} {label}"))
    .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("({})", parts.join(", "))
    }
}

// ============================================================================
// ANIMAL IDENTIFIERS
// ============================================================================

/// Breeder ID when assigned, otherwise `#<animal_number>`.
pub fn display_id(animal: &Animal) -> String {
    match animal.breeder_id.as_deref() {
        Some(breeder_id) if !breeder_id.is_empty() => breeder_id.to_string(),
        _ => format!("#{}", animal.animal_number),
    }
}

/// `Name (BreederID)` when both exist, else whichever exists, else `Unknown`.
pub fn full_label(name: Option<&str>, breeder_id: Option<&str>) -> String {
    let name = name.filter(|s| !s.is_empty());
    let breeder_id = breeder_id.filter(|s| !s.is_empty());
    match (name, breeder_id) {
        (Some(name), Some(id)) => format!("{name} ({id})"),
        (Some(name), None) => name.to_string(),
        (None, Some(id)) => id.to_string(),
        (None, None) => "Unknown".to_string(),
    }
}

/// Name, else breeder ID, else `Unknown`.
pub fn short_label(name: Option<&str>, breeder_id: Option<&str>) -> String {
    name.filter(|s| !s.is_empty())
        .or(breeder_id.filter(|s| !s.is_empty()))
        .unwrap_or("Unknown")
        .to_string()
}

pub fn female_label(female: &Animal) -> String {
    full_label(female.name.as_deref(), female.breeder_id.as_deref())
}

pub fn male_label(male: &Animal) -> String {
    short_label(male.name.as_deref(), male.breeder_id.as_deref())
}

pub fn lock_summary(lock_count: u32) -> String {
    if lock_count == 1 {
        "1 lock".to_string()
    } else {
        format!("{lock_count} locks")
    }
}

// ============================================================================
// WEIGHT TREND
// ============================================================================

/// Records newest first. Stable, so same-day records keep input order.
fn newest_first(records: &[WeightRecord]) -> Vec<&WeightRecord> {
    let mut sorted: Vec<&WeightRecord> = records.iter().collect();
    sorted.sort_by_key(|record| Reverse(record.recorded_at));
    sorted
}

/// Newest weight minus the one before it; `None` with fewer than two records.
pub fn weight_delta(records: &[WeightRecord]) -> Option<i64> {
    match newest_first(records).as_slice() {
        [latest, previous, ..] => {
            Some(i64::from(latest.weight_grams) - i64::from(previous.weight_grams))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightEntry<'a> {
    pub record: &'a WeightRecord,

    /// Change against the next-older record; `None` for the oldest
    pub change: Option<i64>,
}

/// Weight log newest first, each entry annotated with its change.
pub fn weight_history(records: &[WeightRecord]) -> Vec<WeightEntry<'_>> {
    let sorted = newest_first(records);
    sorted
        .iter()
        .copied()
        .enumerate()
        .map(|(i, record)| WeightEntry {
            record,
            change: sorted
                .get(i + 1)
                .map(|older| i64::from(record.weight_grams) - i64::from(older.weight_grams)),
        })
        .collect()
}

/// Chronological `(date, grams)` points, oldest first, for charting.
pub fn weight_series(records: &[WeightRecord]) -> Vec<(chrono::NaiveDate, u32)> {
    let mut points: Vec<_> = records
        .iter()
        .map(|r| (r.recorded_at, r.weight_grams))
        .collect();
    points.sort_by_key(|(date, _)| *date);
    points
}

/// `+200g` / `-35g` / `0g`.
pub fn format_change(change: i64) -> String {
    if change > 0 {
        format!("+{change}g")
    } else {
        format!("{change}g")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clutch(fertile: u32, slug: u32, kink: u32) -> Clutch {
        let mut c = Clutch::new("C1-25", None);
        c.fertile_count = fertile;
        c.slug_count = slug;
        c.kink_count = kink;
        c
    }

    #[test]
    fn test_egg_detail() {
        assert_eq!(egg_detail(&clutch(5, 0, 0)), "(5 fertile)");
        assert_eq!(egg_detail(&clutch(0, 0, 0)), "");
        assert_eq!(egg_detail(&clutch(3, 2, 1)), "(3 fertile, 2 slug, 1 kinked)");
        assert_eq!(egg_detail(&clutch(0, 4, 0)), "(4 slug)");
    }

    #[test]
    fn test_display_id_prefers_breeder_id() {
        let mut animal = Animal::new(42);
        assert_eq!(display_id(&animal), "#42");

        animal.breeder_id = Some("#21 C5-23-A".to_string());
        assert_eq!(display_id(&animal), "#21 C5-23-A");
    }

    #[test]
    fn test_labels() {
        assert_eq!(full_label(Some("Penny"), Some("#9")), "Penny (#9)");
        assert_eq!(full_label(None, Some("#9")), "#9");
        assert_eq!(full_label(Some("Penny"), None), "Penny");
        assert_eq!(full_label(None, None), "Unknown");
        assert_eq!(short_label(Some("Kai"), Some("#4")), "Kai");
        assert_eq!(short_label(None, Some("#4")), "#4");
        assert_eq!(short_label(Some(""), None), "Unknown");
    }

    #[test]
    fn test_lock_summary() {
        assert_eq!(lock_summary(0), "0 locks");
        assert_eq!(lock_summary(1), "1 lock");
        assert_eq!(lock_summary(4), "4 locks");
    }

    #[test]
    fn test_weight_delta() {
        let records = vec![
            WeightRecord::new("a", 1800, date(2025, 1, 1)),
            WeightRecord::new("a", 2000, date(2025, 1, 10)),
        ];
        assert_eq!(weight_delta(&records), Some(200));
    }

    #[test]
    fn test_weight_delta_keeps_sign_and_ignores_input_order() {
        let records = vec![
            WeightRecord::new("a", 1950, date(2025, 3, 1)),
            WeightRecord::new("a", 2100, date(2025, 1, 1)),
            WeightRecord::new("a", 2000, date(2025, 2, 1)),
        ];
        assert_eq!(weight_delta(&records), Some(-50));
    }

    #[test]
    fn test_weight_delta_needs_two_records() {
        assert_eq!(weight_delta(&[]), None);
        assert_eq!(
            weight_delta(&[WeightRecord::new("a", 500, date(2025, 1, 1))]),
            None
        );
    }

    #[test]
    fn test_weight_history_changes() {
        let records = vec![
            WeightRecord::new("a", 1800, date(2025, 1, 1)),
            WeightRecord::new("a", 2000, date(2025, 1, 10)),
            WeightRecord::new("a", 1900, date(2025, 1, 20)),
        ];
        let history = weight_history(&records);
        let view: Vec<(u32, Option<i64>)> = history
            .iter()
            .map(|e| (e.record.weight_grams, e.change))
            .collect();
        assert_eq!(view, vec![(1900, Some(-100)), (2000, Some(200)), (1800, None)]);
    }

    #[test]
    fn test_weight_series_is_chronological() {
        let records = vec![
            WeightRecord::new("a", 2000, date(2025, 1, 10)),
            WeightRecord::new("a", 1800, date(2025, 1, 1)),
        ];
        assert_eq!(
            weight_series(&records),
            vec![(date(2025, 1, 1), 1800), (date(2025, 1, 10), 2000)]
        );
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(200), "+200g");
        assert_eq!(format_change(-35), "-35g");
        assert_eq!(format_change(0), "0g");
    }
}
