// 🗂️ Collection Grouping - partition and order snapshots for display
//
// Every function borrows its input and returns references into it; source
// records are never reordered or modified.

use crate::entities::{Animal, AnimalStatus, Clutch, Pairing, PairingStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeSet;

// ============================================================================
// STATUS VISIBILITY
// ============================================================================

/// Which status buckets the viewer has chosen to hide.
///
/// This is the viewer's preference, passed in explicitly; loading and saving
/// it is the front end's job (see `config::Preferences`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVisibility {
    hidden: BTreeSet<AnimalStatus>,
}

impl StatusVisibility {
    pub fn all_visible() -> Self {
        Self::default()
    }

    pub fn hiding<I: IntoIterator<Item = AnimalStatus>>(hidden: I) -> Self {
        StatusVisibility {
            hidden: hidden.into_iter().collect(),
        }
    }

    pub fn is_visible(&self, status: AnimalStatus) -> bool {
        !self.hidden.contains(&status)
    }

    pub fn hide(&mut self, status: AnimalStatus) {
        self.hidden.insert(status);
    }

    pub fn show(&mut self, status: AnimalStatus) {
        self.hidden.remove(&status);
    }

    /// Flip a status between hidden and visible.
    pub fn toggle(&mut self, status: AnimalStatus) {
        if !self.hidden.remove(&status) {
            self.hidden.insert(status);
        }
    }

    pub fn hidden(&self) -> impl Iterator<Item = AnimalStatus> + '_ {
        self.hidden.iter().copied()
    }
}

// ============================================================================
// ANIMALS BY STATUS
// ============================================================================

/// Sort heaviest first; animals without a weight go last. Stable, so ties
/// keep their input order.
pub fn sort_by_weight_desc(animals: &mut [&Animal]) {
    animals.sort_by_key(|animal| Reverse(animal.weight_grams));
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimalGroup<'a> {
    pub status: AnimalStatus,
    pub animals: Vec<&'a Animal>,
}

impl AnimalGroup<'_> {
    pub fn heading(&self) -> &'static str {
        self.status.heading()
    }
}

/// All seven status buckets in display order. Every input animal lands in
/// exactly one bucket; buckets may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalGroups<'a> {
    groups: Vec<AnimalGroup<'a>>,
}

impl<'a> AnimalGroups<'a> {
    pub fn get(&self, status: AnimalStatus) -> &[&'a Animal] {
        self.groups
            .iter()
            .find(|group| group.status == status)
            .map(|group| group.animals.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimalGroup<'a>> {
        self.groups.iter()
    }

    /// Non-empty buckets the viewer has not hidden.
    pub fn visible<'s>(
        &'s self,
        visibility: &'s StatusVisibility,
    ) -> impl Iterator<Item = &'s AnimalGroup<'a>> + 's {
        self.groups
            .iter()
            .filter(move |group| visibility.is_visible(group.status) && !group.animals.is_empty())
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.animals.len()).sum()
    }
}

pub fn group_animals_by_status(animals: &[Animal]) -> AnimalGroups<'_> {
    let groups = AnimalStatus::ALL
        .into_iter()
        .map(|status| {
            let mut members: Vec<&Animal> = animals
                .iter()
                .filter(|animal| animal.effective_status() == status)
                .collect();
            sort_by_weight_desc(&mut members);
            AnimalGroup {
                status,
                animals: members,
            }
        })
        .collect();

    AnimalGroups { groups }
}

/// Animals whose status bucket is visible, in input order.
pub fn visible_animals<'a>(animals: &'a [Animal], visibility: &StatusVisibility) -> Vec<&'a Animal> {
    animals
        .iter()
        .filter(|animal| visibility.is_visible(animal.effective_status()))
        .collect()
}

// ============================================================================
// BREEDER PICK LISTS
// ============================================================================

/// Female and male breeders, for choosing the animals of a pairing.
pub fn breeders(animals: &[Animal]) -> (Vec<&Animal>, Vec<&Animal>) {
    let females = animals
        .iter()
        .filter(|a| a.status == Some(AnimalStatus::FemaleBreeder))
        .collect();
    let males = animals
        .iter()
        .filter(|a| a.status == Some(AnimalStatus::MaleBreeder))
        .collect();
    (females, males)
}

/// Males that can still go into slot `slot` of a pairing form: every male not
/// already chosen in another slot.
pub fn available_males<'a>(
    males: &[&'a Animal],
    chosen: &[Option<&str>],
    slot: usize,
) -> Vec<&'a Animal> {
    let taken: Vec<&str> = chosen
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != slot)
        .filter_map(|(_, id)| *id)
        .collect();

    males
        .iter()
        .copied()
        .filter(|male| !taken.contains(&male.id.as_str()))
        .collect()
}

// ============================================================================
// CLUTCHES
// ============================================================================

/// Incubating and hatched clutches, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClutchGroups<'a> {
    pub active: Vec<&'a Clutch>,
    pub completed: Vec<&'a Clutch>,
}

pub fn partition_clutches(clutches: &[Clutch]) -> ClutchGroups<'_> {
    let (active, completed) = clutches.iter().partition(|clutch| clutch.is_active());
    ClutchGroups { active, completed }
}

// ============================================================================
// PAIRINGS
// ============================================================================

/// Pairings by lifecycle stage, each bucket in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairingGroups<'a> {
    pub active: Vec<&'a Pairing>,
    pub ovulated: Vec<&'a Pairing>,
    pub laid: Vec<&'a Pairing>,
    pub complete: Vec<&'a Pairing>,
}

impl<'a> PairingGroups<'a> {
    pub fn get(&self, status: PairingStatus) -> &[&'a Pairing] {
        match status {
            PairingStatus::Active => &self.active,
            PairingStatus::Ovulated => &self.ovulated,
            PairingStatus::Laid => &self.laid,
            PairingStatus::Complete => &self.complete,
        }
    }
}

pub fn group_pairings(pairings: &[Pairing]) -> PairingGroups<'_> {
    let mut groups = PairingGroups::default();
    for pairing in pairings {
        match pairing.status {
            PairingStatus::Active => groups.active.push(pairing),
            PairingStatus::Ovulated => groups.ovulated.push(pairing),
            PairingStatus::Laid => groups.laid.push(pairing),
            PairingStatus::Complete => groups.complete.push(pairing),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn animal(number: i64, status: Option<AnimalStatus>, weight: Option<u32>) -> Animal {
        let mut a = Animal::new(number);
        a.id = format!("animal-{number}");
        a.status = status;
        a.weight_grams = weight;
        a
    }

    #[test]
    fn test_weight_sort_puts_unweighed_last_and_is_stable() {
        let animals = vec![
            animal(1, None, None),
            animal(2, None, Some(500)),
            animal(3, None, Some(2000)),
            animal(4, None, None),
            animal(5, None, Some(1000)),
        ];
        let mut refs: Vec<&Animal> = animals.iter().collect();
        sort_by_weight_desc(&mut refs);

        let order: Vec<i64> = refs.iter().map(|a| a.animal_number).collect();
        assert_eq!(order, vec![3, 5, 2, 1, 4]);
    }

    #[test]
    fn test_equal_weights_keep_input_order() {
        let animals = vec![
            animal(1, None, Some(900)),
            animal(2, None, Some(1200)),
            animal(3, None, Some(900)),
        ];
        let mut refs: Vec<&Animal> = animals.iter().collect();
        sort_by_weight_desc(&mut refs);

        let order: Vec<i64> = refs.iter().map(|a| a.animal_number).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let animals = vec![
            animal(1, Some(AnimalStatus::FemaleBreeder), Some(1800)),
            animal(2, Some(AnimalStatus::MaleBreeder), Some(900)),
            animal(3, None, Some(80)),
            animal(4, Some(AnimalStatus::FemaleBreeder), Some(2100)),
            animal(5, Some(AnimalStatus::OnHold), None),
            animal(6, Some(AnimalStatus::MaleAvailable), Some(60)),
        ];
        let groups = group_animals_by_status(&animals);

        assert_eq!(groups.total(), animals.len());
        for a in &animals {
            let hits = groups
                .iter()
                .filter(|g| g.animals.iter().any(|m| m.id == a.id))
                .count();
            assert_eq!(hits, 1, "animal {} appears in {} buckets", a.animal_number, hits);
        }

        let on_hold: Vec<i64> = groups
            .get(AnimalStatus::OnHold)
            .iter()
            .map(|a| a.animal_number)
            .collect();
        assert_eq!(on_hold, vec![3, 5]);

        let females: Vec<i64> = groups
            .get(AnimalStatus::FemaleBreeder)
            .iter()
            .map(|a| a.animal_number)
            .collect();
        assert_eq!(females, vec![4, 1]);
    }

    #[test]
    fn test_buckets_follow_display_order() {
        let groups = group_animals_by_status(&[]);
        let statuses: Vec<AnimalStatus> = groups.iter().map(|g| g.status).collect();
        assert_eq!(statuses, AnimalStatus::ALL.to_vec());
    }

    #[test]
    fn test_visible_groups_skip_hidden_and_empty() {
        let animals = vec![
            animal(1, Some(AnimalStatus::FemaleBreeder), Some(1800)),
            animal(2, Some(AnimalStatus::MaleHoldback), Some(300)),
            animal(3, None, None),
        ];
        let groups = group_animals_by_status(&animals);
        let visibility = StatusVisibility::hiding([AnimalStatus::OnHold]);

        let shown: Vec<AnimalStatus> = groups.visible(&visibility).map(|g| g.status).collect();
        assert_eq!(
            shown,
            vec![AnimalStatus::FemaleBreeder, AnimalStatus::MaleHoldback]
        );

        let flat: Vec<i64> = visible_animals(&animals, &visibility)
            .iter()
            .map(|a| a.animal_number)
            .collect();
        assert_eq!(flat, vec![1, 2]);
    }

    #[test]
    fn test_visibility_toggle() {
        let mut v = StatusVisibility::all_visible();
        v.toggle(AnimalStatus::FemaleAvailable);
        assert!(!v.is_visible(AnimalStatus::FemaleAvailable));
        v.toggle(AnimalStatus::FemaleAvailable);
        assert!(v.is_visible(AnimalStatus::FemaleAvailable));

        v.hide(AnimalStatus::OnHold);
        assert_eq!(v.hidden().collect::<Vec<_>>(), vec![AnimalStatus::OnHold]);
        v.show(AnimalStatus::OnHold);
        assert_eq!(v.hidden().count(), 0);
    }

    #[test]
    fn test_breeders_and_available_males() {
        let animals = vec![
            animal(1, Some(AnimalStatus::FemaleBreeder), Some(1800)),
            animal(2, Some(AnimalStatus::MaleBreeder), Some(900)),
            animal(3, Some(AnimalStatus::MaleBreeder), Some(950)),
            animal(4, Some(AnimalStatus::MaleHoldback), Some(400)),
        ];
        let (females, males) = breeders(&animals);
        assert_eq!(females.len(), 1);
        assert_eq!(males.len(), 2);

        let chosen = [Some("animal-2"), None];
        let for_second: Vec<&str> = available_males(&males, &chosen, 1)
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(for_second, vec!["animal-3"]);

        // the slot's own choice stays selectable
        let for_first = available_males(&males, &chosen, 0);
        assert_eq!(for_first.len(), 2);
    }

    #[test]
    fn test_partition_clutches() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 1);
        let a = Clutch::new("C1", day);
        let mut b = Clutch::new("C2", day);
        b.actual_hatch_date = NaiveDate::from_ymd_opt(2025, 6, 27);
        let c = Clutch::new("C3", None);
        let clutches = vec![a, b, c];

        let groups = partition_clutches(&clutches);
        let active: Vec<&str> = groups.active.iter().map(|c| c.clutch_number.as_str()).collect();
        let done: Vec<&str> = groups.completed.iter().map(|c| c.clutch_number.as_str()).collect();
        assert_eq!(active, vec!["C1", "C3"]);
        assert_eq!(done, vec!["C2"]);
    }

    #[test]
    fn test_group_pairings_keeps_input_order() {
        let mut p1 = Pairing::new("f1");
        p1.status = PairingStatus::Laid;
        let p2 = Pairing::new("f2");
        let mut p3 = Pairing::new("f3");
        p3.status = PairingStatus::Laid;
        let mut p4 = Pairing::new("f4");
        p4.status = PairingStatus::Complete;
        let pairings = vec![p1, p2, p3, p4];

        let groups = group_pairings(&pairings);
        let laid: Vec<&str> = groups.laid.iter().map(|p| p.female_id.as_str()).collect();
        assert_eq!(laid, vec!["f1", "f3"]);
        assert_eq!(groups.get(PairingStatus::Active).len(), 1);
        assert!(groups.ovulated.is_empty());
        assert_eq!(groups.complete.len(), 1);
    }
}
