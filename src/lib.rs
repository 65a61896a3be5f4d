// Pythrone - Breeding Records Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod data_quality;
pub mod db;
pub mod derived;
pub mod entities;
pub mod error;
pub mod follicle;
pub mod grouping;
pub mod hatch;
pub mod import;

// Re-export commonly used types
pub use config::{load_preferences, save_preferences, AppConfig, Preferences};
pub use data_quality::{BatchSummary, DataQualityEngine, QualityIssue, QualityReport, Severity};
pub use db::{
    get_all_animals, get_all_clutches, get_all_pairings, get_clutch_by_number,
    get_events_for_entity, get_weight_records, insert_animal, insert_clutch,
    insert_follicle_check, insert_weight_record, setup_database, Event,
};
pub use derived::{display_id, egg_detail, female_label, male_label, weight_delta};
pub use entities::{
    Animal, AnimalStatus, Clutch, FollicleCheck, NewAnimal, NewClutch, Pairing, PairingMale,
    PairingStatus, Sex, WeightRecord,
};
pub use error::RecordError;
pub use follicle::{latest_check, next_check_due, next_check_reminder, CheckReminder, RecheckCadence};
pub use grouping::{
    group_animals_by_status, group_pairings, partition_clutches, AnimalGroups, ClutchGroups,
    PairingGroups, StatusVisibility,
};
pub use hatch::{expected_hatch_date, hatch_countdown, Countdown, Urgency, INCUBATION_DAYS};
pub use import::{assign_breeder_ids, import_clutches, load_breeder_id_csv, load_clutch_csv};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
