// 🗄️ Store - SQLite persistence for the breeding records
//
// Values are parsed into typed records here, once. A malformed date or an
// unknown status code in a row is an error, never a silent default.

use crate::entities::{
    Animal, AnimalStatus, Clutch, FollicleCheck, NewAnimal, NewClutch, Pairing, PairingMale,
    PairingStatus, Sex, WeightRecord,
};
use crate::error::{parse_date, parse_optional_date, RecordError};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

const ACTOR: &str = "pythrone";

// ============================================================================
// EVENTS (audit trail)
// ============================================================================

/// One change to one record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS animals (
            animal_number INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT UNIQUE NOT NULL,
            name TEXT,
            breeder_id TEXT,
            sex TEXT,
            morph TEXT,
            genetics TEXT,
            date_of_birth TEXT,
            weight_grams INTEGER,
            status TEXT,
            price REAL,
            notes TEXT,
            clutch_id TEXT,
            clutch_letter TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS weight_records (
            id TEXT PRIMARY KEY,
            animal_id TEXT NOT NULL,
            weight_grams INTEGER NOT NULL,
            recorded_at TEXT NOT NULL,
            notes TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS pairings (
            id TEXT PRIMARY KEY,
            female_id TEXT NOT NULL,
            status TEXT NOT NULL,
            pairing_start TEXT,
            ovulation_date TEXT,
            pre_lay_shed_date TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pairing_males (
            id TEXT PRIMARY KEY,
            pairing_id TEXT NOT NULL,
            male_id TEXT NOT NULL,
            lock_count INTEGER NOT NULL DEFAULT 0,
            last_lock_date TEXT,
            UNIQUE (pairing_id, male_id)
        );

        CREATE TABLE IF NOT EXISTS follicle_checks (
            id TEXT PRIMARY KEY,
            pairing_id TEXT NOT NULL,
            checked_at TEXT NOT NULL,
            follicle_size_mm INTEGER,
            next_check_due TEXT,
            notes TEXT
        );

        CREATE TABLE IF NOT EXISTS clutches (
            id TEXT PRIMARY KEY,
            idempotency_hash TEXT UNIQUE NOT NULL,
            clutch_number TEXT NOT NULL,
            pairing_id TEXT,
            lay_date TEXT,
            egg_count INTEGER NOT NULL DEFAULT 0,
            fertile_count INTEGER NOT NULL DEFAULT 0,
            slug_count INTEGER NOT NULL DEFAULT 0,
            kink_count INTEGER NOT NULL DEFAULT 0,
            expected_hatch_date TEXT,
            actual_hatch_date TEXT,
            hatch_count INTEGER NOT NULL DEFAULT 0,
            remarks TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_weight_animal ON weight_records(animal_id);
        CREATE INDEX IF NOT EXISTS idx_pairing_males_pairing ON pairing_males(pairing_id);
        CREATE INDEX IF NOT EXISTS idx_follicle_pairing ON follicle_checks(pairing_id);
        CREATE INDEX IF NOT EXISTS idx_clutch_expected ON clutches(expected_hatch_date);
        CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
        CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp);",
    )
    .context("Failed to create schema")?;

    debug!("database schema ready");
    Ok(())
}

// ============================================================================
// ROW DECODING
// ============================================================================

fn conversion_error(idx: usize, err: RecordError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn date_column(row: &Row, idx: usize, field: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date(field, &raw).map_err(|e| conversion_error(idx, e))
}

fn optional_date_column(row: &Row, idx: usize, field: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    parse_optional_date(field, raw.as_deref()).map_err(|e| conversion_error(idx, e))
}

fn date_to_sql(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn timestamp_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            timestamp_to_sql(event.timestamp),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

fn log_event(
    conn: &Connection,
    event_type: &str,
    entity_type: &str,
    entity_id: &str,
    data: serde_json::Value,
) -> Result<()> {
    insert_event(conn, &Event::new(event_type, entity_type, entity_id, data, ACTOR))
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// ANIMALS
// ============================================================================

const ANIMAL_COLUMNS: &str = "id, animal_number, name, breeder_id, sex, morph, genetics,
    date_of_birth, weight_grams, status, price, notes, clutch_id, clutch_letter";

fn animal_from_row(row: &Row) -> rusqlite::Result<Animal> {
    let sex_code: Option<String> = row.get(4)?;
    let status_code: Option<String> = row.get(9)?;

    let sex = Sex::from_code(sex_code.as_deref()).map_err(|e| conversion_error(4, e))?;
    let status = status_code
        .map(|code| code.parse::<AnimalStatus>())
        .transpose()
        .map_err(|e| conversion_error(9, e))?;

    Ok(Animal {
        id: row.get(0)?,
        animal_number: row.get(1)?,
        name: row.get(2)?,
        breeder_id: row.get(3)?,
        sex,
        morph: row.get(5)?,
        genetics: row.get(6)?,
        date_of_birth: optional_date_column(row, 7, "date_of_birth")?,
        weight_grams: row.get(8)?,
        status,
        price: row.get(10)?,
        notes: row.get(11)?,
        clutch_id: row.get(12)?,
        clutch_letter: row.get(13)?,
    })
}

/// Add an animal; the store assigns its UUID and sequence number.
pub fn insert_animal(conn: &Connection, new: &NewAnimal) -> Result<Animal> {
    let id = uuid::Uuid::new_v4().to_string();

    conn.execute(
        "INSERT INTO animals (
            id, name, breeder_id, sex, morph, genetics, date_of_birth,
            weight_grams, status, price, notes, clutch_id, clutch_letter
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            new.name,
            new.breeder_id,
            new.sex.code(),
            new.morph,
            new.genetics,
            date_to_sql(new.date_of_birth),
            new.weight_grams,
            new.status.map(|s| s.as_str()),
            new.price,
            new.notes,
            new.clutch_id,
            new.clutch_letter,
        ],
    )
    .context("Failed to insert animal")?;

    let animal_number = conn.last_insert_rowid();
    log_event(
        conn,
        "animal_added",
        "animal",
        &id,
        serde_json::json!({ "animal_number": animal_number, "name": new.name }),
    )?;
    info!(animal_number, id = %id, "animal added");

    get_animal(conn, &id)?.ok_or_else(|| RecordError::not_found("animal", &id).into())
}

pub fn get_all_animals(conn: &Connection) -> Result<Vec<Animal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ANIMAL_COLUMNS} FROM animals ORDER BY animal_number ASC"
    ))?;
    let animals = stmt
        .query_map([], animal_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load animals")?;
    Ok(animals)
}

pub fn get_animal(conn: &Connection, id: &str) -> Result<Option<Animal>> {
    let animal = conn
        .query_row(
            &format!("SELECT {ANIMAL_COLUMNS} FROM animals WHERE id = ?1"),
            [id],
            animal_from_row,
        )
        .optional()?;
    Ok(animal)
}

pub fn get_animal_by_number(conn: &Connection, animal_number: i64) -> Result<Option<Animal>> {
    let animal = conn
        .query_row(
            &format!("SELECT {ANIMAL_COLUMNS} FROM animals WHERE animal_number = ?1"),
            [animal_number],
            animal_from_row,
        )
        .optional()?;
    Ok(animal)
}

/// Overwrite every editable field of an animal.
pub fn update_animal(conn: &Connection, animal: &Animal) -> Result<()> {
    let changed = conn.execute(
        "UPDATE animals SET
            name = ?2, breeder_id = ?3, sex = ?4, morph = ?5, genetics = ?6,
            date_of_birth = ?7, weight_grams = ?8, status = ?9, price = ?10,
            notes = ?11, clutch_id = ?12, clutch_letter = ?13
         WHERE id = ?1",
        params![
            animal.id,
            animal.name,
            animal.breeder_id,
            animal.sex.code(),
            animal.morph,
            animal.genetics,
            date_to_sql(animal.date_of_birth),
            animal.weight_grams,
            animal.status.map(|s| s.as_str()),
            animal.price,
            animal.notes,
            animal.clutch_id,
            animal.clutch_letter,
        ],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("animal", &animal.id).into());
    }

    log_event(conn, "animal_updated", "animal", &animal.id, serde_json::to_value(animal)?)?;
    debug!(id = %animal.id, "animal updated");
    Ok(())
}

pub fn set_animal_status(conn: &Connection, id: &str, status: Option<AnimalStatus>) -> Result<()> {
    let code = status.map(|s| s.as_str());
    let changed = conn.execute("UPDATE animals SET status = ?2 WHERE id = ?1", params![id, code])?;
    if changed == 0 {
        return Err(RecordError::not_found("animal", id).into());
    }

    log_event(conn, "animal_status_changed", "animal", id, serde_json::json!({ "status": code }))?;
    debug!(id, status = ?code, "animal status changed");
    Ok(())
}

pub fn set_breeder_id(conn: &Connection, id: &str, breeder_id: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE animals SET breeder_id = ?2 WHERE id = ?1",
        params![id, breeder_id],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("animal", id).into());
    }

    log_event(
        conn,
        "breeder_id_assigned",
        "animal",
        id,
        serde_json::json!({ "breeder_id": breeder_id }),
    )?;
    Ok(())
}

/// Delete an animal together with its weight history.
pub fn delete_animal(conn: &Connection, id: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM weight_records WHERE animal_id = ?1", [id])?;
    let changed = tx.execute("DELETE FROM animals WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(RecordError::not_found("animal", id).into());
    }
    log_event(&tx, "animal_deleted", "animal", id, serde_json::json!({}))?;
    tx.commit()?;

    info!(id, "animal deleted");
    Ok(())
}

// ============================================================================
// WEIGHT RECORDS
// ============================================================================

fn weight_from_row(row: &Row) -> rusqlite::Result<WeightRecord> {
    Ok(WeightRecord {
        id: row.get(0)?,
        animal_id: row.get(1)?,
        weight_grams: row.get(2)?,
        recorded_at: date_column(row, 3, "recorded_at")?,
        notes: row.get(4)?,
    })
}

/// Log a weight and make it the animal's current weight.
pub fn insert_weight_record(
    conn: &Connection,
    animal_id: &str,
    weight_grams: u32,
    recorded_at: NaiveDate,
    notes: Option<&str>,
) -> Result<WeightRecord> {
    let mut record = WeightRecord::new(animal_id, weight_grams, recorded_at);
    record.notes = notes.map(str::to_string);

    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE animals SET weight_grams = ?2 WHERE id = ?1",
        params![animal_id, weight_grams],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("animal", animal_id).into());
    }
    tx.execute(
        "INSERT INTO weight_records (id, animal_id, weight_grams, recorded_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.id,
            record.animal_id,
            record.weight_grams,
            date_to_sql(Some(record.recorded_at)),
            record.notes,
        ],
    )?;
    log_event(
        &tx,
        "weight_logged",
        "animal",
        animal_id,
        serde_json::json!({ "weight_grams": weight_grams, "recorded_at": recorded_at }),
    )?;
    tx.commit()?;

    debug!(animal_id, weight_grams, %recorded_at, "weight logged");
    Ok(record)
}

/// Weight history for one animal, newest first. Same-day records are listed
/// latest-logged first, matching the animal's current weight.
pub fn get_weight_records(conn: &Connection, animal_id: &str) -> Result<Vec<WeightRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, animal_id, weight_grams, recorded_at, notes
         FROM weight_records
         WHERE animal_id = ?1
         ORDER BY recorded_at DESC, rowid DESC",
    )?;
    let records = stmt
        .query_map([animal_id], weight_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load weight records")?;
    Ok(records)
}

pub fn delete_weight_record(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM weight_records WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(RecordError::not_found("weight record", id).into());
    }
    log_event(conn, "weight_deleted", "weight_record", id, serde_json::json!({}))?;
    Ok(())
}

// ============================================================================
// PAIRINGS
// ============================================================================

fn pairing_male_from_row(row: &Row) -> rusqlite::Result<PairingMale> {
    Ok(PairingMale {
        id: row.get(0)?,
        pairing_id: row.get(1)?,
        male_id: row.get(2)?,
        lock_count: row.get(3)?,
        last_lock_date: optional_date_column(row, 4, "last_lock_date")?,
    })
}

fn follicle_from_row(row: &Row) -> rusqlite::Result<FollicleCheck> {
    Ok(FollicleCheck {
        id: row.get(0)?,
        pairing_id: row.get(1)?,
        checked_at: date_column(row, 2, "checked_at")?,
        follicle_size_mm: row.get(3)?,
        next_check_due: optional_date_column(row, 4, "next_check_due")?,
        notes: row.get(5)?,
    })
}

fn pairing_from_row(row: &Row) -> rusqlite::Result<Pairing> {
    let status_code: String = row.get(2)?;
    let status = status_code
        .parse::<PairingStatus>()
        .map_err(|e| conversion_error(2, e))?;
    let created_raw: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(Pairing {
        id: row.get(0)?,
        female_id: row.get(1)?,
        status,
        pairing_start: optional_date_column(row, 3, "pairing_start")?,
        ovulation_date: optional_date_column(row, 4, "ovulation_date")?,
        pre_lay_shed_date: optional_date_column(row, 5, "pre_lay_shed_date")?,
        notes: row.get(6)?,
        created_at,
        males: Vec::new(),
        follicle_checks: Vec::new(),
    })
}

fn load_pairing_relations(conn: &Connection, pairing: &mut Pairing) -> Result<()> {
    let mut males = conn.prepare(
        "SELECT id, pairing_id, male_id, lock_count, last_lock_date
         FROM pairing_males WHERE pairing_id = ?1 ORDER BY rowid ASC",
    )?;
    pairing.males = males
        .query_map([&pairing.id], pairing_male_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut checks = conn.prepare(
        "SELECT id, pairing_id, checked_at, follicle_size_mm, next_check_due, notes
         FROM follicle_checks WHERE pairing_id = ?1 ORDER BY rowid ASC",
    )?;
    pairing.follicle_checks = checks
        .query_map([&pairing.id], follicle_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(())
}

/// Store a pairing together with any males already attached to it.
pub fn insert_pairing(conn: &Connection, pairing: &Pairing) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO pairings (
            id, female_id, status, pairing_start, ovulation_date,
            pre_lay_shed_date, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            pairing.id,
            pairing.female_id,
            pairing.status.as_str(),
            date_to_sql(pairing.pairing_start),
            date_to_sql(pairing.ovulation_date),
            date_to_sql(pairing.pre_lay_shed_date),
            pairing.notes,
            timestamp_to_sql(pairing.created_at),
        ],
    )
    .context("Failed to insert pairing")?;

    for male in &pairing.males {
        insert_pairing_male(&tx, male)?;
    }
    log_event(
        &tx,
        "pairing_added",
        "pairing",
        &pairing.id,
        serde_json::json!({ "female_id": pairing.female_id, "males": pairing.males.len() }),
    )?;
    tx.commit()?;

    info!(id = %pairing.id, female_id = %pairing.female_id, "pairing added");
    Ok(())
}

fn insert_pairing_male(conn: &Connection, male: &PairingMale) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pairing_males WHERE pairing_id = ?1 AND male_id = ?2)",
        params![male.pairing_id, male.male_id],
        |row| row.get(0),
    )?;
    if exists {
        return Err(RecordError::DuplicateMale {
            pairing_id: male.pairing_id.clone(),
            male_id: male.male_id.clone(),
        }
        .into());
    }

    conn.execute(
        "INSERT INTO pairing_males (id, pairing_id, male_id, lock_count, last_lock_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            male.id,
            male.pairing_id,
            male.male_id,
            male.lock_count,
            date_to_sql(male.last_lock_date),
        ],
    )?;
    Ok(())
}

/// Attach a male to a pairing. A male can only be attached once.
pub fn add_pairing_male(conn: &Connection, pairing_id: &str, male_id: &str) -> Result<PairingMale> {
    let male = PairingMale::new(pairing_id, male_id);
    insert_pairing_male(conn, &male)?;
    log_event(conn, "male_added", "pairing", pairing_id, serde_json::json!({ "male_id": male_id }))?;
    debug!(pairing_id, male_id, "male added to pairing");
    Ok(male)
}

pub fn remove_pairing_male(conn: &Connection, pairing_id: &str, male_id: &str) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM pairing_males WHERE pairing_id = ?1 AND male_id = ?2",
        params![pairing_id, male_id],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("pairing male", male_id).into());
    }
    log_event(conn, "male_removed", "pairing", pairing_id, serde_json::json!({ "male_id": male_id }))?;
    Ok(())
}

/// Count one more lock for a male and remember when it happened.
pub fn record_lock(
    conn: &Connection,
    pairing_id: &str,
    male_id: &str,
    lock_date: NaiveDate,
) -> Result<PairingMale> {
    let changed = conn.execute(
        "UPDATE pairing_males
         SET lock_count = lock_count + 1, last_lock_date = ?3
         WHERE pairing_id = ?1 AND male_id = ?2",
        params![pairing_id, male_id, date_to_sql(Some(lock_date))],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("pairing male", male_id).into());
    }

    let male = conn.query_row(
        "SELECT id, pairing_id, male_id, lock_count, last_lock_date
         FROM pairing_males WHERE pairing_id = ?1 AND male_id = ?2",
        params![pairing_id, male_id],
        pairing_male_from_row,
    )?;
    log_event(
        conn,
        "lock_recorded",
        "pairing",
        pairing_id,
        serde_json::json!({ "male_id": male_id, "lock_count": male.lock_count, "date": lock_date }),
    )?;
    debug!(pairing_id, male_id, lock_count = male.lock_count, "lock recorded");
    Ok(male)
}

/// Overwrite the pairing's own fields; males and checks are left alone.
pub fn update_pairing(conn: &Connection, pairing: &Pairing) -> Result<()> {
    let changed = conn.execute(
        "UPDATE pairings SET
            female_id = ?2, status = ?3, pairing_start = ?4, ovulation_date = ?5,
            pre_lay_shed_date = ?6, notes = ?7
         WHERE id = ?1",
        params![
            pairing.id,
            pairing.female_id,
            pairing.status.as_str(),
            date_to_sql(pairing.pairing_start),
            date_to_sql(pairing.ovulation_date),
            date_to_sql(pairing.pre_lay_shed_date),
            pairing.notes,
        ],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("pairing", &pairing.id).into());
    }
    log_event(
        conn,
        "pairing_updated",
        "pairing",
        &pairing.id,
        serde_json::json!({ "status": pairing.status }),
    )?;
    Ok(())
}

pub fn set_pairing_status(conn: &Connection, id: &str, status: PairingStatus) -> Result<()> {
    let changed = conn.execute(
        "UPDATE pairings SET status = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("pairing", id).into());
    }
    log_event(conn, "pairing_status_changed", "pairing", id, serde_json::json!({ "status": status }))?;
    debug!(id, %status, "pairing status changed");
    Ok(())
}

/// All pairings with their males and follicle checks, newest first.
pub fn get_all_pairings(conn: &Connection) -> Result<Vec<Pairing>> {
    let mut stmt = conn.prepare(
        "SELECT id, female_id, status, pairing_start, ovulation_date,
                pre_lay_shed_date, notes, created_at
         FROM pairings
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let mut pairings = stmt
        .query_map([], pairing_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load pairings")?;

    for pairing in &mut pairings {
        load_pairing_relations(conn, pairing)?;
    }
    Ok(pairings)
}

pub fn get_pairing(conn: &Connection, id: &str) -> Result<Option<Pairing>> {
    let pairing = conn
        .query_row(
            "SELECT id, female_id, status, pairing_start, ovulation_date,
                    pre_lay_shed_date, notes, created_at
             FROM pairings WHERE id = ?1",
            [id],
            pairing_from_row,
        )
        .optional()?;

    match pairing {
        Some(mut p) => {
            load_pairing_relations(conn, &mut p)?;
            Ok(Some(p))
        }
        None => Ok(None),
    }
}

/// Delete a pairing, its follicle checks and its male associations.
pub fn delete_pairing(conn: &Connection, id: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM follicle_checks WHERE pairing_id = ?1", [id])?;
    tx.execute("DELETE FROM pairing_males WHERE pairing_id = ?1", [id])?;
    let changed = tx.execute("DELETE FROM pairings WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(RecordError::not_found("pairing", id).into());
    }
    log_event(&tx, "pairing_deleted", "pairing", id, serde_json::json!({}))?;
    tx.commit()?;

    info!(id, "pairing deleted");
    Ok(())
}

// ============================================================================
// FOLLICLE CHECKS
// ============================================================================

/// Record a follicle check; the next check date follows from the size.
pub fn insert_follicle_check(
    conn: &Connection,
    pairing_id: &str,
    checked_at: NaiveDate,
    follicle_size_mm: Option<u32>,
    notes: Option<&str>,
) -> Result<FollicleCheck> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pairings WHERE id = ?1)",
        [pairing_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(RecordError::not_found("pairing", pairing_id).into());
    }

    let mut check = FollicleCheck::new(pairing_id, checked_at, follicle_size_mm);
    check.notes = notes.map(str::to_string);

    conn.execute(
        "INSERT INTO follicle_checks (
            id, pairing_id, checked_at, follicle_size_mm, next_check_due, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            check.id,
            check.pairing_id,
            date_to_sql(Some(check.checked_at)),
            check.follicle_size_mm,
            date_to_sql(check.next_check_due),
            check.notes,
        ],
    )?;
    log_event(
        conn,
        "follicle_checked",
        "pairing",
        pairing_id,
        serde_json::json!({
            "size_mm": follicle_size_mm,
            "checked_at": checked_at,
            "next_check_due": check.next_check_due,
        }),
    )?;

    debug!(pairing_id, size_mm = ?follicle_size_mm, next = ?check.next_check_due, "follicle check recorded");
    Ok(check)
}

// ============================================================================
// CLUTCHES
// ============================================================================

const CLUTCH_COLUMNS: &str = "id, clutch_number, pairing_id, lay_date, egg_count, fertile_count,
    slug_count, kink_count, expected_hatch_date, actual_hatch_date, hatch_count, remarks";

fn clutch_from_row(row: &Row) -> rusqlite::Result<Clutch> {
    Ok(Clutch {
        id: row.get(0)?,
        clutch_number: row.get(1)?,
        pairing_id: row.get(2)?,
        lay_date: optional_date_column(row, 3, "lay_date")?,
        egg_count: row.get(4)?,
        fertile_count: row.get(5)?,
        slug_count: row.get(6)?,
        kink_count: row.get(7)?,
        expected_hatch_date: optional_date_column(row, 8, "expected_hatch_date")?,
        actual_hatch_date: optional_date_column(row, 9, "actual_hatch_date")?,
        hatch_count: row.get(10)?,
        remarks: row.get(11)?,
    })
}

/// Duplicate-detection key for a clutch: its number and lay date.
pub fn clutch_idempotency_hash(clutch_number: &str, lay_date: Option<NaiveDate>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}",
        clutch_number.trim(),
        date_to_sql(lay_date).unwrap_or_default()
    ));
    format!("{:x}", hasher.finalize())
}

/// Insert a clutch, deriving its expected hatch date.
///
/// Returns `None` when a clutch with the same number and lay date already
/// exists, so re-running an import is harmless.
pub fn insert_clutch(conn: &Connection, new: &NewClutch) -> Result<Option<Clutch>> {
    let id = uuid::Uuid::new_v4().to_string();
    let hash = clutch_idempotency_hash(&new.clutch_number, new.lay_date);

    let result = conn.execute(
        "INSERT INTO clutches (
            id, idempotency_hash, clutch_number, pairing_id, lay_date,
            egg_count, fertile_count, slug_count, kink_count,
            expected_hatch_date, actual_hatch_date, hatch_count, remarks
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            hash,
            new.clutch_number,
            new.pairing_id,
            date_to_sql(new.lay_date),
            new.egg_count,
            new.fertile_count,
            new.slug_count,
            new.kink_count,
            date_to_sql(new.expected_hatch_date()),
            date_to_sql(new.actual_hatch_date),
            new.hatch_count,
            new.remarks,
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            debug!(clutch_number = %new.clutch_number, "duplicate clutch skipped");
            return Ok(None);
        }
        Err(e) => return Err(e).context("Failed to insert clutch"),
    }

    log_event(
        conn,
        "clutch_added",
        "clutch",
        &id,
        serde_json::json!({ "clutch_number": new.clutch_number, "lay_date": new.lay_date }),
    )?;
    info!(clutch_number = %new.clutch_number, "clutch added");

    get_clutch(conn, &id)
}

/// Overwrite a clutch's fields, re-deriving the expected hatch date.
pub fn update_clutch(conn: &Connection, id: &str, edit: &NewClutch) -> Result<Clutch> {
    let changed = conn.execute(
        "UPDATE clutches SET
            idempotency_hash = ?2, clutch_number = ?3, pairing_id = ?4, lay_date = ?5,
            egg_count = ?6, fertile_count = ?7, slug_count = ?8, kink_count = ?9,
            expected_hatch_date = ?10, actual_hatch_date = ?11, hatch_count = ?12,
            remarks = ?13
         WHERE id = ?1",
        params![
            id,
            clutch_idempotency_hash(&edit.clutch_number, edit.lay_date),
            edit.clutch_number,
            edit.pairing_id,
            date_to_sql(edit.lay_date),
            edit.egg_count,
            edit.fertile_count,
            edit.slug_count,
            edit.kink_count,
            date_to_sql(edit.expected_hatch_date()),
            date_to_sql(edit.actual_hatch_date),
            edit.hatch_count,
            edit.remarks,
        ],
    )
    .context("Failed to update clutch")?;
    if changed == 0 {
        return Err(RecordError::not_found("clutch", id).into());
    }

    log_event(conn, "clutch_updated", "clutch", id, serde_json::to_value(edit)?)?;
    get_clutch(conn, id)?.ok_or_else(|| RecordError::not_found("clutch", id).into())
}

/// Mark a clutch hatched.
pub fn record_hatch(
    conn: &Connection,
    id: &str,
    hatched_on: NaiveDate,
    hatch_count: u32,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE clutches SET actual_hatch_date = ?2, hatch_count = ?3 WHERE id = ?1",
        params![id, date_to_sql(Some(hatched_on)), hatch_count],
    )?;
    if changed == 0 {
        return Err(RecordError::not_found("clutch", id).into());
    }
    log_event(
        conn,
        "clutch_hatched",
        "clutch",
        id,
        serde_json::json!({ "hatched_on": hatched_on, "hatch_count": hatch_count }),
    )?;
    info!(id, %hatched_on, hatch_count, "clutch hatched");
    Ok(())
}

/// All clutches, soonest expected hatch first and undated clutches last.
pub fn get_all_clutches(conn: &Connection) -> Result<Vec<Clutch>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLUTCH_COLUMNS} FROM clutches
         ORDER BY expected_hatch_date IS NULL, expected_hatch_date ASC, rowid ASC"
    ))?;
    let clutches = stmt
        .query_map([], clutch_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to load clutches")?;
    Ok(clutches)
}

pub fn get_clutch(conn: &Connection, id: &str) -> Result<Option<Clutch>> {
    let clutch = conn
        .query_row(
            &format!("SELECT {CLUTCH_COLUMNS} FROM clutches WHERE id = ?1"),
            [id],
            clutch_from_row,
        )
        .optional()?;
    Ok(clutch)
}

pub fn get_clutch_by_number(conn: &Connection, clutch_number: &str) -> Result<Option<Clutch>> {
    let clutch = conn
        .query_row(
            &format!(
                "SELECT {CLUTCH_COLUMNS} FROM clutches WHERE clutch_number = ?1
                 ORDER BY rowid ASC LIMIT 1"
            ),
            [clutch_number],
            clutch_from_row,
        )
        .optional()?;
    Ok(clutch)
}

pub fn delete_clutch(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM clutches WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(RecordError::not_found("clutch", id).into());
    }
    log_event(conn, "clutch_deleted", "clutch", id, serde_json::json!({}))?;
    info!(id, "clutch deleted");
    Ok(())
}

pub fn count_clutches(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM clutches", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn new_animal(name: &str, status: AnimalStatus) -> NewAnimal {
        NewAnimal {
            name: Some(name.to_string()),
            status: Some(status),
            sex: if status.as_str().starts_with('F') { Sex::Female } else { Sex::Male },
            ..NewAnimal::default()
        }
    }

    fn new_clutch(number: &str, lay: Option<NaiveDate>) -> NewClutch {
        NewClutch {
            clutch_number: number.to_string(),
            lay_date: lay,
            egg_count: 5,
            fertile_count: 5,
            ..NewClutch::default()
        }
    }

    #[test]
    fn test_animals_get_sequential_numbers() {
        let conn = test_db();
        let a = insert_animal(&conn, &new_animal("Penny", AnimalStatus::FemaleBreeder)).unwrap();
        let b = insert_animal(&conn, &new_animal("Kai", AnimalStatus::MaleBreeder)).unwrap();

        assert_eq!(a.animal_number, 1);
        assert_eq!(b.animal_number, 2);
        assert_eq!(a.sex, Sex::Female);
        assert_eq!(get_all_animals(&conn).unwrap().len(), 2);
        assert_eq!(get_animal_by_number(&conn, 2).unwrap().unwrap().id, b.id);
    }

    #[test]
    fn test_animal_without_status_round_trips_as_none() {
        let conn = test_db();
        let animal = insert_animal(&conn, &NewAnimal::default()).unwrap();
        assert_eq!(animal.status, None);
        assert_eq!(animal.sex, Sex::Unknown);
    }

    #[test]
    fn test_unknown_status_in_row_is_an_error() {
        let conn = test_db();
        let animal = insert_animal(&conn, &NewAnimal::default()).unwrap();
        conn.execute("UPDATE animals SET status = 'SOLD' WHERE id = ?1", [&animal.id])
            .unwrap();

        assert!(get_all_animals(&conn).is_err());
    }

    #[test]
    fn test_malformed_date_in_row_is_an_error() {
        let conn = test_db();
        insert_clutch(&conn, &new_clutch("C1-25", Some(date(2025, 4, 14)))).unwrap();
        conn.execute("UPDATE clutches SET lay_date = '14/04/2025'", []).unwrap();

        assert!(get_all_clutches(&conn).is_err());
    }

    #[test]
    fn test_update_and_status_change() {
        let conn = test_db();
        let mut animal =
            insert_animal(&conn, &new_animal("Riot", AnimalStatus::FemaleHoldback)).unwrap();

        animal.morph = Some("Confusion Enchi Pastel".to_string());
        update_animal(&conn, &animal).unwrap();
        set_animal_status(&conn, &animal.id, Some(AnimalStatus::FemaleBreeder)).unwrap();

        let stored = get_animal(&conn, &animal.id).unwrap().unwrap();
        assert_eq!(stored.morph.as_deref(), Some("Confusion Enchi Pastel"));
        assert_eq!(stored.status, Some(AnimalStatus::FemaleBreeder));

        let events = get_events_for_entity(&conn, "animal", &animal.id).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].event_type, "animal_status_changed");
    }

    #[test]
    fn test_update_missing_animal_fails() {
        let conn = test_db();
        let ghost = Animal::new(99);
        let err = update_animal(&conn, &ghost).unwrap_err();
        assert!(err.to_string().contains("animal not found"));
    }

    #[test]
    fn test_weight_log_updates_current_weight() {
        let conn = test_db();
        let animal = insert_animal(&conn, &new_animal("Ivy", AnimalStatus::FemaleBreeder)).unwrap();

        insert_weight_record(&conn, &animal.id, 1800, date(2025, 1, 1), None).unwrap();
        insert_weight_record(&conn, &animal.id, 2000, date(2025, 1, 10), Some("post-feed"))
            .unwrap();

        let stored = get_animal(&conn, &animal.id).unwrap().unwrap();
        assert_eq!(stored.weight_grams, Some(2000));

        let records = get_weight_records(&conn, &animal.id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].weight_grams, 2000);
        assert_eq!(records[0].notes.as_deref(), Some("post-feed"));
        assert_eq!(crate::derived::weight_delta(&records), Some(200));

        delete_weight_record(&conn, &records[1].id).unwrap();
        assert_eq!(get_weight_records(&conn, &animal.id).unwrap().len(), 1);
    }

    #[test]
    fn test_same_day_weights_agree_with_current_weight() {
        let conn = test_db();
        let animal = insert_animal(&conn, &new_animal("Ivy", AnimalStatus::FemaleBreeder)).unwrap();

        insert_weight_record(&conn, &animal.id, 1800, date(2025, 1, 1), None).unwrap();
        insert_weight_record(&conn, &animal.id, 2000, date(2025, 1, 10), None).unwrap();
        insert_weight_record(&conn, &animal.id, 1900, date(2025, 1, 10), None).unwrap();

        let stored = get_animal(&conn, &animal.id).unwrap().unwrap();
        let records = get_weight_records(&conn, &animal.id).unwrap();
        assert_eq!(stored.weight_grams, Some(1900));
        assert_eq!(records[0].weight_grams, 1900);
        assert_eq!(records[1].weight_grams, 2000);
        assert_eq!(crate::derived::weight_delta(&records), Some(-100));
    }

    #[test]
    fn test_weight_for_missing_animal_fails() {
        let conn = test_db();
        assert!(insert_weight_record(&conn, "nope", 100, date(2025, 1, 1), None).is_err());
    }

    #[test]
    fn test_delete_animal_removes_weights() {
        let conn = test_db();
        let animal = insert_animal(&conn, &NewAnimal::default()).unwrap();
        insert_weight_record(&conn, &animal.id, 90, date(2025, 1, 1), None).unwrap();

        delete_animal(&conn, &animal.id).unwrap();
        assert!(get_animal(&conn, &animal.id).unwrap().is_none());
        assert!(get_weight_records(&conn, &animal.id).unwrap().is_empty());
    }

    #[test]
    fn test_pairing_lifecycle() {
        let conn = test_db();
        let female = insert_animal(&conn, &new_animal("Penny", AnimalStatus::FemaleBreeder)).unwrap();
        let male = insert_animal(&conn, &new_animal("Kai", AnimalStatus::MaleBreeder)).unwrap();

        let pairing = Pairing::new(&female.id);
        insert_pairing(&conn, &pairing).unwrap();
        add_pairing_male(&conn, &pairing.id, &male.id).unwrap();

        let dup = add_pairing_male(&conn, &pairing.id, &male.id).unwrap_err();
        assert!(matches!(
            dup.downcast_ref::<RecordError>(),
            Some(RecordError::DuplicateMale { .. })
        ));

        record_lock(&conn, &pairing.id, &male.id, date(2025, 2, 1)).unwrap();
        let pm = record_lock(&conn, &pairing.id, &male.id, date(2025, 2, 3)).unwrap();
        assert_eq!(pm.lock_count, 2);
        assert_eq!(pm.last_lock_date, Some(date(2025, 2, 3)));

        insert_follicle_check(&conn, &pairing.id, date(2025, 3, 1), Some(25), None).unwrap();
        set_pairing_status(&conn, &pairing.id, PairingStatus::Ovulated).unwrap();

        let stored = get_pairing(&conn, &pairing.id).unwrap().unwrap();
        assert_eq!(stored.status, PairingStatus::Ovulated);
        assert_eq!(stored.males.len(), 1);
        assert_eq!(stored.follicle_checks.len(), 1);
        assert_eq!(
            stored.follicle_checks[0].next_check_due,
            Some(date(2025, 3, 15))
        );

        delete_pairing(&conn, &pairing.id).unwrap();
        assert!(get_pairing(&conn, &pairing.id).unwrap().is_none());
        assert!(get_all_pairings(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_pairings_newest_first() {
        let conn = test_db();
        let mut older = Pairing::new("f1");
        older.created_at = Utc::now() - chrono::Duration::days(3);
        let newer = Pairing::new("f2");
        insert_pairing(&conn, &older).unwrap();
        insert_pairing(&conn, &newer).unwrap();

        let ids: Vec<String> = get_all_pairings(&conn)
            .unwrap()
            .into_iter()
            .map(|p| p.female_id)
            .collect();
        assert_eq!(ids, vec!["f2".to_string(), "f1".to_string()]);
    }

    #[test]
    fn test_update_pairing_and_remove_male() {
        let conn = test_db();
        let mut pairing = Pairing::new("f1");
        pairing.males.push(PairingMale::new(&pairing.id, "m1"));
        insert_pairing(&conn, &pairing).unwrap();

        pairing.pre_lay_shed_date = Some(date(2025, 4, 20));
        pairing.status = PairingStatus::Laid;
        update_pairing(&conn, &pairing).unwrap();
        remove_pairing_male(&conn, &pairing.id, "m1").unwrap();

        let stored = get_pairing(&conn, &pairing.id).unwrap().unwrap();
        assert_eq!(stored.status, PairingStatus::Laid);
        assert_eq!(stored.pre_lay_shed_date, Some(date(2025, 4, 20)));
        assert!(stored.males.is_empty());
    }

    #[test]
    fn test_follicle_check_for_missing_pairing_fails() {
        let conn = test_db();
        assert!(insert_follicle_check(&conn, "nope", date(2025, 1, 1), Some(10), None).is_err());
    }

    #[test]
    fn test_clutch_insert_projects_hatch_and_skips_duplicates() {
        let conn = test_db();
        let clutch = insert_clutch(&conn, &new_clutch("C10-25", Some(date(2025, 4, 14))))
            .unwrap()
            .unwrap();
        assert_eq!(clutch.expected_hatch_date, Some(date(2025, 6, 10)));

        let again = insert_clutch(&conn, &new_clutch("C10-25", Some(date(2025, 4, 14)))).unwrap();
        assert!(again.is_none());
        assert_eq!(count_clutches(&conn).unwrap(), 1);
    }

    #[test]
    fn test_clutches_ordered_by_expected_hatch_nulls_last() {
        let conn = test_db();
        insert_clutch(&conn, &new_clutch("late", Some(date(2025, 6, 1)))).unwrap();
        insert_clutch(&conn, &new_clutch("undated", None)).unwrap();
        insert_clutch(&conn, &new_clutch("early", Some(date(2025, 5, 1)))).unwrap();

        let order: Vec<String> = get_all_clutches(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.clutch_number)
            .collect();
        assert_eq!(order, vec!["early", "late", "undated"]);
    }

    #[test]
    fn test_update_clutch_recomputes_expected_hatch() {
        let conn = test_db();
        let clutch = insert_clutch(&conn, &new_clutch("C1", Some(date(2025, 5, 1))))
            .unwrap()
            .unwrap();

        let mut edit = new_clutch("C1", Some(date(2025, 5, 11)));
        edit.remarks = Some("re-dated".to_string());
        let updated = update_clutch(&conn, &clutch.id, &edit).unwrap();
        assert_eq!(updated.expected_hatch_date, Some(date(2025, 7, 7)));

        edit.lay_date = None;
        let undated = update_clutch(&conn, &clutch.id, &edit).unwrap();
        assert_eq!(undated.expected_hatch_date, None);
    }

    #[test]
    fn test_record_hatch_and_delete() {
        let conn = test_db();
        let clutch = insert_clutch(&conn, &new_clutch("C6-23", Some(date(2023, 5, 5))))
            .unwrap()
            .unwrap();

        record_hatch(&conn, &clutch.id, date(2023, 7, 1), 2).unwrap();
        let hatched = get_clutch_by_number(&conn, "C6-23").unwrap().unwrap();
        assert!(hatched.is_hatched());
        assert_eq!(hatched.hatch_count, 2);

        delete_clutch(&conn, &clutch.id).unwrap();
        assert_eq!(count_clutches(&conn).unwrap(), 0);
        assert!(delete_clutch(&conn, &clutch.id).is_err());
    }

    #[test]
    fn test_clutch_hash_is_stable() {
        let a = clutch_idempotency_hash("C5-23", Some(date(2023, 4, 14)));
        let b = clutch_idempotency_hash(" C5-23 ", Some(date(2023, 4, 14)));
        let c = clutch_idempotency_hash("C5-23", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_event_log() {
        let conn = test_db();
        let event = Event::new(
            "test_event",
            "clutch",
            "test_id_123",
            serde_json::json!({"test": "data"}),
            "test_actor",
        );
        insert_event(&conn, &event).unwrap();

        let events = get_events_for_entity(&conn, "clutch", "test_id_123").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "test_event");
        assert_eq!(events[0].actor, "test_actor");
    }
}
