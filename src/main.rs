// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use pythrone::config::{init_tracing, load_preferences, save_preferences, AppConfig};
use pythrone::data_quality::DataQualityEngine;
use pythrone::derived::{display_id, egg_detail, female_label, format_change, lock_summary, male_label, weight_history};
use pythrone::follicle::{latest_check, next_check_reminder, pairing_next_check_due};
use pythrone::grouping::{group_animals_by_status, group_pairings, partition_clutches};
use pythrone::hatch::today;
use pythrone::{db, import, AnimalStatus, PairingStatus};
use rusqlite::Connection;
use std::env;
use std::path::Path;
use tracing::info;

const USAGE: &str = "\
Usage: pythrone [command]

Commands:
  init                        Create the database
  import-clutches <csv>       Import historic clutches (safe to repeat)
  import-breeder-ids <csv>    Assign breeder IDs to animals that lack one
  collection                  List animals grouped by status
  clutches                    List clutches with hatch countdowns
  pairings                    List pairings with follicle reminders
  weights <animal_number>     Show an animal's weight history
  hide <STATUS>               Hide a status bucket (e.g. M_AVAILABLE)
  show <STATUS>               Show a hidden status bucket
  quality                     Run data-quality checks
  tui                         Interactive viewer (default)";

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log_level_or_default());

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("tui");
    let arg = args.get(2).map(String::as_str);

    match (command, arg) {
        ("init", _) => run_init(&config),
        ("import-clutches", Some(csv)) => run_import_clutches(&config, Path::new(csv)),
        ("import-breeder-ids", Some(csv)) => run_import_breeder_ids(&config, Path::new(csv)),
        ("collection", _) => run_collection(&config),
        ("clutches", _) => run_clutches(&config),
        ("pairings", _) => run_pairings(&config),
        ("weights", Some(number)) => run_weights(&config, number),
        ("hide", Some(status)) => run_visibility(&config, status, true),
        ("show", Some(status)) => run_visibility(&config, status, false),
        ("quality", _) => run_quality(&config),
        ("tui", _) => run_ui_mode(&config),
        ("help" | "--help" | "-h", _) => {
            println!("{USAGE}");
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            bail!("unknown or incomplete command: {}", args[1..].join(" "));
        }
    }
}

fn open_database(config: &AppConfig) -> Result<Connection> {
    let path = config.database_path();
    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    db::setup_database(&conn)?;
    Ok(conn)
}

fn run_init(config: &AppConfig) -> Result<()> {
    open_database(config)?;
    println!("✓ Database ready at {}", config.database_path().display());
    Ok(())
}

fn run_import_clutches(config: &AppConfig, csv_path: &Path) -> Result<()> {
    println!("📂 Loading clutches from {}...", csv_path.display());
    let clutches = import::load_clutch_csv(csv_path)?;
    println!("✓ Read {} clutches", clutches.len());

    let conn = open_database(config)?;
    let summary = import::import_clutches(&conn, &clutches)?;
    println!("✓ Inserted {}", summary.inserted);
    if summary.duplicates > 0 {
        println!("✓ Skipped {} already imported", summary.duplicates);
    }
    println!("✓ Database contains {} clutches", db::count_clutches(&conn)?);
    Ok(())
}

fn run_import_breeder_ids(config: &AppConfig, csv_path: &Path) -> Result<()> {
    let mappings = import::load_breeder_id_csv(csv_path)?;
    println!("📂 Loaded {} breeder ID mappings", mappings.len());

    let conn = open_database(config)?;
    let report = import::assign_breeder_ids(&conn, &mappings)?;
    println!("✓ Updated {} animals", report.updated);

    if !report.unmatched.is_empty() {
        println!("\n⚠️  {} animals without a match:", report.unmatched.len());
        for animal in &report.unmatched {
            println!(
                "   #{} {} ({}, {})",
                animal.animal_number,
                animal.name.as_deref().unwrap_or("unnamed"),
                animal.morph.as_deref().unwrap_or("no morph"),
                animal
                    .weight_grams
                    .map(|g| format!("{g}g"))
                    .unwrap_or_else(|| "no weight".to_string()),
            );
        }
    }
    Ok(())
}

fn run_collection(config: &AppConfig) -> Result<()> {
    let conn = open_database(config)?;
    let animals = db::get_all_animals(&conn)?;
    let visibility = load_preferences(&config.preferences_path())?.visibility();
    let groups = group_animals_by_status(&animals);

    for group in groups.visible(&visibility) {
        println!("\n{} ({})", group.heading(), group.animals.len());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for animal in &group.animals {
            println!(
                "  {:<20} {:<16} {} {:<32} {}",
                display_id(animal),
                animal.name.as_deref().unwrap_or(""),
                animal.sex.symbol(),
                animal.morph.as_deref().unwrap_or(""),
                animal
                    .weight_grams
                    .map(|g| format!("{g}g"))
                    .unwrap_or_default(),
            );
        }
    }

    let hidden: Vec<String> = visibility.hidden().map(|s| s.as_str().to_string()).collect();
    if !hidden.is_empty() {
        println!("\n(hidden: {})", hidden.join(", "));
    }
    Ok(())
}

fn run_clutches(config: &AppConfig) -> Result<()> {
    let conn = open_database(config)?;
    let clutches = db::get_all_clutches(&conn)?;
    let groups = partition_clutches(&clutches);
    let today = today();

    for (title, list) in [("Incubating", &groups.active), ("Hatched", &groups.completed)] {
        println!("\n{title} ({})", list.len());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for clutch in list {
            let countdown = clutch.countdown(today);
            println!(
                "  {:<10} laid {:<10}  {:<20} {} eggs {}",
                clutch.clutch_number,
                clutch.lay_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                countdown.text,
                clutch.egg_count,
                egg_detail(clutch),
            );
        }
    }
    Ok(())
}

fn run_pairings(config: &AppConfig) -> Result<()> {
    let conn = open_database(config)?;
    let animals = db::get_all_animals(&conn)?;
    let pairings = db::get_all_pairings(&conn)?;
    let groups = group_pairings(&pairings);
    let today = today();
    let find = |id: &str| animals.iter().find(|a| a.id == id);

    for status in PairingStatus::ALL {
        let list = groups.get(status);
        if list.is_empty() {
            continue;
        }
        println!("\n{status} ({})", list.len());
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for pairing in list {
            let female = find(&pairing.female_id)
                .map(female_label)
                .unwrap_or_else(|| "Unknown".to_string());
            let reminder =
                next_check_reminder(pairing_next_check_due(&pairing.follicle_checks), today);
            let follicle = latest_check(&pairing.follicle_checks)
                .and_then(|c| c.follicle_size_mm)
                .map(|mm| format!("{mm}mm"))
                .unwrap_or_else(|| "-".to_string());

            println!(
                "  ♀ {female:<28} follicle {follicle:<6} next check: {}{}",
                reminder.text,
                if reminder.urgent { " ⚠️" } else { "" },
            );
            for male in &pairing.males {
                let name = find(&male.male_id)
                    .map(male_label)
                    .unwrap_or_else(|| "Unknown".to_string());
                println!("      ♂ {name} ({})", lock_summary(male.lock_count));
            }
        }
    }
    Ok(())
}

fn run_weights(config: &AppConfig, number: &str) -> Result<()> {
    let animal_number: i64 = number
        .parse()
        .with_context(|| format!("Invalid animal number: {number}"))?;
    let conn = open_database(config)?;
    let Some(animal) = db::get_animal_by_number(&conn, animal_number)? else {
        bail!("No animal #{animal_number}");
    };

    let records = db::get_weight_records(&conn, &animal.id)?;
    println!("⚖️  {} - {} records", display_id(&animal), records.len());
    for entry in weight_history(&records) {
        println!(
            "  {}  {:>6}g  {}",
            entry.record.recorded_at,
            entry.record.weight_grams,
            entry.change.map(format_change).unwrap_or_default(),
        );
    }
    Ok(())
}

fn run_visibility(config: &AppConfig, status: &str, hide: bool) -> Result<()> {
    let status: AnimalStatus = status.parse()?;
    let path = config.preferences_path();
    let mut prefs = load_preferences(&path)?;

    let mut visibility = prefs.visibility();
    if hide {
        visibility.hide(status);
    } else {
        visibility.show(status);
    }
    prefs.set_visibility(&visibility);
    save_preferences(&path, &prefs)?;

    info!(%status, hide, "visibility updated");
    println!(
        "✓ {} is now {}",
        status.heading(),
        if hide { "hidden" } else { "shown" }
    );
    Ok(())
}

fn run_quality(config: &AppConfig) -> Result<()> {
    let conn = open_database(config)?;
    let animals = db::get_all_animals(&conn)?;
    let engine = DataQualityEngine::new();

    let mut reports = engine.check_clutches(&db::get_all_clutches(&conn)?);
    reports.extend(
        db::get_all_pairings(&conn)?
            .iter()
            .map(|p| engine.check_pairing(p, &animals)),
    );

    for report in reports.iter().filter(|r| !r.is_clean()) {
        println!("\n{}", report.summary());
        for issue in &report.issues {
            println!("  [{:?}] {}: {}", issue.severity, issue.field, issue.issue);
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", engine.batch_summary(&reports).summary());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    let conn = open_database(config)?;
    let prefs_path = config.preferences_path();
    let mut prefs = load_preferences(&prefs_path)?;

    let animals = db::get_all_animals(&conn)?;
    let mut weights = std::collections::HashMap::new();
    for animal in &animals {
        weights.insert(animal.id.clone(), db::get_weight_records(&conn, &animal.id)?);
    }
    let clutches = db::get_all_clutches(&conn)?;
    let pairings = db::get_all_pairings(&conn)?;
    info!(
        animals = animals.len(),
        clutches = clutches.len(),
        pairings = pairings.len(),
        "starting viewer"
    );

    let mut app = ui::App::new(animals, weights, clutches, pairings, prefs.visibility(), today());
    ui::run_ui(&mut app)?;

    if app.visibility != prefs.visibility() {
        prefs.set_visibility(&app.visibility);
        save_preferences(&prefs_path, &prefs)?;
    }
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the JSON API: cargo run --bin pythrone-server --features server");
    std::process::exit(1);
}
