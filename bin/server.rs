// Pythrone - JSON API Server
// Read-only views of the collection, clutches and pairings

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use pythrone::config::{init_tracing, load_preferences, AppConfig};
use pythrone::derived::{display_id, egg_detail, female_label, lock_summary, male_label, weight_delta, weight_history};
use pythrone::follicle::{latest_check, next_check_reminder, pairing_next_check_due};
use pythrone::grouping::{group_animals_by_status, group_pairings, partition_clutches};
use pythrone::hatch::today;
use pythrone::{
    db, Animal, AnimalStatus, CheckReminder, Clutch, Countdown, Pairing, PairingStatus,
    StatusVisibility, WeightRecord,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    preferences_path: PathBuf,
}

impl AppState {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %format!("{err:#}"), "request failed");
        Self::internal(&err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Serialize)]
struct AnimalResponse {
    #[serde(flatten)]
    animal: Animal,
    display_id: String,
}

#[derive(Serialize)]
struct AnimalGroupResponse {
    status: AnimalStatus,
    heading: &'static str,
    animals: Vec<AnimalResponse>,
}

#[derive(Serialize)]
struct WeightEntryResponse {
    #[serde(flatten)]
    record: WeightRecord,
    change: Option<i64>,
}

#[derive(Serialize)]
struct WeightsResponse {
    animal_id: String,
    display_id: String,
    delta: Option<i64>,
    history: Vec<WeightEntryResponse>,
}

#[derive(Serialize)]
struct ClutchResponse {
    #[serde(flatten)]
    clutch: Clutch,
    countdown: Countdown,
    egg_detail: String,
}

impl ClutchResponse {
    fn new(clutch: &Clutch, today: chrono::NaiveDate) -> Self {
        Self {
            countdown: clutch.countdown(today),
            egg_detail: egg_detail(clutch),
            clutch: clutch.clone(),
        }
    }
}

#[derive(Serialize)]
struct ClutchesResponse {
    active: Vec<ClutchResponse>,
    completed: Vec<ClutchResponse>,
}

#[derive(Serialize)]
struct MaleResponse {
    male_id: String,
    label: String,
    lock_count: u32,
    lock_summary: String,
    last_lock_date: Option<chrono::NaiveDate>,
}

#[derive(Serialize)]
struct PairingResponse {
    id: String,
    status: PairingStatus,
    female_id: String,
    female_label: String,
    pairing_start: Option<chrono::NaiveDate>,
    ovulation_date: Option<chrono::NaiveDate>,
    pre_lay_shed_date: Option<chrono::NaiveDate>,
    notes: Option<String>,
    males: Vec<MaleResponse>,
    latest_follicle_mm: Option<u32>,
    next_check_due: Option<chrono::NaiveDate>,
    next_check: CheckReminder,
}

impl PairingResponse {
    fn new(pairing: &Pairing, animals: &[Animal], today: chrono::NaiveDate) -> Self {
        let find = |id: &str| animals.iter().find(|a| a.id == id);
        let next_check_due = pairing_next_check_due(&pairing.follicle_checks);

        Self {
            id: pairing.id.clone(),
            status: pairing.status,
            female_id: pairing.female_id.clone(),
            female_label: find(&pairing.female_id)
                .map(female_label)
                .unwrap_or_else(|| "Unknown".to_string()),
            pairing_start: pairing.pairing_start,
            ovulation_date: pairing.ovulation_date,
            pre_lay_shed_date: pairing.pre_lay_shed_date,
            notes: pairing.notes.clone(),
            males: pairing
                .males
                .iter()
                .map(|m| MaleResponse {
                    male_id: m.male_id.clone(),
                    label: find(&m.male_id)
                        .map(male_label)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    lock_count: m.lock_count,
                    lock_summary: lock_summary(m.lock_count),
                    last_lock_date: m.last_lock_date,
                })
                .collect(),
            latest_follicle_mm: latest_check(&pairing.follicle_checks)
                .and_then(|c| c.follicle_size_mm),
            next_check_due,
            next_check: next_check_reminder(next_check_due, today),
        }
    }
}

#[derive(Serialize)]
struct PairingsResponse {
    active: Vec<PairingResponse>,
    ovulated: Vec<PairingResponse>,
    laid: Vec<PairingResponse>,
    complete: Vec<PairingResponse>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

#[derive(Deserialize)]
struct AnimalsQuery {
    /// Comma-separated status codes, e.g. `F_BREEDER,ON_HOLD`
    hidden: Option<String>,
}

fn parse_hidden(raw: &str) -> Result<StatusVisibility, ApiError> {
    let statuses = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<AnimalStatus>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(StatusVisibility::hiding(statuses))
}

/// GET /api/animals - Visible status buckets, heaviest first
async fn get_animals(
    State(state): State<AppState>,
    Query(query): Query<AnimalsQuery>,
) -> ApiResult<Vec<AnimalGroupResponse>> {
    let visibility = match query.hidden.as_deref() {
        Some(raw) => parse_hidden(raw)?,
        None => load_preferences(&state.preferences_path)?.visibility(),
    };

    let animals = db::get_all_animals(&*state.conn()?)?;
    let groups = group_animals_by_status(&animals);
    let response = groups
        .visible(&visibility)
        .map(|group| AnimalGroupResponse {
            status: group.status,
            heading: group.heading(),
            animals: group
                .animals
                .iter()
                .map(|a| AnimalResponse {
                    display_id: display_id(a),
                    animal: (*a).clone(),
                })
                .collect(),
        })
        .collect();

    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/animals/:id/weights - Weight history, newest first
async fn get_animal_weights(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<WeightsResponse> {
    let conn = state.conn()?;
    let animal = db::get_animal(&conn, &id)?
        .ok_or_else(|| ApiError::not_found(format!("animal not found: {id}")))?;
    let records = db::get_weight_records(&conn, &id)?;
    drop(conn);

    let history = weight_history(&records)
        .into_iter()
        .map(|entry| WeightEntryResponse {
            record: entry.record.clone(),
            change: entry.change,
        })
        .collect();

    Ok(Json(ApiResponse::ok(WeightsResponse {
        animal_id: animal.id.clone(),
        display_id: display_id(&animal),
        delta: weight_delta(&records),
        history,
    })))
}

/// GET /api/clutches - Incubating and hatched clutches with countdowns
async fn get_clutches(State(state): State<AppState>) -> ApiResult<ClutchesResponse> {
    let clutches = db::get_all_clutches(&*state.conn()?)?;
    let groups = partition_clutches(&clutches);
    let today = today();

    Ok(Json(ApiResponse::ok(ClutchesResponse {
        active: groups.active.iter().map(|c| ClutchResponse::new(c, today)).collect(),
        completed: groups.completed.iter().map(|c| ClutchResponse::new(c, today)).collect(),
    })))
}

/// GET /api/clutches/:number - One clutch by its number
async fn get_clutch(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<ClutchResponse> {
    let clutch = db::get_clutch_by_number(&*state.conn()?, &number)?
        .ok_or_else(|| ApiError::not_found(format!("clutch not found: {number}")))?;

    Ok(Json(ApiResponse::ok(ClutchResponse::new(&clutch, today()))))
}

/// GET /api/pairings - Pairings by lifecycle stage
async fn get_pairings(State(state): State<AppState>) -> ApiResult<PairingsResponse> {
    let (animals, pairings) = {
        let conn = state.conn()?;
        (db::get_all_animals(&conn)?, db::get_all_pairings(&conn)?)
    };
    let groups = group_pairings(&pairings);
    let today = today();
    let build = |list: &[&Pairing]| -> Vec<PairingResponse> {
        list.iter()
            .map(|p| PairingResponse::new(p, &animals, today))
            .collect()
    };

    Ok(Json(ApiResponse::ok(PairingsResponse {
        active: build(groups.get(PairingStatus::Active)),
        ovulated: build(groups.get(PairingStatus::Ovulated)),
        laid: build(groups.get(PairingStatus::Laid)),
        complete: build(groups.get(PairingStatus::Complete)),
    })))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log_level_or_default());

    let db_path = config.database_path();
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    db::setup_database(&conn)?;
    info!(path = %db_path.display(), "database opened");

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        preferences_path: config.preferences_path(),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/animals", get(get_animals))
        .route("/animals/:id/weights", get(get_animal_weights))
        .route("/clutches", get(get_clutches))
        .route("/clutches/:number", get(get_clutch))
        .route("/pairings", get(get_pairings))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = config.server_addr_or_default();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "server running");
    println!("🚀 Pythrone API on http://{addr}/api");

    axum::serve(listener, app)
        .await
        .context("Server stopped with an error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pythrone::NewClutch;

    fn state_with_clutch(number: &str) -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        db::setup_database(&conn).unwrap();
        db::insert_clutch(
            &conn,
            &NewClutch {
                clutch_number: number.to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        AppState {
            db: Arc::new(Mutex::new(conn)),
            preferences_path: PathBuf::from("unused-preferences.json"),
        }
    }

    #[tokio::test]
    async fn test_clutch_number_is_matched_as_given() {
        // The router has already percent-decoded the path segment.
        let state = state_with_clutch("C%41");

        let found = get_clutch(State(state.clone()), Path("C%41".to_string())).await;
        assert!(found.is_ok());

        let other = get_clutch(State(state), Path("CA".to_string())).await;
        assert!(other.is_err());
    }
}
