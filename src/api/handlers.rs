use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::SeedSettings;
use crate::model::{ReseedOptions, SeedTable};
use crate::seed;
use crate::store::traits::SeedStore;

/// Shared state behind every route
pub struct AppState<S> {
    pub seed: SeedSettings,
    /// Held for the whole of a reseed; overlapping requests are turned away
    reseed_lock: Mutex<()>,
    /// Set while the lock is held. Status reads this, never the lock.
    running: AtomicBool,
    pub store: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, seed: SeedSettings) -> Self {
        Self {
            seed,
            reseed_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            store,
        }
    }

    pub fn is_reseeding(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Raises the running flag for as long as it lives, so a dropped request
/// future clears it too
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub type SharedState<S> = Arc<AppState<S>>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Body of `POST /reseed`. Both fields optional; the whole body may be absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReseedRequest {
    #[serde(default)]
    pub delta_days: Option<i64>,
    #[serde(default)]
    pub anchor_days_ago: Option<i64>,
}

impl From<ReseedRequest> for ReseedOptions {
    fn from(req: ReseedRequest) -> Self {
        ReseedOptions {
            seed_dir: None,
            delta_days: req.delta_days,
            anchor_days_ago: req.anchor_days_ago,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReseedResponse {
    pub ok: bool,
    pub delta_days: i64,
}

#[derive(Debug, Serialize)]
pub struct ReseedErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ReseedErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

type ReseedRejection = (StatusCode, Json<ReseedErrorResponse>);

fn parse_reseed_request(body: &[u8]) -> Result<ReseedRequest, ReseedRejection> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReseedRequest::default());
    }

    serde_json::from_slice::<Option<ReseedRequest>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ReseedErrorResponse::new(format!("Invalid reseed request: {}", e))),
            )
        })
}

/// POST /reseed
/// Wipe and rebuild the database from fixtures
pub async fn reseed_database<S: SeedStore + 'static>(
    State(state): State<SharedState<S>>,
    body: Bytes,
) -> Result<Json<ReseedResponse>, ReseedRejection> {
    let req = parse_reseed_request(&body)?;

    let Ok(_guard) = state.reseed_lock.try_lock() else {
        log::warn!("Rejected reseed request: another reseed is running");
        return Err((
            StatusCode::CONFLICT,
            Json(ReseedErrorResponse::new("A reseed is already in progress")),
        ));
    };
    let _running = RunningFlag::raise(&state.running);

    log::info!(
        "Reseed requested (deltaDays={:?}, anchorDaysAgo={:?})",
        req.delta_days,
        req.anchor_days_ago
    );

    match seed::reseed(state.store.as_ref(), &state.seed, &req.into()).await {
        Ok(outcome) => Ok(Json(ReseedResponse {
            ok: true,
            delta_days: outcome.delta_days,
        })),
        Err(e) => {
            log::error!("Reseed failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReseedErrorResponse::new(e.to_string())),
            ))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeedStatusResponse {
    pub reseeding: bool,
    pub tables: BTreeMap<String, i64>,
}

/// GET /reseed/status
/// Row counts per seeded table
pub async fn seed_status<S: SeedStore + 'static>(
    State(state): State<SharedState<S>>,
) -> Result<Json<SeedStatusResponse>, ReseedRejection> {
    let mut tables = BTreeMap::new();
    for table in SeedTable::ALL {
        let count = state.store.count_rows(table).await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReseedErrorResponse::new(format!("{:#}", e))),
            )
        })?;
        tables.insert(table.name().to_string(), count);
    }

    Ok(Json(SeedStatusResponse {
        reseeding: state.is_reseeding(),
        tables,
    }))
}
