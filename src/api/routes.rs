use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, SharedState};
use crate::store::traits::SeedStore;

pub fn create_router<S: SeedStore + 'static>() -> Router<SharedState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Reseed trigger
        .route("/reseed", post(handlers::reseed_database::<S>))
        .route("/reseed/status", get(handlers::seed_status::<S>))
}
