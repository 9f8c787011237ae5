//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for trackings, statements, aging and dunning
//! - The actor extractor
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use freightbook_core::dunning::DunningPolicy;
use freightbook_core::tracking::BulkPolicy;
use freightbook_db::{DunningRepository, StatementRepository, TrackingRepository};
use freightbook_shared::SharedClock;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Source of the current time.
    pub clock: SharedClock,
    /// Dunning policy of parties without an override.
    pub dunning_defaults: DunningPolicy,
    /// Policy for bulk tracking creation.
    pub bulk_policy: BulkPolicy,
}

impl AppState {
    /// Tracking repository over the shared pool.
    #[must_use]
    pub fn trackings(&self) -> TrackingRepository {
        TrackingRepository::new((*self.db).clone(), self.clock.clone())
    }

    /// Statement repository over the shared pool.
    #[must_use]
    pub fn statements(&self) -> StatementRepository {
        StatementRepository::new((*self.db).clone(), self.clock.clone())
    }

    /// Dunning repository over the shared pool.
    #[must_use]
    pub fn dunning(&self) -> DunningRepository {
        DunningRepository::new((*self.db).clone(), self.clock.clone(), self.dunning_defaults)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
