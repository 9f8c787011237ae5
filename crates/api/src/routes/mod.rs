//! API route definitions.

use axum::Router;

use freightbook_shared::types::PageRequest;

use crate::AppState;

pub mod aging;
pub mod dunning;
pub mod health;
pub mod statements;
pub mod trackings;


/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(trackings::routes())
        .merge(statements::routes())
        .merge(aging::routes())
        .merge(dunning::routes())
}

/// Builds a page request from optional query parameters.
fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let default = PageRequest::default();
    PageRequest {
        page: page.unwrap_or(default.page),
        per_page: per_page.unwrap_or(default.per_page),
    }
}
