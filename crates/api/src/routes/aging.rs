//! Aging report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use freightbook_core::aging::AgingReport;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Default number of customers in the top outstanding list.
const DEFAULT_TOP_LIMIT: usize = 10;

/// Creates the aging routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/aging", get(aging_report))
        .route("/aging/top", get(top_outstanding))
}

/// Query parameters for the top outstanding list.
#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    /// Number of customers.
    pub limit: Option<usize>,
}

/// GET `/aging` - Aging report over each customer's latest statement.
async fn aging_report(State(state): State<AppState>) -> ApiResult<Json<AgingReport>> {
    Ok(Json(state.statements().aging_report().await?))
}

/// GET `/aging/top` - Customers with the largest outstanding totals.
async fn top_outstanding(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    if limit == 0 {
        return Err(ApiError::validation("limit must be positive"));
    }
    let customers = state.statements().top_outstanding(limit).await?;
    Ok(Json(json!({ "customers": customers })))
}
