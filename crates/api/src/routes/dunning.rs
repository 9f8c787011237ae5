//! Dunning routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::{Value, json};
use uuid::Uuid;

use freightbook_core::batch::BatchReport;
use freightbook_core::dunning::{DebtRef, DunningConfig, DunningDecision, DunningPolicy, Party};
use freightbook_shared::types::{InvoiceId, TrackingId};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Actor;

/// Creates the dunning routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dunning/run", post(run_cycle))
        .route("/dunning/trackings/{id}/evaluate", post(evaluate_tracking))
        .route("/dunning/invoices/{id}/evaluate", post(evaluate_invoice))
        .route("/dunning/invoices/{id}/paid", post(invoice_paid))
        .route(
            "/dunning/configs/{kind}/{party_id}",
            get(get_config).put(upsert_config),
        )
}

fn party(kind: &str, id: Uuid) -> Result<Party, ApiError> {
    Party::from_parts(kind, id)
        .ok_or_else(|| ApiError::validation(format!("unknown party kind '{kind}'")))
}

/// POST `/dunning/run` - Evaluates every open debt.
async fn run_cycle(
    State(state): State<AppState>,
) -> ApiResult<Json<BatchReport<DebtRef, DunningDecision>>> {
    Ok(Json(state.dunning().run_cycle().await?))
}

/// POST `/dunning/trackings/{id}/evaluate` - Evaluates one expected incoming invoice.
async fn evaluate_tracking(
    State(state): State<AppState>,
    Path(id): Path<TrackingId>,
) -> ApiResult<Json<DunningDecision>> {
    Ok(Json(state.dunning().evaluate_tracking(id).await?))
}

/// POST `/dunning/invoices/{id}/evaluate` - Evaluates one outgoing invoice.
async fn evaluate_invoice(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> ApiResult<Json<DunningDecision>> {
    Ok(Json(state.dunning().evaluate_invoice(id).await?))
}

/// POST `/dunning/invoices/{id}/paid` - Lifts the customer's suspension once the invoice is paid.
async fn invoice_paid(
    State(state): State<AppState>,
    Path(id): Path<InvoiceId>,
) -> ApiResult<Json<Value>> {
    let reactivated = state.dunning().handle_invoice_paid(id).await?;
    Ok(Json(json!({ "reactivated": reactivated })))
}

/// GET `/dunning/configs/{kind}/{party_id}` - A party's configuration or the defaults.
async fn get_config(
    State(state): State<AppState>,
    Path((kind, party_id)): Path<(String, Uuid)>,
) -> ApiResult<Json<DunningConfig>> {
    let party = party(&kind, party_id)?;
    Ok(Json(state.dunning().get_config(party).await?))
}

/// PUT `/dunning/configs/{kind}/{party_id}` - Stores a party's policy.
async fn upsert_config(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path((kind, party_id)): Path<(String, Uuid)>,
    Json(policy): Json<DunningPolicy>,
) -> ApiResult<Json<DunningConfig>> {
    let party = party(&kind, party_id)?;
    Ok(Json(state.dunning().upsert_config(party, policy, actor).await?))
}
