//! Expected incoming invoice routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use freightbook_core::batch::BatchReport;
use freightbook_core::tracking::{
    ApprovalStats, IncomingInvoiceTracking, NewTracking, TrackingFilter, TrackingStatus,
};
use freightbook_db::ReceiveInvoiceInput;
use freightbook_shared::AppError;
use freightbook_shared::types::{
    CurrencyAmount, InvoiceId, PageResponse, PartnerId, ShipmentId, TrackingId,
};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Actor;
use crate::routes::page_request;

/// Creates the tracking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trackings", get(list_trackings).post(create_tracking))
        .route("/trackings/bulk", post(bulk_create))
        .route("/trackings/missing", get(missing_invoices))
        .route("/trackings/pending-approvals", get(pending_approvals))
        .route("/trackings/approved", get(approved))
        .route("/trackings/approval-history", get(approval_history))
        .route("/trackings/approval-stats", get(approval_stats))
        .route("/trackings/{id}", get(get_tracking))
        .route("/trackings/{id}/receive", post(mark_received))
        .route("/trackings/{id}/remind", post(send_reminder))
        .route("/trackings/{id}/dispute", post(dispute))
        .route("/trackings/{id}/resolve", post(resolve_dispute))
        .route("/trackings/{id}/cancel", post(cancel))
        .route("/trackings/{id}/approve", post(approve))
        .route("/trackings/{id}/pay", post(mark_paid))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing trackings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTrackingsQuery {
    /// Only trackings in this status.
    pub status: Option<TrackingStatus>,
    /// Only trackings for this partner.
    pub partner_id: Option<PartnerId>,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Query parameters for the missing invoice report.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingQuery {
    /// Only invoices at least this many days late.
    pub min_days_overdue: Option<i64>,
}

/// Query parameters for bulk creation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateQuery {
    /// Overrides the configured delivery window.
    pub days_after_delivery: Option<i64>,
}

/// Query parameters for the approval history.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Only approvals for this partner.
    pub partner_id: Option<PartnerId>,
}

/// Request body for receiving an invoice.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveRequest {
    /// The incoming invoice.
    pub invoice_id: InvoiceId,
    /// When it arrived.
    pub received_date: Option<DateTime<Utc>>,
    /// Amount actually invoiced.
    pub actual_amount: Option<CurrencyAmount>,
}

/// Request body for a reminder or an approval.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    /// Free-text note.
    pub notes: Option<String>,
}

/// Request body for a dispute or a cancellation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasonRequest {
    /// Why.
    pub reason: String,
}

/// Request body for resolving a dispute.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    /// How the dispute was settled.
    pub resolution: String,
    /// Status to continue in.
    pub new_status: TrackingStatus,
}

/// Request body for recording a payment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    /// Bank or remittance reference.
    pub payment_reference: String,
    /// When the payment was made.
    pub paid_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/trackings` - Registers an expected incoming invoice.
async fn create_tracking(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<NewTracking>,
) -> ApiResult<(StatusCode, Json<IncomingInvoiceTracking>)> {
    let tracking = state.trackings().create(payload, actor).await?;
    Ok((StatusCode::CREATED, Json(tracking)))
}

/// POST `/trackings/bulk` - Creates trackings for every eligible delivered shipment.
async fn bulk_create(
    State(state): State<AppState>,
    Query(query): Query<BulkCreateQuery>,
) -> ApiResult<Json<BatchReport<ShipmentId, TrackingId>>> {
    let policy = match query.days_after_delivery {
        Some(days) => state
            .bulk_policy
            .with_days_after_delivery(days)
            .map_err(AppError::from)?,
        None => state.bulk_policy,
    };
    let report = state.trackings().bulk_create(policy).await?;
    Ok(Json(report))
}

/// GET `/trackings` - Lists trackings, filtered and paginated.
async fn list_trackings(
    State(state): State<AppState>,
    Query(query): Query<ListTrackingsQuery>,
) -> ApiResult<Json<PageResponse<IncomingInvoiceTracking>>> {
    let filter = TrackingFilter {
        status: query.status,
        partner_id: query.partner_id,
    };
    let page = page_request(query.page, query.per_page);
    Ok(Json(state.trackings().list(filter, page).await?))
}

/// GET `/trackings/missing` - Invoices past their expected date.
async fn missing_invoices(
    State(state): State<AppState>,
    Query(query): Query<MissingQuery>,
) -> ApiResult<Json<Value>> {
    let min_days = query.min_days_overdue.unwrap_or(0);
    if min_days < 0 {
        return Err(ApiError::validation("minDaysOverdue must not be negative"));
    }
    let missing = state.trackings().missing(min_days).await?;
    Ok(Json(json!({ "missing": missing })))
}

/// GET `/trackings/pending-approvals` - Received invoices awaiting approval.
async fn pending_approvals(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let trackings = state.trackings().pending_approvals().await?;
    Ok(Json(json!({ "trackings": trackings })))
}

/// GET `/trackings/approved` - Approved invoices awaiting payment.
async fn approved(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let trackings = state.trackings().approved().await?;
    Ok(Json(json!({ "trackings": trackings })))
}

/// GET `/trackings/approval-history` - Who approved what, newest first.
async fn approval_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Value>> {
    let history = state.trackings().approval_history(query.partner_id).await?;
    Ok(Json(json!({ "approvals": history })))
}

/// GET `/trackings/approval-stats` - Approval counts and amounts.
async fn approval_stats(State(state): State<AppState>) -> ApiResult<Json<ApprovalStats>> {
    Ok(Json(state.trackings().approval_stats().await?))
}

/// GET `/trackings/{id}` - One tracking.
async fn get_tracking(
    State(state): State<AppState>,
    Path(id): Path<TrackingId>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    Ok(Json(state.trackings().get(id).await?))
}

/// POST `/trackings/{id}/receive` - Links the arrived partner invoice.
async fn mark_received(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    Json(payload): Json<ReceiveRequest>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    let input = ReceiveInvoiceInput {
        invoice_id: payload.invoice_id,
        received_date: payload.received_date,
        actual_amount: payload.actual_amount,
    };
    Ok(Json(state.trackings().mark_received(id, input, actor).await?))
}

/// POST `/trackings/{id}/remind` - Records a reminder to the partner.
async fn send_reminder(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    payload: Option<Json<NotesRequest>>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    let notes = payload.and_then(|Json(p)| p.notes);
    Ok(Json(state.trackings().send_reminder(id, notes, actor).await?))
}

/// POST `/trackings/{id}/dispute` - Opens a dispute.
async fn dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    Json(payload): Json<ReasonRequest>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    Ok(Json(state.trackings().dispute(id, payload.reason, actor).await?))
}

/// POST `/trackings/{id}/resolve` - Settles a dispute.
async fn resolve_dispute(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    Json(payload): Json<ResolveRequest>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    let tracking = state
        .trackings()
        .resolve_dispute(id, payload.resolution, payload.new_status, actor)
        .await?;
    Ok(Json(tracking))
}

/// POST `/trackings/{id}/cancel` - Cancels the expectation.
async fn cancel(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    Json(payload): Json<ReasonRequest>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    Ok(Json(state.trackings().cancel(id, payload.reason, actor).await?))
}

/// POST `/trackings/{id}/approve` - Approves a received invoice for payment.
async fn approve(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    payload: Option<Json<NotesRequest>>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    let approver = actor.ok_or_else(|| ApiError::validation("approval requires an acting user"))?;
    let notes = payload.and_then(|Json(p)| p.notes);
    Ok(Json(state.trackings().approve(id, approver, notes).await?))
}

/// POST `/trackings/{id}/pay` - Records the payment and lifts any dunning suspension.
async fn mark_paid(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<TrackingId>,
    Json(payload): Json<PayRequest>,
) -> ApiResult<Json<IncomingInvoiceTracking>> {
    let tracking = state
        .trackings()
        .mark_paid(id, payload.payment_reference, payload.paid_date, actor)
        .await?;
    if state.dunning().handle_tracking_paid(id).await? {
        tracing::info!(tracking_id = %id, partner_id = %tracking.partner_id, "Partner service reactivated");
    }
    Ok(Json(tracking))
}
