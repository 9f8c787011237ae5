//! Statement of accounts routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};

use freightbook_core::batch::BatchReport;
use freightbook_core::statement::{
    ExportFormat, RegenerationRequest, StatementOfAccounts, StatementPeriod, StatementSummary,
};
use freightbook_shared::AppError;
use freightbook_shared::types::{CustomerId, PageResponse, StatementId};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Actor;
use crate::routes::page_request;

/// Creates the statement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/statements/generate", post(generate))
        .route("/statements/bulk", post(bulk_generate))
        .route("/statements/latest", get(latest))
        .route("/statements/by-period", get(by_period))
        .route("/statements/{id}", get(get_statement).delete(delete_statement))
        .route("/statements/{id}/regenerate", post(regenerate))
        .route("/statements/{id}/replace", post(replace))
        .route("/statements/{id}/export", post(mark_exported))
        .route("/statements/{id}/send", post(send))
        .route("/customers/{customer_id}/statements", get(customer_statements))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for generating one statement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Customer the statement is for.
    pub customer_id: CustomerId,
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
}

/// Request body for bulk generation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkGenerateRequest {
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
    /// Customers to include; every customer when absent.
    pub customer_ids: Option<Vec<CustomerId>>,
}

/// Query parameters selecting a period.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQuery {
    /// First day of the period.
    pub start_date: NaiveDate,
    /// Last day of the period.
    pub end_date: NaiveDate,
}

/// Query parameters for paginated lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Request body for marking an export.
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    /// `pdf`, `csv` or `excel`.
    pub format: String,
}

/// Request body for sending a statement.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    /// Address to send to; the customer's e-mail address when absent.
    pub recipient: Option<String>,
}

fn period(start: NaiveDate, end: NaiveDate) -> Result<StatementPeriod, ApiError> {
    StatementPeriod::from_dates(start, end).map_err(|e| ApiError(AppError::from(e)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/statements/generate` - Generates and stores a statement.
async fn generate(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<StatementSummary>)> {
    let period = period(payload.start_date, payload.end_date)?;
    let summary = state
        .statements()
        .generate(payload.customer_id, period, actor)
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST `/statements/bulk` - Generates statements for many customers.
async fn bulk_generate(
    State(state): State<AppState>,
    Json(payload): Json<BulkGenerateRequest>,
) -> ApiResult<Json<BatchReport<CustomerId, StatementSummary>>> {
    let period = period(payload.start_date, payload.end_date)?;
    let report = state
        .statements()
        .bulk_generate(period, payload.customer_ids)
        .await?;
    Ok(Json(report))
}

/// GET `/statements/latest` - Newest statement per customer.
async fn latest(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let statements = state.statements().latest().await?;
    Ok(Json(json!({ "statements": statements })))
}

/// GET `/statements/by-period` - Statements lying inside a period.
async fn by_period(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Value>> {
    let period = period(query.start_date, query.end_date)?;
    let statements = state.statements().by_period(period).await?;
    Ok(Json(json!({ "statements": statements })))
}

/// GET `/statements/{id}` - One statement.
async fn get_statement(
    State(state): State<AppState>,
    Path(id): Path<StatementId>,
) -> ApiResult<Json<StatementOfAccounts>> {
    Ok(Json(state.statements().get(id).await?))
}

/// DELETE `/statements/{id}` - Soft deletes a statement.
async fn delete_statement(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<StatementId>,
) -> ApiResult<StatusCode> {
    state.statements().delete(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/statements/{id}/regenerate` - Invalidates a statement for regeneration.
async fn regenerate(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<StatementId>,
) -> ApiResult<Json<RegenerationRequest>> {
    Ok(Json(state.statements().regenerate(id, actor).await?))
}

/// POST `/statements/{id}/replace` - Invalidates and regenerates atomically.
async fn replace(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<StatementId>,
) -> ApiResult<(StatusCode, Json<StatementSummary>)> {
    let summary = state.statements().replace(id, actor).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// POST `/statements/{id}/export` - Records an export.
async fn mark_exported(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<StatementId>,
    Json(payload): Json<ExportRequest>,
) -> ApiResult<Json<StatementOfAccounts>> {
    let format = ExportFormat::parse(&payload.format).ok_or_else(|| {
        ApiError::validation(format!(
            "unknown export format '{}', expected pdf, csv or excel",
            payload.format
        ))
    })?;
    Ok(Json(state.statements().mark_exported(id, format, actor).await?))
}

/// POST `/statements/{id}/send` - Records that the statement was sent.
async fn send(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(id): Path<StatementId>,
    payload: Option<Json<SendRequest>>,
) -> ApiResult<Json<StatementOfAccounts>> {
    let recipient = payload.and_then(|Json(p)| p.recipient);
    Ok(Json(state.statements().send(id, recipient, actor).await?))
}

/// GET `/customers/{customer_id}/statements` - A customer's statements, newest first.
async fn customer_statements(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PageResponse<StatementOfAccounts>>> {
    let page = page_request(query.page, query.per_page);
    Ok(Json(state.statements().customer_statements(customer_id, page).await?))
}
