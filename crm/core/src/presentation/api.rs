// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! JSON routes over the document workflow and SMS confirmation services.
//! Confirmation codes never appear in responses; clients receive them by SMS
//! only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::{
    sms_confirmation_service::ResendOutcome, DocumentWorkflowService, ServiceError,
    SmsConfirmationService,
};
use crate::domain::deal::DealId;
use crate::domain::document::{DocumentId, DocumentType, NewDocument};
use crate::domain::lead::LeadId;
use crate::domain::sms_confirmation::{ConfirmationId, SmsConfirmation};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

pub struct AppState {
    pub documents: Arc<dyn DocumentWorkflowService>,
    pub confirmations: Arc<dyn SmsConfirmationService>,
    pub start_time: Instant,
}

pub fn app(
    documents: Arc<dyn DocumentWorkflowService>,
    confirmations: Arc<dyn SmsConfirmationService>,
) -> Router {
    let state = Arc::new(AppState {
        documents,
        confirmations,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/documents", post(create_document).get(list_documents))
        .route("/documents/from-lead", post(create_document_from_lead))
        .route("/documents/deal/{deal_id}", get(list_documents_by_deal))
        .route("/documents/{id}", get(get_document).delete(delete_document))
        .route("/documents/{id}/verify", put(verify_document))
        .route("/documents/{id}/confirm/{code}", post(confirm_document))
        .route("/sms/send", post(send_sms))
        .route("/sms/resend", get(resend_sms))
        .route("/sms/confirm", post(confirm_code))
        .route(
            "/sms/{document_id}",
            get(latest_confirmation).delete(delete_confirmations),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// `ServiceError` as an HTTP response
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": self.0.to_string() })),
            ServiceError::ConfirmationFailed(reason) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.0.to_string(), "reason": reason }),
            ),
            err if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
            }
            err => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Payloads
// ============================================================================

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    pub deal_id: i64,
    pub doc_type: String,
    pub file_path: String,
}

#[derive(Deserialize)]
pub struct FromLeadRequest {
    pub lead_id: i64,
    pub doc_type: String,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct SendSmsRequest {
    pub document_id: i64,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct ResendQuery {
    pub document_id: i64,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmCodeRequest {
    pub document_id: i64,
    pub code: String,
}

/// Confirmation record as exposed to clients, without the code
#[derive(Debug, Serialize)]
pub struct ConfirmationView {
    pub id: ConfirmationId,
    pub document_id: DocumentId,
    pub phone: String,
    pub sent_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<&SmsConfirmation> for ConfirmationView {
    fn from(record: &SmsConfirmation) -> Self {
        Self {
            id: record.id,
            document_id: record.document_id,
            phone: record.phone.clone(),
            sent_at: record.sent_at,
            expires_at: record.expires_at(),
            confirmed: record.confirmed,
            confirmed_at: record.confirmed_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn create_document(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    let document = NewDocument::new(
        DealId(payload.deal_id),
        DocumentType::from(payload.doc_type.as_str()),
        payload.file_path,
    );

    let id = state.documents.create_document(document).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = page.offset.unwrap_or(0).max(0);
    let documents = state.documents.list_documents(limit, offset).await?;
    Ok(Json(documents))
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.documents.get_document(DocumentId(id)).await?))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.documents.delete_document(DocumentId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let document = state.documents.verify_document(DocumentId(id)).await?;
    Ok((StatusCode::ACCEPTED, Json(document)))
}

async fn confirm_document(
    State(state): State<Arc<AppState>>,
    Path((id, code)): Path<(i64, String)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.documents.confirm_document(DocumentId(id), &code).await?))
}

async fn list_documents_by_deal(
    State(state): State<Arc<AppState>>,
    Path(deal_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.documents.list_documents_by_deal(DealId(deal_id)).await?))
}

async fn create_document_from_lead(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FromLeadRequest>,
) -> ApiResult<impl IntoResponse> {
    let document = state
        .documents
        .create_document_from_lead(
            LeadId(payload.lead_id),
            DocumentType::from(payload.doc_type.as_str()),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn send_sms(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SendSmsRequest>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .confirmations
        .send_sms(DocumentId(payload.document_id), &payload.phone)
        .await?;
    Ok(Json(ConfirmationView::from(&record)))
}

async fn resend_sms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResendQuery>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .confirmations
        .resend_sms(DocumentId(query.document_id), query.phone.as_deref())
        .await?;
    let action = match outcome {
        ResendOutcome::Issued(_) => "issued",
        ResendOutcome::Redelivered(_) => "redelivered",
    };
    Ok(Json(json!({
        "action": action,
        "confirmation": ConfirmationView::from(outcome.confirmation()),
    })))
}

async fn confirm_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmCodeRequest>,
) -> ApiResult<Response> {
    let confirmed = state
        .confirmations
        .confirm_code(DocumentId(payload.document_id), &payload.code)
        .await?;
    let response = if confirmed {
        (StatusCode::OK, Json(json!({ "confirmed": true }))).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "confirmed": false, "error": "invalid or expired code" })),
        )
            .into_response()
    };
    Ok(response)
}

async fn latest_confirmation(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .confirmations
        .get_latest_by_document_id(DocumentId(document_id))
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("confirmation for document {}", document_id)))?;
    Ok(Json(ConfirmationView::from(&record)))
}

async fn delete_confirmations(
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state
        .confirmations
        .delete_confirmation(DocumentId(document_id))
        .await?;
    Ok(Json(json!({ "deleted": deleted })))
}
