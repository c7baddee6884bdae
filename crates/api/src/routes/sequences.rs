//! Sequence configuration, preview, allocation and reset routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_core::numbering::{
    AllocatedNumber, AllocationRequest, DocumentSequence, DocumentType, NumberPreview,
    NumberingError, NumberingWarning, ResetFrequency, ResetOutcome, SequenceConfig,
    SequenceResetAudit,
};
use tally_shared::types::{ActorId, DocumentId, ListLimit, ResetAuditId, SequenceId};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{bad_request, error_response};
use crate::extractors::Actor;

/// Creates the sequence routes.
///
/// The `{sequence}` segment is a document type everywhere except `reset`,
/// which addresses the sequence by id.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sequences", get(list_sequences))
        .route("/sequences/{sequence}", put(configure_sequence))
        .route("/sequences/{sequence}/preview", get(preview_number))
        .route("/sequences/{sequence}/allocate", post(allocate_number))
        .route("/sequences/{sequence}/reset", post(reset_sequence))
        .route("/sequences/{sequence}/resets", get(list_resets))
}

/// Request body for creating or editing a sequence.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureSequenceRequest {
    /// Text placed before the number.
    #[serde(default)]
    pub prefix: String,
    /// Text placed after the number.
    #[serde(default)]
    pub suffix: String,
    /// Zero-pad width.
    pub number_length: u32,
    /// Optional `{prefix}`/`{number}`/`{suffix}` template.
    #[serde(default)]
    pub format_template: Option<String>,
    /// never, yearly, monthly or daily.
    #[serde(default)]
    pub reset_frequency: ResetFrequency,
    /// Whether the sequence accepts allocations.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// First number issued after a time-based reset.
    #[serde(default)]
    pub start_number: Option<i64>,
    /// Overwrites the live counter.
    #[serde(default)]
    pub current_number: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl From<ConfigureSequenceRequest> for SequenceConfig {
    fn from(request: ConfigureSequenceRequest) -> Self {
        Self {
            prefix: request.prefix,
            suffix: request.suffix,
            number_length: request.number_length,
            format_template: request.format_template,
            reset_frequency: request.reset_frequency,
            is_active: request.is_active,
            start_number: request.start_number,
            current_number: request.current_number,
        }
    }
}

/// Request body for allocating a number.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateNumberRequest {
    /// Business record the number is for.
    #[serde(default)]
    pub document_id: Option<DocumentId>,
}

/// Request body for an admin reset.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSequenceRequest {
    /// Next number the sequence should issue.
    pub new_start_number: i64,
    /// Must be true; the reset may reissue numbers.
    #[serde(default)]
    pub acknowledge_risk: bool,
}

/// Query parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// Maximum rows, clamped to 1..=500. Defaults to 50.
    pub limit: Option<u64>,
}

/// A non-fatal condition attached to a successful response.
#[derive(Debug, Serialize)]
pub struct WarningResponse {
    /// Upper-case warning code.
    pub code: &'static str,
    /// Human-readable explanation.
    pub message: String,
}

impl From<&NumberingWarning> for WarningResponse {
    fn from(warning: &NumberingWarning) -> Self {
        let message = match warning {
            NumberingWarning::NumberLengthExceeded {
                number_length,
                digits,
                numeric_value,
                ..
            } => format!(
                "{numeric_value} has {digits} digits, wider than the configured {number_length}"
            ),
            NumberingWarning::DuplicateRisk {
                new_start_number,
                highest_in_period,
                ..
            } => format!(
                "numbers up to {highest_in_period} were already issued this period; \
                 restarting at {new_start_number} may issue duplicates"
            ),
            NumberingWarning::AuditGap { detail, .. } => detail.clone(),
        };
        Self {
            code: warning.code(),
            message,
        }
    }
}

fn warnings(warnings: &[NumberingWarning]) -> Vec<WarningResponse> {
    warnings.iter().map(WarningResponse::from).collect()
}

/// Response for a sequence.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResponse {
    /// Sequence id, used by the reset route.
    pub id: SequenceId,
    /// Sequence key.
    pub document_type: DocumentType,
    /// Text placed before the number.
    pub prefix: String,
    /// Text placed after the number.
    pub suffix: String,
    /// Last number issued.
    pub current_number: i64,
    /// First number issued after a time-based reset.
    pub start_number: i64,
    /// Zero-pad width.
    pub number_length: u32,
    /// Format template, if any.
    pub format_template: Option<String>,
    /// Reset cadence.
    pub reset_frequency: ResetFrequency,
    /// When the counter last restarted.
    pub last_reset_date: Option<DateTime<Utc>>,
    /// Whether the sequence accepts allocations.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentSequence> for SequenceResponse {
    fn from(sequence: DocumentSequence) -> Self {
        Self {
            id: sequence.id,
            document_type: sequence.document_type,
            prefix: sequence.prefix,
            suffix: sequence.suffix,
            current_number: sequence.current_number,
            start_number: sequence.start_number,
            number_length: sequence.number_length,
            format_template: sequence.format_template,
            reset_frequency: sequence.reset_frequency,
            last_reset_date: sequence.last_reset_date,
            is_active: sequence.is_active,
            created_at: sequence.created_at,
            updated_at: sequence.updated_at,
        }
    }
}

/// Response for a preview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Sequence key.
    pub document_type: DocumentType,
    /// What the next allocation would return right now.
    pub preview_number: String,
    /// Numeric part.
    pub numeric_value: i64,
    /// Whether the next allocation restarts the counter.
    pub reset_pending: bool,
    /// Warnings the allocation would raise.
    pub warnings: Vec<WarningResponse>,
}

impl From<NumberPreview> for PreviewResponse {
    fn from(preview: NumberPreview) -> Self {
        Self {
            warnings: warnings(&preview.warnings),
            document_type: preview.document_type,
            preview_number: preview.preview_number,
            numeric_value: preview.numeric_value,
            reset_pending: preview.reset_pending,
        }
    }
}

/// Response for an allocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    /// Sequence key.
    pub document_type: DocumentType,
    /// Formatted number.
    pub full_document_number: String,
    /// Numeric part.
    pub numeric_value: i64,
    /// Whether this allocation restarted the counter.
    pub reset_applied: bool,
    /// Non-fatal conditions.
    pub warnings: Vec<WarningResponse>,
}

impl From<AllocatedNumber> for AllocationResponse {
    fn from(allocated: AllocatedNumber) -> Self {
        Self {
            warnings: warnings(&allocated.warnings),
            document_type: allocated.document_type,
            full_document_number: allocated.full_document_number,
            numeric_value: allocated.numeric_value,
            reset_applied: allocated.reset_applied,
        }
    }
}

/// Response for an admin reset.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    /// Sequence key.
    pub document_type: DocumentType,
    /// Counter value before the reset.
    pub previous_number: i64,
    /// Next number the sequence will issue.
    pub new_start_number: i64,
    /// Non-fatal conditions.
    pub warnings: Vec<WarningResponse>,
}

impl From<ResetOutcome> for ResetResponse {
    fn from(outcome: ResetOutcome) -> Self {
        Self {
            warnings: warnings(&outcome.warnings),
            document_type: outcome.document_type,
            previous_number: outcome.previous_number,
            new_start_number: outcome.new_start_number,
        }
    }
}

/// Response for one reset audit row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetAuditResponse {
    /// Audit row id.
    pub id: ResetAuditId,
    /// Sequence key.
    pub document_type: DocumentType,
    /// Counter value overwritten.
    pub previous_number: i64,
    /// Next number after the reset.
    pub new_start_number: i64,
    /// Whether the reset may reissue numbers.
    pub duplicate_risk: bool,
    /// Highest number issued in the period at reset time.
    pub highest_in_period: Option<i64>,
    /// Operator who reset.
    pub reset_by: Option<ActorId>,
    /// When.
    pub reset_at: DateTime<Utc>,
}

impl From<SequenceResetAudit> for ResetAuditResponse {
    fn from(audit: SequenceResetAudit) -> Self {
        Self {
            id: audit.id,
            document_type: audit.document_type,
            previous_number: audit.previous_number,
            new_start_number: audit.new_start_number,
            duplicate_risk: audit.duplicate_risk,
            highest_in_period: audit.highest_in_period,
            reset_by: audit.reset_by,
            reset_at: audit.reset_at,
        }
    }
}

fn parse_document_type(raw: &str) -> Result<DocumentType, Response> {
    DocumentType::parse(raw).map_err(|e| error_response(&e))
}

/// GET `/sequences` - List sequences with their live counters.
async fn list_sequences(State(state): State<AppState>) -> Response {
    match state.numbering.list_sequences().await {
        Ok(sequences) => {
            let response: Vec<SequenceResponse> =
                sequences.into_iter().map(SequenceResponse::from).collect();
            (StatusCode::OK, Json(json!({ "sequences": response }))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// PUT `/sequences/{document_type}` - Create or edit a sequence.
async fn configure_sequence(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(payload): Json<ConfigureSequenceRequest>,
) -> Response {
    let document_type = match parse_document_type(&raw) {
        Ok(document_type) => document_type,
        Err(response) => return response,
    };

    let config = SequenceConfig::from(payload);
    match state.numbering.configure(&document_type, &config).await {
        Ok(sequence) => (StatusCode::OK, Json(SequenceResponse::from(sequence))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET `/sequences/{document_type}/preview` - Preview the next number.
async fn preview_number(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let document_type = match parse_document_type(&raw) {
        Ok(document_type) => document_type,
        Err(response) => return response,
    };

    match state.numbering.preview(&document_type).await {
        Ok(preview) => (StatusCode::OK, Json(PreviewResponse::from(preview))).into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST `/sequences/{document_type}/allocate` - Allocate the next number.
///
/// A contended allocation is retried once before the conflict is returned.
async fn allocate_number(
    State(state): State<AppState>,
    actor: Actor,
    Path(raw): Path<String>,
    payload: Result<Option<Json<AllocateNumberRequest>>, JsonRejection>,
) -> Response {
    let document_type = match parse_document_type(&raw) {
        Ok(document_type) => document_type,
        Err(response) => return response,
    };
    // A request without a Content-Type carries no body.
    let document_id = match payload {
        Ok(payload) => payload.and_then(|Json(body)| body.document_id),
        Err(rejection) => return bad_request("invalid_body", rejection.body_text()),
    };

    let request = AllocationRequest {
        document_type,
        document_id,
        actor: actor.id(),
    };

    let result = match state.numbering.allocate(&request).await {
        Err(NumberingError::Contention { attempts, .. }) => {
            warn!(
                document_type = %request.document_type,
                attempts,
                "Allocation contended, retrying once"
            );
            state.numbering.allocate(&request).await
        }
        other => other,
    };

    match result {
        Ok(allocated) => {
            (StatusCode::CREATED, Json(AllocationResponse::from(allocated))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// POST `/sequences/{id}/reset` - Reset a sequence's counter.
async fn reset_sequence(
    State(state): State<AppState>,
    actor: Actor,
    Path(raw): Path<String>,
    Json(payload): Json<ResetSequenceRequest>,
) -> Response {
    let Ok(id) = raw.parse::<SequenceId>() else {
        return bad_request("invalid_sequence_id", "Sequence id must be a UUID");
    };

    match state
        .numbering
        .reset_by_id(
            id,
            payload.new_start_number,
            actor.id(),
            payload.acknowledge_risk,
        )
        .await
    {
        Ok(outcome) => {
            info!(
                sequence_id = %id,
                document_type = %outcome.document_type,
                new_start_number = outcome.new_start_number,
                "Sequence reset via API"
            );
            (StatusCode::OK, Json(ResetResponse::from(outcome))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// GET `/sequences/{document_type}/resets` - List admin resets, most recent first.
async fn list_resets(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let document_type = match parse_document_type(&raw) {
        Ok(document_type) => document_type,
        Err(response) => return response,
    };

    let limit = query.limit.map_or_else(ListLimit::default, ListLimit::new);
    match state.numbering.resets(&document_type, limit).await {
        Ok(resets) => {
            let response: Vec<ResetAuditResponse> =
                resets.into_iter().map(ResetAuditResponse::from).collect();
            (StatusCode::OK, Json(json!({ "resets": response }))).into_response()
        }
        Err(e) => error_response(&e),
    }
}
