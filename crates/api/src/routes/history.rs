//! Issued-number history route.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_core::numbering::{DocumentNumberHistory, DocumentType};
use tally_shared::types::{ActorId, DocumentId, HistoryEntryId, ListLimit};

use crate::AppState;
use crate::error::error_response;

/// Creates the history routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/history", get(list_history))
}

/// Query parameters for the history listing.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum rows, clamped to 1..=500. Defaults to 50.
    pub limit: Option<u64>,
    /// Restricts the listing to one sequence.
    pub document_type: Option<String>,
}

/// Response for one issued number.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    /// Row id.
    pub id: HistoryEntryId,
    /// Sequence key.
    pub document_type: DocumentType,
    /// Business record the number was issued for.
    pub document_id: Option<DocumentId>,
    /// Numeric part.
    pub generated_number: i64,
    /// Formatted number.
    pub full_document_number: String,
    /// Operator; absent means the system.
    pub generated_by: Option<ActorId>,
    /// Issue time.
    pub generated_date: DateTime<Utc>,
}

impl From<DocumentNumberHistory> for HistoryEntryResponse {
    fn from(entry: DocumentNumberHistory) -> Self {
        Self {
            id: entry.id,
            document_type: entry.document_type,
            document_id: entry.document_id,
            generated_number: entry.generated_number,
            full_document_number: entry.full_document_number,
            generated_by: entry.generated_by,
            generated_date: entry.generated_date,
        }
    }
}

/// GET `/history` - List issued numbers, most recent first.
async fn list_history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Response {
    let document_type = match query.document_type.as_deref().map(DocumentType::parse) {
        None => None,
        Some(Ok(document_type)) => Some(document_type),
        Some(Err(e)) => return error_response(&e),
    };
    let limit = query.limit.map_or_else(ListLimit::default, ListLimit::new);

    match state.numbering.history(limit, document_type.as_ref()).await {
        Ok(entries) => {
            let response: Vec<HistoryEntryResponse> =
                entries.into_iter().map(HistoryEntryResponse::from).collect();
            (StatusCode::OK, Json(json!({ "history": response }))).into_response()
        }
        Err(e) => error_response(&e),
    }
}
