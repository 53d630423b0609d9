//! Shared submission pipeline for every form endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::forms::{FormSubmission, SubmissionContext};
use crate::http::{AppState, ClientIdentity};
use crate::observability::metrics;
use crate::resilience::with_deadline;

const DATABASE_SERVICE: &str = "database";

/// Handle a submission for form `F` and record the outcome.
pub async fn submit_form<F: FormSubmission>(
    State(state): State<AppState>,
    identity: ClientIdentity,
    payload: Result<Json<F>, JsonRejection>,
) -> Response {
    let response = process::<F>(&state, identity, payload).await.into_response();
    metrics::record_request(F::ENDPOINT, response.status().as_u16());
    response
}

async fn process<F: FormSubmission>(
    state: &AppState,
    identity: ClientIdentity,
    payload: Result<Json<F>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    let ctx = SubmissionContext {
        reference: new_reference(F::ID_PREFIX),
        identity,
        received_at: Utc::now(),
    };
    let record = request.validate(&ctx)?;

    let row = serde_json::to_value(&record).map_err(|e| ApiError::Internal(e.to_string()))?;
    let table = F::table(&state.config.database);

    with_deadline(state.config.timeouts.upstream(), state.store.insert(table, row))
        .await
        .map_err(|e| {
            metrics::record_upstream_failure(DATABASE_SERVICE);
            ApiError::upstream(DATABASE_SERVICE, e)
        })?;

    tracing::info!(
        endpoint = %F::ENDPOINT,
        reference = %ctx.reference,
        client = %ctx.identity,
        "Submission stored"
    );

    // Persistence is authoritative; a dropped notification does not fail the request.
    state.outbox.enqueue(F::notification(&record));

    Ok(Json(json!({
        "success": true,
        "message": F::SUCCESS_MESSAGE,
        "data": {
            "id": ctx.reference,
            "received_at": ctx.received_at,
        },
    })))
}

/// `prefix` followed by eight uppercase hex characters.
fn new_reference(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", id[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_format() {
        let reference = new_reference("ENQ-");
        assert!(reference.starts_with("ENQ-"));
        assert_eq!(reference.len(), 12);
        assert!(reference[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_ne!(new_reference("ENQ-"), new_reference("ENQ-"));
    }
}
