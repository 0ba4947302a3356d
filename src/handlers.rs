// HTTP request handlers
//
// Implements the check-in endpoint and health/readiness checks

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use metrics::{counter, histogram};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::partition;
use crate::store::CheckinRow;
use crate::AppState;

/// POST /v1/checkin - record one attendance row in the current month's sheet
///
/// Parameters (`name`, `status`) may arrive in the query string or as a
/// urlencoded form body; body values win. Missing fields are recorded as
/// empty strings. Both outcomes are HTTP 200 with a JSON body: the original
/// webhook contract distinguishes success from failure only through the
/// `status` field, and callers depend on that.
pub(crate) async fn handle_checkin(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    body: axum::body::Bytes,
) -> Json<Value> {
    let start = Instant::now();
    counter!("checkin.requests").increment(1);

    match record_checkin(&state, query.as_deref(), &body).await {
        Ok(recorded) => {
            counter!("checkin.rows").increment(1);
            if recorded.sheet_created {
                counter!("checkin.sheets.created").increment(1);
            }
            histogram!("checkin.latency_ms").record(start.elapsed().as_secs_f64() * 1000.0);
            info!(
                sheet = %recorded.sheet,
                name = %recorded.name,
                status = %recorded.status,
                created = recorded.sheet_created,
                "Recorded check-in"
            );
            Json(json!({"status": "success"}))
        }
        Err(message) => {
            counter!("checkin.errors").increment(1);
            warn!(%message, "Check-in failed");
            Json(json!({"status": "error", "message": message}))
        }
    }
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// GET /ready - Readiness check (includes storage connectivity)
pub(crate) async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ready", "storage": "connected"})),
        ),
        Err(e) => {
            warn!("Storage readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(
                    json!({"status": "not ready", "storage": "disconnected", "error": e.to_string()}),
                ),
            )
        }
    }
}

struct Recorded {
    sheet: String,
    name: String,
    status: String,
    sheet_created: bool,
}

async fn record_checkin(
    state: &AppState,
    query: Option<&str>,
    body: &[u8],
) -> Result<Recorded, String> {
    let mut params = collect_params(query, body)?;
    let name = params.remove("name").unwrap_or_default();
    let status = params.remove("status").unwrap_or_default();

    let now = Local::now();
    let sheet = partition::month_key(&now);
    let row = CheckinRow {
        timestamp: partition::display_timestamp(&now),
        name: name.clone(),
        status: status.clone(),
    };

    let outcome = state
        .store
        .record(&sheet, &row)
        .await
        .map_err(|e| e.to_string())?;

    Ok(Recorded {
        sheet,
        name,
        status,
        sheet_created: outcome.sheet_created,
    })
}

/// Merge query-string and form-body parameters, body taking precedence.
fn collect_params(query: Option<&str>, body: &[u8]) -> Result<HashMap<String, String>, String> {
    let mut params: HashMap<String, String> = match query {
        Some(q) => {
            serde_urlencoded::from_str(q).map_err(|e| format!("invalid query string: {}", e))?
        }
        None => HashMap::new(),
    };

    if !body.is_empty() {
        let form: HashMap<String, String> =
            serde_urlencoded::from_bytes(body).map_err(|e| format!("invalid form body: {}", e))?;
        params.extend(form);
    }

    Ok(params)
}
