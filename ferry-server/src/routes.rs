//! Request handlers and wire types.

use axum::body::Body;
use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use ferry_common::Credentials;
use ferry_flow::{AcquireOutcome, FlowError, OrderRequest};
use ferry_watch::WatchError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ServiceHandle;

/// Body of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub lead_source_url: String,
    #[serde(default)]
    pub leads_limit: Option<u32>,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Overrides the configured vendor account for this request only.
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// Body of `POST /exports`.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchExportRequest {
    pub export_url: String,
    /// Caller-supplied correlation id; generated when absent.
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

/// `202 Accepted` body while the vendor is still generating the export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResponse {
    pub status: String,
    pub detail: String,
    pub run_id: String,
    pub export_url: String,
}

pub(crate) async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// POST /orders — sign in and place a lead-search order.
pub(crate) async fn create_order(
    State(service): State<ServiceHandle>,
    Json(body): Json<CreateOrderRequest>,
) -> Response {
    let request = OrderRequest {
        lead_source_url: body.lead_source_url,
        leads_limit: body.leads_limit,
        auth_token: body.auth_token,
    };
    match service.create_order(request, body.credentials).await {
        Ok(receipt) => {
            info!(target: "server", order_id = %receipt.order_id, "order created");
            Json(receipt).into_response()
        }
        Err(err) => flow_error_response(err),
    }
}

/// POST /exports — pull a finished export or report it as processing.
pub(crate) async fn fetch_export(
    State(service): State<ServiceHandle>,
    Json(body): Json<FetchExportRequest>,
) -> Response {
    let run_id = body
        .run_id
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    match service.fetch_export(&body.export_url, body.credentials).await {
        Ok(AcquireOutcome::Ready(artifact)) => {
            let file = match tokio::fs::File::open(&artifact.path).await {
                Ok(file) => file,
                Err(err) => {
                    error!(target: "server", %run_id, "export vanished before serving: {err}");
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "export file could not be read",
                    );
                }
            };
            // Unlink now; the open handle keeps the bytes readable until
            // the stream finishes, and the local copy is not needed again.
            if let Err(err) = tokio::fs::remove_file(&artifact.path).await {
                warn!(target: "server", %run_id, "could not remove served export: {err}");
            }

            info!(target: "server", %run_id, size = artifact.size, "export served");
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
            if let Ok(value) = artifact.size.to_string().parse() {
                headers.insert(header::CONTENT_LENGTH, value);
            }
            if let Ok(value) =
                format!("attachment; filename=\"lead_export_{run_id}.csv\"").parse()
            {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            if let Ok(value) = run_id.parse() {
                headers.insert("x-run-id", value);
            }
            if let Ok(value) = artifact.size.to_string().parse() {
                headers.insert("x-file-size", value);
            }
            let stream = Body::from_stream(ReaderStream::new(file));
            (StatusCode::OK, headers, stream).into_response()
        }
        Ok(AcquireOutcome::Processing { reason }) => {
            info!(target: "server", %run_id, ?reason, "export still processing");
            (
                StatusCode::ACCEPTED,
                Json(ProcessingResponse {
                    status: "processing".to_string(),
                    detail: reason.detail().to_string(),
                    run_id,
                    export_url: body.export_url,
                }),
            )
                .into_response()
        }
        Err(err) => flow_error_response(err),
    }
}

fn error_response(status: StatusCode, detail: &str) -> Response {
    (
        status,
        Json(json!({ "status": "error", "detail": detail })),
    )
        .into_response()
}

/// Map pipeline failures onto HTTP statuses. Soft "still processing"
/// states never reach here; these are real faults.
fn flow_error_response(err: FlowError) -> Response {
    error!(target: "server", "request failed: {err}");
    match &err {
        FlowError::Auth { .. } => error_response(StatusCode::UNAUTHORIZED, &err.to_string()),
        FlowError::MissingOrderId => error_response(StatusCode::BAD_GATEWAY, &err.to_string()),
        FlowError::Config(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
        FlowError::Watch(WatchError::EmptyArtifact { .. }) => {
            error_response(StatusCode::BAD_GATEWAY, &err.to_string())
        }
        FlowError::Watch(WatchError::Cancelled) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
        FlowError::Watch(_) | FlowError::Driver(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}
