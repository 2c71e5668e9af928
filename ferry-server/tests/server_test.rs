// Integration tests for the HTTP surface, run against a stub pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ferry_common::Credentials;
use ferry_flow::{AcquireOutcome, Artifact, FlowError, OrderReceipt, OrderRequest, ProcessingReason};
use ferry_server::{ExportService, FerryServer};

/// Stub pipeline with a scripted outcome per endpoint.
struct StubService {
    order: OrderOutcome,
    export: ExportOutcome,
}

enum OrderOutcome {
    Receipt { order_id: String, export_url: String },
    AuthFailure,
}

enum ExportOutcome {
    Ready { path: PathBuf, size: u64 },
    Processing(ProcessingReason),
}

#[async_trait]
impl ExportService for StubService {
    async fn create_order(
        &self,
        _request: OrderRequest,
        _credentials: Option<Credentials>,
    ) -> Result<OrderReceipt, FlowError> {
        match &self.order {
            OrderOutcome::Receipt {
                order_id,
                export_url,
            } => Ok(OrderReceipt {
                order_id: order_id.clone(),
                export_url: export_url.clone(),
            }),
            OrderOutcome::AuthFailure => Err(FlowError::Auth {
                email: "ops@example.com".to_string(),
            }),
        }
    }

    async fn fetch_export(
        &self,
        _export_url: &str,
        _credentials: Option<Credentials>,
    ) -> Result<AcquireOutcome, FlowError> {
        match &self.export {
            ExportOutcome::Ready { path, size } => Ok(AcquireOutcome::Ready(Artifact {
                path: path.clone(),
                size: *size,
            })),
            ExportOutcome::Processing(reason) => Ok(AcquireOutcome::Processing { reason: *reason }),
        }
    }
}

async fn start(service: StubService) -> (FerryServer, String) {
    let server = FerryServer::start("127.0.0.1", 0, Arc::new(service))
        .await
        .expect("server start");
    let base = format!("http://127.0.0.1:{}", server.port());
    (server, base)
}

fn processing_stub(reason: ProcessingReason) -> StubService {
    StubService {
        order: OrderOutcome::Receipt {
            order_id: "20617".to_string(),
            export_url: "https://vendor.example.com/orders/20617/download_export".to_string(),
        },
        export: ExportOutcome::Processing(reason),
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let (server, base) = start(processing_stub(ProcessingReason::StillGenerating)).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    server.shutdown();
}

#[tokio::test]
async fn creating_an_order_returns_its_receipt() {
    let (server, base) = start(processing_stub(ProcessingReason::StillGenerating)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/orders"))
        .json(&serde_json::json!({
            "lead_source_url": "https://network.example.com/in/someone",
            "leads_limit": 500
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["order_id"], "20617");
    assert_eq!(
        body["export_url"],
        "https://vendor.example.com/orders/20617/download_export"
    );

    server.shutdown();
}

#[tokio::test]
async fn rejected_sign_in_is_unauthorized() {
    let (server, base) = start(StubService {
        order: OrderOutcome::AuthFailure,
        export: ExportOutcome::Processing(ProcessingReason::StillGenerating),
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("{base}/orders"))
        .json(&serde_json::json!({
            "lead_source_url": "https://network.example.com/in/someone"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");

    server.shutdown();
}

#[tokio::test]
async fn finished_export_is_served_as_a_csv_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leads.csv");
    std::fs::write(&path, b"name,email\nada,ada@example.com\n").unwrap();
    let size = std::fs::metadata(&path).unwrap().len();

    let (server, base) = start(StubService {
        order: OrderOutcome::AuthFailure,
        export: ExportOutcome::Ready {
            path: path.clone(),
            size,
        },
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("{base}/exports"))
        .json(&serde_json::json!({
            "export_url": "https://vendor.example.com/orders/20617/download_export",
            "run_id": "run-42"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );
    assert_eq!(
        response.headers()["content-disposition"].to_str().unwrap(),
        "attachment; filename=\"lead_export_run-42.csv\""
    );
    assert_eq!(response.headers()["x-run-id"].to_str().unwrap(), "run-42");
    assert_eq!(
        response.headers()["x-file-size"].to_str().unwrap(),
        size.to_string()
    );

    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..], b"name,email\nada,ada@example.com\n");
    // The local copy is deleted once served.
    assert!(!path.exists());

    server.shutdown();
}

#[tokio::test]
async fn pending_export_is_accepted_not_failed() {
    let (server, base) = start(processing_stub(ProcessingReason::NoDownload)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/exports"))
        .json(&serde_json::json!({
            "export_url": "https://vendor.example.com/orders/20617/download_export"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "processing");
    assert_eq!(
        body["detail"],
        "no download occurred - likely still processing"
    );
    assert!(!body["run_id"].as_str().unwrap().is_empty());

    server.shutdown();
}
