//! API integration tests, driving the router in-process

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sheetport::api::handlers::{ApiResponse, EndpointInfo, HealthResponse, VersionResponse};
use sheetport::api::router;
use sheetport::api::server::AppState;
use sheetport::excel::{ImportSource, RowImporter};
use sheetport::types::{CellValue, FieldMap};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn app() -> Router {
    app_in(Path::new("."))
}

fn app_in(data_root: &Path) -> Router {
    router(Arc::new(AppState::new("1.0.0", data_root).unwrap()))
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// RESPONSE TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_health_response_serialize() {
    let response = HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    };
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"status\":\"healthy\""));
}

#[test]
fn test_version_response_serialize() {
    let response = ApiResponse::ok(VersionResponse {
        version: "1.0.0".to_string(),
        features: vec!["export".to_string()],
    });
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"features\":[\"export\"]"));
    assert!(!json.contains("\"error\""));
}

#[test]
fn test_endpoint_info_serialize() {
    let info = EndpointInfo {
        path: "/api/v1/export".to_string(),
        method: "POST".to_string(),
        description: "Export".to_string(),
    };
    let json = serde_json::to_string(&info).unwrap();
    assert!(json.contains("\"path\":\"/api/v1/export\""));
}

// ═══════════════════════════════════════════════════════════════════════════
// ROUTES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_health_route() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = body_json(response).await;
    let paths: Vec<&str> = body["data"]["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert!(paths.contains(&"/api/v1/export"));
    assert!(paths.contains(&"/api/v1/import/upload"));
}

#[tokio::test]
async fn test_export_returns_attachment() {
    let request = json_request(
        "/api/v1/export",
        json!({
            "header": {"Name": "name", "Code": "code"},
            "records": [{"name": "Ada", "code": "007"}, {"name": "Grace", "code": 100}],
            "name": "staff"
        }),
    );
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment;filename=\"staff.xlsx\""
    );
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(headers[header::PRAGMA], "public");
    assert!(headers.contains_key(header::EXPIRES));
    assert!(headers.contains_key(header::LAST_MODIFIED));

    let bytes = body_bytes(response).await;
    let mut fields = FieldMap::new();
    fields.insert("Code".to_string(), "code".to_string());
    let rows = RowImporter::new(ImportSource::upload("staff.xlsx", bytes), fields)
        .unwrap()
        .read_rows()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["code"], CellValue::Text("007".to_string()));
    assert_eq!(rows[1]["code"], CellValue::Text("100".to_string()));
}

#[tokio::test]
async fn test_export_bad_start_line_is_bad_request() {
    let request = json_request(
        "/api/v1/export",
        json!({"header": {"Name": "name"}, "records": [], "start_write_line": 1}),
    );
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("start_write_line"));
}

#[tokio::test]
async fn test_import_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.xlsx");

    let export = json_request(
        "/api/v1/export",
        json!({"header": {"Name": "name"}, "records": [{"name": "Ada"}, {"name": "Linus"}]}),
    );
    let bytes = body_bytes(app().oneshot(export).await.unwrap()).await;
    std::fs::write(&path, bytes).unwrap();

    let request = json_request(
        "/api/v1/import",
        json!({"file_path": "people.xlsx", "fields": {"Name": "who"}}),
    );
    let response = app_in(dir.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["records"][1]["who"], "Linus");
}

#[tokio::test]
async fn test_import_path_outside_data_root() {
    let outer = TempDir::new().unwrap();
    let root = outer.path().join("data");
    std::fs::create_dir(&root).unwrap();

    let export = json_request(
        "/api/v1/export",
        json!({"header": {"Name": "name"}, "records": [{"name": "Ada"}]}),
    );
    let bytes = body_bytes(app().oneshot(export).await.unwrap()).await;
    std::fs::write(outer.path().join("secret.xlsx"), bytes).unwrap();

    for file_path in [
        "../secret.xlsx".to_string(),
        outer.path().join("secret.xlsx").display().to_string(),
    ] {
        let request = json_request(
            "/api/v1/import",
            json!({"file_path": file_path, "fields": {"Name": "name"}}),
        );
        let response = app_in(&root).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body.get("data").is_none());
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("outside the data root"));
    }
}

#[tokio::test]
async fn test_export_template_outside_data_root() {
    let outer = TempDir::new().unwrap();
    let root = outer.path().join("data");
    std::fs::create_dir(&root).unwrap();

    let request = json_request(
        "/api/v1/export",
        json!({"header": {"Name": "name"}, "records": [], "template": "../template.xlsx"}),
    );
    let response = app_in(&root).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_unsupported_format() {
    let request = json_request(
        "/api/v1/import",
        json!({"file_path": "people.csv", "fields": {"Name": "name"}}),
    );
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Unsupported"));
}

#[tokio::test]
async fn test_import_upload_multipart() {
    let export = json_request(
        "/api/v1/export",
        json!({"header": {"Name": "name", "Age": "age"}, "records": [{"name": "Ada", "age": 36}]}),
    );
    let workbook = body_bytes(app().oneshot(export).await.unwrap()).await;

    let boundary = "sheetport-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"fields\"\r\n\r\n{{\"Age\":\"age\"}}\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"people.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(&workbook);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/import/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["source"], "people.xlsx");
    assert_eq!(body["data"]["records"][0]["age"], "36");
    assert!(body["data"]["records"][0].get("name").is_none());
}

#[tokio::test]
async fn test_import_upload_without_file_part() {
    let boundary = "sheetport-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"fields\"\r\n\r\n{{}}\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/import/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
