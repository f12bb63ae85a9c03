//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{SheetError, SheetResult};
use crate::excel::{Download, DuplicateHeaders, ImportSource, RowExporter, RowImporter};
use crate::types::{FieldMap, HeaderSpec, Record};

use super::server::AppState;

/// Date in the past sent as `Expires` so clients never cache an export
const EXPIRED: &str = "Mon, 26 Jul 1997 05:00:00 GMT";

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// HTTP status for a failed export or import
pub fn error_status(err: &SheetError) -> StatusCode {
    match err {
        SheetError::Config(_)
        | SheetError::UnsupportedFormat(_)
        | SheetError::DuplicateHeader(_)
        | SheetError::Json(_)
        | SheetError::Yaml(_) => StatusCode::BAD_REQUEST,
        SheetError::Load(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SheetError::Handler(_) | SheetError::Export(_) | SheetError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::err(message))).into_response()
}

fn sheet_error_response(err: SheetError) -> Response {
    let status = error_status(&err);
    warn!(status = %status, error = %err, "request failed");
    error_response(status, err.to_string())
}

/// Run blocking spreadsheet work off the async executor
async fn blocking<T, F>(work: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce() -> SheetResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(sheet_error_response(e)),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("worker failed: {}", e),
        )),
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> EndpointInfo {
    EndpointInfo {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Sheetport API Server".to_string(),
        version: state.version.clone(),
        description: "Bulk record import/export against .xls/.xlsx spreadsheets".to_string(),
        endpoints: vec![
            endpoint("/health", "GET", "Health check endpoint"),
            endpoint("/version", "GET", "Get server version"),
            endpoint("/api/v1/export", "POST", "Export records as an .xlsx attachment"),
            endpoint("/api/v1/import", "POST", "Import rows from a workbook on the server"),
            endpoint(
                "/api/v1/import/upload",
                "POST",
                "Import rows from an uploaded workbook (multipart)",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_message: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        uptime_message: "Server is running".to_string(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec![
            "export".to_string(),
            "import".to_string(),
            "import-upload".to_string(),
        ],
    }))
}

/// Export request
#[derive(Deserialize)]
pub struct ExportRequest {
    pub header: HeaderSpec,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub start_write_line: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

impl ExportRequest {
    /// Build the attachment; a template path is confined to the data root
    fn into_download(self, state: &AppState) -> SheetResult<Download> {
        let mut exporter = RowExporter::new(self.header, self.records);
        if let Some(line) = self.start_write_line {
            exporter = exporter.with_start_write_line(line)?;
        }
        if let Some(template) = self.template {
            exporter = exporter.with_template(state.resolve(&template)?);
        }
        if let Some(sheet_name) = self.sheet_name {
            exporter = exporter.with_sheet_name(sheet_name);
        }
        exporter.download(&self.name)
    }
}

/// Response headers for a workbook attachment
pub fn download_headers(download: &Download) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(download.content_type),
    );
    let disposition = format!("attachment;filename=\"{}\"", download.file_name);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("cache, must-revalidate"),
    );
    headers.insert(header::EXPIRES, HeaderValue::from_static(EXPIRED));
    let last_modified = chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    if let Ok(value) = HeaderValue::from_str(&last_modified) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    headers.insert(header::PRAGMA, HeaderValue::from_static("public"));
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Disposition"),
    );
    headers
}

/// POST /api/v1/export - Export records as an .xlsx attachment
pub async fn export(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Response {
    match blocking(move || req.into_download(&state)).await {
        Ok(download) => {
            let headers = download_headers(&download);
            (StatusCode::OK, headers, download.bytes).into_response()
        }
        Err(response) => response,
    }
}

/// Import request (workbook already on the server)
#[derive(Deserialize)]
pub struct ImportRequest {
    /// Path relative to the server's data root
    pub file_path: String,
    pub fields: FieldMap,
    #[serde(default)]
    pub start_read_line: Option<u32>,
    #[serde(default)]
    pub duplicate_headers: DuplicateHeaders,
}

/// Import response
#[derive(Serialize, Default)]
pub struct ImportResponse {
    pub source: String,
    pub count: usize,
    pub records: Vec<Record>,
}

fn read_source(
    source: ImportSource,
    fields: FieldMap,
    start_read_line: Option<u32>,
    duplicates: DuplicateHeaders,
) -> SheetResult<ImportResponse> {
    let name = source.name();
    let mut importer = RowImporter::new(source, fields)?.with_duplicate_headers(duplicates);
    if let Some(line) = start_read_line {
        importer = importer.with_start_read_line(line)?;
    }
    let records = importer.read_rows()?;
    Ok(ImportResponse {
        source: name,
        count: records.len(),
        records,
    })
}

/// POST /api/v1/import - Import rows from a workbook under the data root
pub async fn import_rows(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> Response {
    let work = move || {
        let source = ImportSource::Path(state.resolve(&req.file_path)?);
        read_source(source, req.fields, req.start_read_line, req.duplicate_headers)
    };

    match blocking(work).await {
        Ok(response) => Json(ApiResponse::ok(response)).into_response(),
        Err(response) => response,
    }
}

/// Parts collected from an upload form
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    fields: Option<FieldMap>,
    start_read_line: Option<u32>,
    duplicate_headers: DuplicateHeaders,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, Response> {
    let bad_request = |message: String| error_response(StatusCode::BAD_REQUEST, message);
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| bad_request(e.to_string()))?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            "fields" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                let fields: FieldMap = serde_json::from_str(&text)
                    .map_err(|e| bad_request(format!("invalid fields: {}", e)))?;
                form.fields = Some(fields);
            }
            "start_read_line" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                let line: u32 = text
                    .trim()
                    .parse()
                    .map_err(|e| bad_request(format!("invalid start_read_line: {}", e)))?;
                form.start_read_line = Some(line);
            }
            "duplicate_headers" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                form.duplicate_headers = match text.trim() {
                    "reject" => DuplicateHeaders::Reject,
                    "last_wins" => DuplicateHeaders::LastWins,
                    other => {
                        return Err(bad_request(format!(
                            "invalid duplicate_headers: {}",
                            other
                        )))
                    }
                };
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /api/v1/import/upload - Import rows from an uploaded workbook
pub async fn import_upload(multipart: Multipart) -> Response {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let Some((file_name, bytes)) = form.file else {
        return error_response(StatusCode::BAD_REQUEST, "missing 'file' part");
    };
    let fields = form.fields.unwrap_or_default();
    let source = ImportSource::upload(file_name, bytes);
    let (start_read_line, duplicates) = (form.start_read_line, form.duplicate_headers);

    match blocking(move || read_source(source, fields, start_read_line, duplicates)).await {
        Ok(response) => Json(ApiResponse::ok(response)).into_response(),
        Err(response) => response,
    }
}
