//! Sheetport API Server binary
//!
//! HTTP API for record export (workbook attachments) and import (JSON records).

use clap::Parser;
use sheetport::api::{run_api_server, server::ApiConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetport-server")]
#[command(version)]
#[command(about = "Sheetport API Server - record export/import over HTTP")]
#[command(long_about = r#"
Sheetport API Server

Endpoints:
  - POST /api/v1/export         - Records + header spec → .xlsx attachment
  - POST /api/v1/import         - Workbook path (under --data-root) + field map → JSON records
  - POST /api/v1/import/upload  - Multipart upload (file, fields) → JSON records

Additional endpoints:
  - GET  /health                - Health check
  - GET  /version               - Server version info
  - GET  /                      - API documentation

Features:
  - CORS enabled for cross-origin requests
  - Graceful shutdown on SIGINT/SIGTERM
  - JSON response format with request IDs
  - Tracing and structured logging (RUST_LOG)

Example usage:
  sheetport-server                           # Start on localhost:8080
  sheetport-server --host 0.0.0.0 --port 3000
  sheetport-server --data-root /srv/workbooks   # imports/templates resolve here

  curl -X POST http://localhost:8080/api/v1/export \
    -H "Content-Type: application/json" \
    -d '{"header": {"Name": "name"}, "records": [{"name": "Ada"}], "name": "people"}' \
    -o people.xlsx
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SHEETPORT_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SHEETPORT_PORT")]
    port: u16,

    /// Directory that request file paths are confined to
    #[arg(long, default_value = ".", env = "SHEETPORT_DATA_ROOT")]
    data_root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        data_root: args.data_root,
    };

    run_api_server(config).await
}
