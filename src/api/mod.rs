//! Sheetport API Server module
//!
//! HTTP transport for exports (workbook attachments) and imports (JSON records).
//! Run with `sheetport serve` or `sheetport-server`.

pub mod handlers;
pub mod server;

pub use server::{router, run_api_server};
