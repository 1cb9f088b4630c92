//! JSON response envelopes
//!
//! ```json
//! { "success": true,  "data": ..., "count": 3, "timestamp": "..." }
//! { "success": false, "error": "Failed to fetch packages", "message": "..." }
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
    pub message: String,
}

/// Wrap `data`; `count` is set for list-shaped payloads only
pub fn success<T: Serialize>(data: T, count: Option<usize>) -> Success<T> {
    Success {
        success: true,
        data,
        count,
        timestamp: Utc::now(),
    }
}

pub fn failure(error: &str, message: impl ToString) -> Failure {
    Failure {
        success: false,
        error: error.to_string(),
        message: message.to_string(),
    }
}

/// Print an envelope as pretty JSON on stdout
pub fn print<T: Serialize>(envelope: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}
