//! Response envelopes

use serde::Serialize;

use yield_core::now_ms;

/// `{success, timestamp, count?, data}` on success, `{success, error}` on failure
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            timestamp: Some(now_ms()),
            count: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            timestamp: None,
            count: None,
            data: None,
            error: Some(msg),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub broadcasting: bool,
    pub subscribers: usize,
    pub protocols: usize,
    pub failing_protocols: Vec<String>,
    pub supported_assets: usize,
    pub cycle_count: u64,
    pub last_cycle_age_ms: Option<u64>,
}
