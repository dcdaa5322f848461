//! Health check outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TargetId;

/// Result of a single probe. Never edited after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub target_id: TargetId,
    pub checked_at: DateTime<Utc>,
    /// Absent when no response was received
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub is_success: bool,
    pub error_message: Option<String>,
}

impl CheckResult {
    /// A probe that received a response
    pub fn responded(
        target_id: TargetId,
        checked_at: DateTime<Utc>,
        status_code: u16,
        expected_status: u16,
        response_time_ms: u64,
    ) -> Self {
        Self {
            target_id,
            checked_at,
            status_code: Some(status_code),
            response_time_ms,
            is_success: status_code == expected_status,
            error_message: None,
        }
    }

    /// A probe that failed before a response arrived
    pub fn failed(
        target_id: TargetId,
        checked_at: DateTime<Utc>,
        response_time_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            target_id,
            checked_at,
            status_code: None,
            response_time_ms,
            is_success: false,
            error_message: Some(error.into()),
        }
    }
}
