// ================
// common/src/lib.rs
// ================
//! Wire-level types shared between the mock conferencing API server
//! and its clients: the vendor error envelope and the fixed projection
//! shapes that meetings, recordings and summaries are rendered into.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal header token every WebVTT transcript must start with.
pub const VTT_HEADER: &str = "WEBVTT";

/// Vendor-style error body: string HTTP code, human message, optional detail.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Top-level error envelope: `{"error": {"code": "...", ...}}`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                details,
            },
        }
    }
}

/// One entry in a meeting (or webinar) list response.
///
/// This is the reduced shape list endpoints return; the full stored
/// document carries far more fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeetingListEntry {
    pub uuid: String,
    pub id: String,
    pub host_id: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub meeting_type: i64,
    pub start_time: String,
    pub duration: i64,
    pub timezone: String,
    pub created_at: String,
    pub join_url: String,
}

/// Aggregated recording entry for a user's recording list: meeting
/// header fields plus size/count totals over its recording files.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RecordingSummary {
    pub uuid: String,
    pub id: String,
    pub host_id: String,
    pub topic: String,
    pub start_time: String,
    pub duration: i64,
    pub total_size: i64,
    pub recording_count: usize,
    pub recording_files: Vec<Value>,
}

/// The summary + transcript projection of a meeting document, with the
/// vendor's field renames applied and absent fields defaulted empty.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MeetingSummaryPayload {
    pub meeting_id: String,
    pub meeting_uuid: String,
    pub meeting_topic: String,
    pub summary_title: String,
    pub summary_overview: String,
    pub summary_details: Vec<String>,
    pub next_steps: Vec<String>,
    pub vtt_data: String,
}
