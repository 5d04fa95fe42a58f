// ============================
// confmock-backend-lib/src/views.rs
// ============================
//! Derived views over stored documents.
//!
//! Stored documents are the single source of truth; list entries,
//! recording summaries and transcript payloads are projected from them
//! on read, never stored. Date filters compare ISO-8601 strings
//! lexicographically, which is ordering-correct for this format.
use confmock_common::{MeetingListEntry, MeetingSummaryPayload, RecordingSummary, VTT_HEADER};
use serde_json::Value;

pub(crate) fn str_of(doc: &Value, key: &str) -> String {
    doc.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

pub(crate) fn i64_of(doc: &Value, key: &str) -> i64 {
    doc.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Guarantee the `WEBVTT` magic header. Idempotent.
pub fn ensure_webvtt(vtt: &str) -> String {
    let trimmed = vtt.trim_start();
    if trimmed
        .get(..VTT_HEADER.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(VTT_HEADER))
    {
        vtt.to_string()
    } else {
        format!("{VTT_HEADER}\n\n{vtt}")
    }
}

/// Project a stored meeting into its list-entry shape.
pub fn meeting_list_entry(doc: &Value) -> MeetingListEntry {
    MeetingListEntry {
        uuid: str_of(doc, "uuid"),
        id: str_of(doc, "id"),
        host_id: str_of(doc, "host_id"),
        topic: str_of(doc, "topic"),
        meeting_type: i64_of(doc, "type"),
        start_time: str_of(doc, "start_time"),
        duration: i64_of(doc, "duration"),
        timezone: str_of(doc, "timezone"),
        created_at: str_of(doc, "created_at"),
        join_url: str_of(doc, "join_url"),
    }
}

/// Heavy internal fields stripped from meeting detail responses.
const MEETING_DETAIL_EXCLUDED: &[&str] = &["summary", "vtt_data", "participants", "recording_files"];

/// Meeting document as served by the detail endpoints: the stored
/// fields minus transcript, summary, participants and recordings,
/// which have their own endpoints.
pub fn meeting_detail(doc: &Value) -> Value {
    match doc {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !MEETING_DETAIL_EXCLUDED.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Webinar detail: stored fields minus participants.
pub fn webinar_detail(doc: &Value) -> Value {
    match doc {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "participants")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Meetings whose full `start_time` falls inside `[from, to]`
/// (inclusive; `to` is widened to end of day).
pub fn meetings_in_window(docs: &[Value], from: &str, to: &str) -> Vec<MeetingListEntry> {
    let to_end = format!("{to}T23:59:59");
    docs.iter()
        .filter(|doc| {
            let start = str_of(doc, "start_time");
            !start.is_empty() && start.as_str() >= from && start <= to_end
        })
        .map(meeting_list_entry)
        .collect()
}

/// Recording summary for one meeting document. `None` when the
/// meeting has no recording files.
pub fn recording_summary(doc: &Value) -> Option<RecordingSummary> {
    let files = doc.get("recording_files")?.as_array()?;
    if files.is_empty() {
        return None;
    }
    let total_size = files.iter().map(|file| i64_of(file, "file_size")).sum();
    Some(RecordingSummary {
        uuid: str_of(doc, "uuid"),
        id: str_of(doc, "id"),
        host_id: str_of(doc, "host_id"),
        topic: str_of(doc, "topic"),
        start_time: str_of(doc, "start_time"),
        duration: i64_of(doc, "duration"),
        total_size,
        recording_count: files.len(),
        recording_files: files.clone(),
    })
}

/// True when `start_time`'s date component falls inside `[from, to]`.
fn date_in_window(doc: &Value, from: &str, to: &str) -> bool {
    let start = str_of(doc, "start_time");
    let date = start.get(..10).unwrap_or("");
    !date.is_empty() && date >= from && date <= to
}

/// Recording summaries for meetings recorded inside the day window.
/// Meetings without recording files are skipped.
pub fn recordings_in_window(docs: &[Value], from: &str, to: &str) -> Vec<RecordingSummary> {
    docs.iter()
        .filter(|doc| date_in_window(doc, from, to))
        .filter_map(recording_summary)
        .collect()
}

/// Webinars whose start date falls inside the day window.
pub fn webinars_in_window(docs: &[Value], from: &str, to: &str) -> Vec<MeetingListEntry> {
    docs.iter()
        .filter(|doc| date_in_window(doc, from, to))
        .map(meeting_list_entry)
        .collect()
}

/// AI-summary payload for a meeting, transcript header normalized.
pub fn meeting_summary_payload(doc: &Value) -> MeetingSummaryPayload {
    let summary = doc.get("summary").cloned().unwrap_or(Value::Null);
    let list_of = |key: &str| -> Vec<String> {
        summary
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };
    MeetingSummaryPayload {
        meeting_id: str_of(doc, "id"),
        meeting_uuid: str_of(doc, "uuid"),
        meeting_topic: str_of(doc, "topic"),
        summary_title: str_of(&summary, "summary_title"),
        summary_overview: str_of(&summary, "summary_overview"),
        summary_details: list_of("summary_details"),
        next_steps: list_of("next_steps"),
        vtt_data: ensure_webvtt(&str_of(doc, "vtt_data")),
    }
}

/// Transcript text for a meeting, header normalized. `None` when the
/// meeting carries no transcript.
pub fn vtt_for_meeting(doc: &Value) -> Option<String> {
    let vtt = doc.get("vtt_data")?.as_str()?;
    if vtt.is_empty() {
        return None;
    }
    Some(ensure_webvtt(vtt))
}

/// Participants array of a meeting or webinar document.
pub fn participants_of(doc: &Value) -> Vec<Value> {
    doc.get("participants")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Meeting IDs a user's recordings derive from: dedicated
/// `recording_meeting_ids` when present, else all meeting IDs.
pub fn recording_meeting_ids(user: &Value) -> Vec<String> {
    let list = user
        .get("recording_meeting_ids")
        .and_then(Value::as_array)
        .filter(|ids| !ids.is_empty())
        .or_else(|| user.get("meeting_ids").and_then(Value::as_array));
    list.map(|ids| {
        ids.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// String-array field of a document, absent read as empty.
pub fn id_list(doc: &Value, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meeting(id: &str, start_time: &str) -> Value {
        json!({
            "uuid": id,
            "id": id,
            "host_id": "u1",
            "topic": format!("Topic {id}"),
            "type": 2,
            "start_time": start_time,
            "duration": 60,
            "timezone": "UTC",
            "created_at": start_time,
            "join_url": format!("https://api.zoom.us/j/{id}"),
            "summary": {"summary_title": "T", "summary_overview": "O",
                        "summary_details": ["d1"], "next_steps": ["n1"]},
            "vtt_data": "00:00:00 --> 00:01:00 hello",
            "participants": [{"id": "p1"}],
            "recording_files": [
                {"id": "r1", "file_size": 100},
                {"id": "r2", "file_size": 250},
            ],
        })
    }

    #[test]
    fn test_ensure_webvtt_is_idempotent() {
        let fixed = ensure_webvtt("00:00:00 --> 00:01:00 hi");
        assert!(fixed.starts_with("WEBVTT\n\n"));
        assert_eq!(ensure_webvtt(&fixed), fixed);
        // case-insensitive header detection
        assert_eq!(ensure_webvtt("webvtt\n\nbody"), "webvtt\n\nbody");
    }

    #[test]
    fn test_meeting_detail_strips_heavy_fields() {
        let detail = meeting_detail(&meeting("m1", "2026-03-01T10:00:00Z"));
        assert_eq!(detail["topic"], "Topic m1");
        for key in ["summary", "vtt_data", "participants", "recording_files"] {
            assert!(detail.get(key).is_none(), "{key} should be stripped");
        }
    }

    #[test]
    fn test_meeting_window_is_inclusive_on_both_ends() {
        let docs = vec![
            meeting("before", "2026-02-28T23:59:59Z"),
            meeting("on_from", "2026-03-01T00:00:00Z"),
            meeting("inside", "2026-03-10T12:00:00Z"),
            meeting("on_to", "2026-03-31T22:00:00Z"),
            meeting("after", "2026-04-01T00:00:00Z"),
        ];
        let ids: Vec<String> = meetings_in_window(&docs, "2026-03-01", "2026-03-31")
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["on_from", "inside", "on_to"]);
    }

    #[test]
    fn test_recording_summary_totals() {
        let summary = recording_summary(&meeting("m1", "2026-03-01T10:00:00Z")).unwrap();
        assert_eq!(summary.total_size, 350);
        assert_eq!(summary.recording_count, 2);

        let no_files = json!({"id": "m2", "recording_files": []});
        assert!(recording_summary(&no_files).is_none());
        assert!(recording_summary(&json!({"id": "m3"})).is_none());
    }

    #[test]
    fn test_recordings_window_compares_dates_only() {
        let docs = vec![
            meeting("m1", "2026-03-01T23:00:00Z"),
            meeting("m2", "2026-02-28T10:00:00Z"),
        ];
        let summaries = recordings_in_window(&docs, "2026-03-01", "2026-03-31");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, "m1");
    }

    #[test]
    fn test_summary_payload_normalizes_vtt() {
        let payload = meeting_summary_payload(&meeting("m1", "2026-03-01T10:00:00Z"));
        assert_eq!(payload.meeting_id, "m1");
        assert_eq!(payload.summary_details, vec!["d1"]);
        assert!(payload.vtt_data.starts_with("WEBVTT"));
    }

    #[test]
    fn test_recording_meeting_ids_fallback() {
        let user = json!({"meeting_ids": ["m1"], "recording_meeting_ids": ["r1"]});
        assert_eq!(recording_meeting_ids(&user), vec!["r1"]);

        let user = json!({"meeting_ids": ["m1"], "recording_meeting_ids": []});
        assert_eq!(recording_meeting_ids(&user), vec!["m1"]);

        let user = json!({"meeting_ids": ["m1"]});
        assert_eq!(recording_meeting_ids(&user), vec!["m1"]);
    }
}
