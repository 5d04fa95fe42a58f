// ============================
// confmock-backend-lib/src/mock.rs
// ============================
//! Mock-entity synthesis.
//!
//! Builds full vendor-shaped documents for the `synthesize` store
//! policy and for fixture-less list endpoints. IDs, names and metrics
//! are random; shapes are fixed.
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, seq::SliceRandom, Rng};
use serde_json::{json, Value};

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Michael", "Emily", "David", "Sophia", "Muhammad", "Fatima",
    "Chen", "Yuki", "Raj", "Priya", "Carlos", "Maria", "Kwame", "Zainab",
    "Olga", "Sven", "Aisha", "Ibrahim", "Mei", "Hiroshi", "Ananya", "Rahul",
    "Javier", "Luisa", "Ekundayo", "Chidi", "Alexei", "Natasha", "Hassan", "Amira",
];
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
    "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker",
    "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
];
const TIMEZONES: &[&str] = &[
    "America/Los_Angeles",
    "America/New_York",
    "Asia/Tokyo",
    "Europe/London",
    "Australia/Sydney",
];

/// Vendor timestamp format: `2026-01-15T14:00:00Z`.
pub fn format_ts(dt: chrono::DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn now_ts() -> String {
    format_ts(Utc::now())
}

pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Vendor-length opaque entity ID.
pub fn random_id() -> String {
    random_string(22)
}

fn random_date(from_year: i32, to_year: i32) -> String {
    let start = NaiveDate::from_ymd_opt(from_year, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(to_year, 12, 31).unwrap();
    let span = (end - start).num_days();
    let date = start + Duration::days(rand::thread_rng().gen_range(0..span));
    format!("{:04}-{:02}-{:02}T00:00:00Z", date.year(), date.month(), date.day())
}

fn pick(pool: &[&str]) -> String {
    pool.choose(&mut rand::thread_rng()).unwrap().to_string()
}

/// A full random user profile, vendor shape.
pub fn base_user(base_url: &str) -> Value {
    let mut rng = rand::thread_rng();
    let first_name = pick(FIRST_NAMES);
    let last_name = pick(LAST_NAMES);
    let id = random_id();
    json!({
        "id": id,
        "first_name": first_name,
        "last_name": last_name,
        "display_name": format!("{first_name} {last_name}"),
        "email": format!(
            "{}.{}@{}.com",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            random_string(5).to_lowercase()
        ),
        "type": rng.gen_range(1..=2),
        "pmi": rng.gen_range(1_000_000_000i64..=9_999_999_999i64),
        "timezone": pick(TIMEZONES),
        "verified": rng.gen_range(0..=1),
        "dept": pick(&["Engineering", "Sales", "Marketing", "Product"]),
        "created_at": random_date(2022, 2026),
        "last_login_time": random_date(2025, 2026),
        "last_client_version": format!(
            "{}.{}.{}({})",
            rng.gen_range(5..=6),
            rng.gen_range(1..=13),
            rng.gen_range(1000..=9999),
            pick(&["mac", "win", "ipad", "iphone"])
        ),
        "pic_url": format!("{base_url}/p/{}/{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4()),
        "language": "en-US",
        "status": pick(&["active", "inactive"]),
        "role_id": rng.gen_range(1..=5).to_string(),
        "meeting_ids": [],
        "recording_meeting_ids": [],
        "webinar_ids": [],
    })
}

/// Mock user for an arbitrary requested ID, with one meeting and one
/// webinar reference so the derived-view endpoints have content.
pub fn mock_user(user_id: &str, base_url: &str) -> Value {
    let mut user = base_user(base_url);
    user["id"] = json!(user_id);
    user["email"] = json!(format!("{user_id}@zoom-mock.com"));
    user["meeting_ids"] = json!([format!("{user_id}_m1")]);
    user["recording_meeting_ids"] = json!([format!("{user_id}_m1")]);
    user["webinar_ids"] = json!([format!("{user_id}_w1")]);
    user
}

/// Full mock meeting (summary, transcript, one recording file, one
/// participant) for an arbitrary requested ID. A `<user>_m1` ID infers
/// its host.
pub fn mock_meeting(meeting_id: &str, host_id: Option<&str>, base_url: &str) -> Value {
    let inferred = meeting_id.strip_suffix("_m1");
    let host_id = host_id.or(inferred).unwrap_or("mock_host");
    let start = format_ts(Utc::now() - Duration::days(1));
    let rec_id = format!("rec_{meeting_id}");
    json!({
        "uuid": meeting_id,
        "id": meeting_id,
        "host_id": host_id,
        "host_email": format!("{host_id}@zoom-mock.com"),
        "topic": format!("Meeting {meeting_id}"),
        "type": 2,
        "start_time": start,
        "duration": 60,
        "timezone": "America/New_York",
        "created_at": start,
        "join_url": format!("{base_url}/j/{meeting_id}"),
        "start_url": format!("{base_url}/s/{meeting_id}"),
        "password": "mock123",
        "agenda": "",
        "settings": {
            "host_video": true,
            "participant_video": false,
            "mute_upon_entry": true,
            "waiting_room": true,
        },
        "summary": {
            "summary_title": format!("Meeting {meeting_id}"),
            "summary_overview": "Mock summary for testing.",
            "summary_details": ["Point 1", "Point 2"],
            "next_steps": ["Follow up"],
        },
        "vtt_data": format!(
            "WEBVTT\n\n00:00:00 --> 00:01:00 Speaker: Mock transcript for {meeting_id}."
        ),
        "recording_files": [{
            "id": rec_id,
            "meeting_id": meeting_id,
            "recording_start": start,
            "recording_end": start,
            "file_type": "MP4",
            "file_extension": "MP4",
            "file_size": 1_000_000,
            "play_url": format!("{base_url}/rec/play/{rec_id}"),
            "download_url": format!("{base_url}/rec/download/{meeting_id}/transcript.vtt"),
            "status": "completed",
        }],
        "participants": [{
            "id": format!("p_{meeting_id}"),
            "name": "Participant",
            "user_id": host_id,
            "user_email": format!("{host_id}@zoom-mock.com"),
            "join_time": start,
            "leave_time": start,
            "duration": 3600,
        }],
    })
}

/// Mock webinar (fixed type 5, no recording files).
pub fn mock_webinar(webinar_id: &str, host_id: Option<&str>, base_url: &str) -> Value {
    let host_id = host_id.unwrap_or("mock_host");
    let start = format_ts(Utc::now() - Duration::days(1));
    json!({
        "uuid": webinar_id,
        "id": webinar_id,
        "host_id": host_id,
        "topic": format!("Webinar {webinar_id}"),
        "type": 5,
        "start_time": start,
        "duration": 60,
        "timezone": "America/New_York",
        "created_at": start,
        "join_url": format!("{base_url}/w/{webinar_id}"),
        "participants": [{
            "id": format!("wp_{webinar_id}"),
            "name": "Attendee",
            "user_id": host_id,
        }],
    })
}

fn qos_details() -> Value {
    let mut rng = rand::thread_rng();
    json!({
        "min_bitrate": format!("{:.2}kbps", rng.gen_range(20.0..100.0)),
        "avg_bitrate": format!("{:.2}kbps", rng.gen_range(50.0..150.0)),
        "max_bitrate": format!("{:.2}kbps", rng.gen_range(100.0..200.0)),
        "min_latency": format!("{} ms", rng.gen_range(50..100)),
        "avg_latency": format!("{} ms", rng.gen_range(80..150)),
        "max_latency": format!("{} ms", rng.gen_range(120..200)),
        "min_jitter": format!("{}ms", rng.gen_range(0..5)),
        "avg_jitter": format!("{}ms", rng.gen_range(2..8)),
        "max_jitter": format!("{}ms", rng.gen_range(5..15)),
        "min_loss": format!("{:.2}%", rng.gen_range(0.0..0.1)),
        "avg_loss": format!("{:.2}%", rng.gen_range(0.1..0.3)),
        "max_loss": format!("{:.2}%", rng.gen_range(0.2..0.5)),
        "resolution": pick(&["640*480", "1280*720", "1920*1080"]),
        "min_frame_rate": format!("{} fps", rng.gen_range(10..15)),
        "avg_frame_rate": format!("{} fps", rng.gen_range(15..25)),
        "max_frame_rate": format!("{} fps", rng.gen_range(25..30)),
    })
}

/// Random per-stream QoS metrics for the quality-score endpoints.
pub fn qos_data() -> Value {
    let qos_types = [
        "audio_input",
        "audio_output",
        "video_input",
        "video_output",
        "as_input",
        "as_output",
        "cpu_usage",
    ];
    let count = rand::thread_rng().gen_range(3..=qos_types.len());
    let picked: Vec<&str> = qos_types
        .choose_multiple(&mut rand::thread_rng(), count)
        .copied()
        .collect();
    Value::Array(
        picked
            .into_iter()
            .map(|qos_type| json!({"type": qos_type, "details": qos_details()}))
            .collect(),
    )
}

/// Random calendar-list entry, Google-calendar shape.
pub fn calendar_entry() -> Value {
    let mut rng = rand::thread_rng();
    json!({
        "kind": "calendar#calendarListEntry",
        "etag": format!("\"{}\"", random_string(20)),
        "id": format!("{}@zoom.com", random_string(10)),
        "summary": format!("Calendar {}", random_string(5)),
        "description": "Calendar description",
        "location": pick(&["San Jose", "New York", "London", "Tokyo"]),
        "timeZone": pick(TIMEZONES),
        "colorId": rng.gen_range(1..=10).to_string(),
        "backgroundColor": format!("#{}", random_string(6).to_lowercase()),
        "foregroundColor": "#ffffff",
        "hidden": rng.gen_bool(0.5),
        "selected": rng.gen_bool(0.5),
        "accessRole": pick(&["freeBusyReader", "reader", "writer", "owner"]),
        "defaultReminders": [{
            "method": pick(&["email", "popup"]),
            "minutes": rng.gen_range(5..=60),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_length_and_charset() {
        let id = random_id();
        assert_eq!(id.len(), 22);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_id(), random_id());
    }

    #[test]
    fn test_mock_meeting_infers_host_from_id() {
        let m = mock_meeting("u1_m1", None, "https://api.zoom.us");
        assert_eq!(m["host_id"], "u1");
        assert_eq!(m["type"], 2);
        assert!(m["vtt_data"].as_str().unwrap().starts_with("WEBVTT"));
        assert_eq!(m["recording_files"][0]["file_size"], 1_000_000);

        let m = mock_meeting("m9", Some("host7"), "https://api.zoom.us");
        assert_eq!(m["host_id"], "host7");
    }

    #[test]
    fn test_mock_user_references() {
        let u = mock_user("u1", "https://api.zoom.us");
        assert_eq!(u["id"], "u1");
        assert_eq!(u["meeting_ids"], serde_json::json!(["u1_m1"]));
        assert_eq!(u["webinar_ids"], serde_json::json!(["u1_w1"]));
    }

    #[test]
    fn test_mock_webinar_is_type_5_without_recordings() {
        let w = mock_webinar("w1", None, "https://api.zoom.us");
        assert_eq!(w["type"], 5);
        assert!(w.get("recording_files").is_none());
    }
}
