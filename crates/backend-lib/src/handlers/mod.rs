// ============================
// confmock-backend-lib/src/handlers/mod.rs
// ============================
//! Route handlers, one module per resource family.
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::Settings;
use crate::error::ApiError;
use crate::pagination::{Page, PageParams};

pub mod accounts;
pub mod cache_admin;
pub mod calendar;
pub mod chat;
pub mod dashboards;
pub mod devices;
pub mod groups;
pub mod mail;
pub mod meetings;
pub mod phone;
pub mod qss;
pub mod recordings;
pub mod reports;
pub mod roles;
pub mod rooms;
pub mod tracking_fields;
pub mod users;
pub mod webinars;

/// Query parameters shared by the list endpoints. Kept flat because
/// the urlencoded deserializer cannot flatten nested structs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page_size: Option<i64>,
    pub page_number: Option<i64>,
    #[serde(default)]
    pub next_page_token: String,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub trash: Option<bool>,
    pub location_id: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> PageParams {
        PageParams::new(self.page_size, self.page_number, self.next_page_token.clone())
    }

    /// Resolve the `from`/`to` day window, falling back to the
    /// configured defaults. Malformed dates are a 400.
    pub fn date_window(&self, settings: &Settings) -> Result<(String, String), ApiError> {
        let from = self.from.clone().unwrap_or_else(|| settings.date_from.clone());
        let to = self.to.clone().unwrap_or_else(|| settings.date_to.clone());
        for value in [&from, &to] {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ApiError::InvalidDateRange)?;
        }
        Ok((from, to))
    }
}

/// Vendor list envelope: paging fields plus the items under the
/// resource's plural key.
pub fn list_envelope<T: serde::Serialize>(key: &str, page: Page<T>) -> Value {
    json!({
        "page_size": page.page_size,
        "page_number": page.page_number,
        "page_count": page.page_count,
        "total_records": page.total_records,
        "next_page_token": page.next_page_token,
        key: page.items,
    })
}

/// Same envelope with extra top-level fields (e.g. `from`/`to`).
pub fn list_envelope_with<T: serde::Serialize>(
    key: &str,
    page: Page<T>,
    extra: &[(&str, Value)],
) -> Value {
    let mut envelope = list_envelope(key, page);
    if let Value::Object(map) = &mut envelope {
        for (field, value) in extra {
            map.insert(field.to_string(), value.clone());
        }
    }
    envelope
}

/// Required string field of a JSON body.
pub fn require_str<'a>(body: &'a Value, key: &str) -> Result<&'a str, ApiError> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{key} is required")))
}

/// Copy `keys` from `patch` into `target` where present. `settings`
/// objects deep-merge one level instead of replacing.
pub fn merge_fields(target: &mut Value, patch: &Value, keys: &[&str]) {
    let (Value::Object(target), Value::Object(patch)) = (target, patch) else {
        return;
    };
    for key in keys {
        let Some(value) = patch.get(*key) else { continue };
        if *key == "settings" {
            let merged = target
                .entry("settings")
                .or_insert_with(|| Value::Object(Map::new()));
            if let (Value::Object(merged), Value::Object(incoming)) = (merged, value) {
                for (field, setting) in incoming {
                    merged.insert(field.clone(), setting.clone());
                }
                continue;
            }
        }
        target.insert((*key).to_string(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::paginate;

    #[test]
    fn test_date_window_defaults_and_validation() {
        let settings = Settings::default();

        let query = ListQuery::default();
        let (from, to) = query.date_window(&settings).unwrap();
        assert_eq!(from, settings.date_from);
        assert_eq!(to, settings.date_to);

        let query = ListQuery {
            from: Some("2026-03-01".to_string()),
            to: Some("03/31/2026".to_string()),
            ..ListQuery::default()
        };
        assert!(matches!(
            query.date_window(&settings),
            Err(ApiError::InvalidDateRange)
        ));
    }

    #[test]
    fn test_list_envelope_shape() {
        let items: Vec<u32> = (0..5).collect();
        let page = paginate(&items, &PageParams::new(Some(2), Some(1), ""));
        let envelope = list_envelope("meetings", page);
        assert_eq!(envelope["total_records"], 5);
        assert_eq!(envelope["next_page_token"], "2");
        assert_eq!(envelope["meetings"], json!([0, 1]));
    }

    #[test]
    fn test_merge_fields_deep_merges_settings() {
        let mut target = json!({
            "topic": "Old",
            "duration": 30,
            "settings": {"host_video": true, "waiting_room": true},
        });
        let patch = json!({
            "topic": "New",
            "agenda": "Agenda",
            "settings": {"waiting_room": false},
        });
        merge_fields(&mut target, &patch, &["topic", "agenda", "settings"]);

        assert_eq!(target["topic"], "New");
        assert_eq!(target["duration"], 30);
        assert_eq!(target["agenda"], "Agenda");
        assert_eq!(target["settings"]["host_video"], true);
        assert_eq!(target["settings"]["waiting_room"], false);
    }

    #[test]
    fn test_require_str() {
        let body = json!({"email": "a@b.com", "blank": ""});
        assert_eq!(require_str(&body, "email").unwrap(), "a@b.com");
        assert!(require_str(&body, "blank").is_err());
        assert!(require_str(&body, "missing").is_err());
    }
}
