//! Normalized profile shape and the untrusted actor record it is built from.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::lookup::username::Username;

/// One dataset item returned by the scraping actor.
///
/// Any field may be missing, `null`, or of an unexpected type. Reads go
/// through the typed accessors, which return `None` instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem(Map<String, Value>);

impl RawItem {
    /// Wrap an arbitrary JSON value. Anything but an object is empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// The field if it is a JSON string.
    pub fn text(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(Value::as_str).map(str::to_owned)
    }

    /// The field if it is a JSON number.
    pub fn number(&self, field: &str) -> Option<Number> {
        match self.0.get(field) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        }
    }

    /// The field if it is a JSON array, otherwise empty.
    pub fn sequence(&self, field: &str) -> Vec<Value> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<Value> for RawItem {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

/// A normalized profile as returned to callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub profile_url: Option<String>,
    pub display_name: Option<String>,
    pub username: String,
    pub profile_image_url: Option<String>,
    pub profile_description: Option<String>,
    pub profile_location: Option<String>,
    pub subscribers: Option<Number>,
    pub category: Option<String>,
    pub website_url: Option<String>,
    pub snapcode_image_url: Option<String>,
    pub stories: Vec<Value>,
    pub spotlights: Vec<Value>,
    #[serde(serialize_with = "iso_millis")]
    pub fetched_at: DateTime<Utc>,
}

impl Profile {
    /// Normalize `item` for `requested`, stamped with the current time.
    pub fn normalize(item: &RawItem, requested: &Username) -> Self {
        normalize(item, requested, Utc::now())
    }
}

/// Map a raw actor item onto the fixed profile shape.
///
/// Total: every field falls back to its neutral value when the source is
/// absent or mistyped.
pub fn normalize(item: &RawItem, requested: &Username, now: DateTime<Utc>) -> Profile {
    Profile {
        profile_url: item.text("profileUrl"),
        display_name: item.text("username1"),
        username: item
            .text("username2")
            .unwrap_or_else(|| requested.as_str().to_string()),
        profile_image_url: item.text("profileImageUrl"),
        profile_description: item.text("profileDescription"),
        profile_location: item.text("profileLocation"),
        subscribers: item.number("subscribers"),
        category: item.text("category"),
        website_url: item.text("websiteUrl"),
        snapcode_image_url: item.text("snapcodeImageUrl"),
        stories: item.sequence("stories"),
        spotlights: item.sequence("spotlights"),
        fetched_at: now,
    }
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn user(name: &str) -> Username {
        Username::parse(name).unwrap()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_maps_all_fields() {
        let item = RawItem::from_value(json!({
            "profileUrl": "https://www.snapchat.com/add/john_doe",
            "username1": "John",
            "username2": "john_doe",
            "profileImageUrl": "https://img/1.png",
            "profileDescription": "hello",
            "profileLocation": "Paris",
            "subscribers": 42,
            "category": "Creator",
            "websiteUrl": "https://example.com",
            "snapcodeImageUrl": "https://img/code.svg",
            "stories": [{"id": 1}],
            "spotlights": ["a", "b"],
            "unrelated": true
        }));

        let profile = normalize(&item, &user("john_doe"), fixed_now());

        assert_eq!(profile.display_name.as_deref(), Some("John"));
        assert_eq!(profile.username, "john_doe");
        assert_eq!(profile.subscribers, Some(Number::from(42)));
        assert_eq!(profile.stories, vec![json!({"id": 1})]);
        assert_eq!(profile.spotlights.len(), 2);
        assert_eq!(profile.profile_location.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_defaults_for_wrong_types() {
        let item = RawItem::from_value(json!({
            "profileUrl": 7,
            "username1": null,
            "username2": ["nope"],
            "subscribers": "1.2k",
            "stories": "none",
            "spotlights": {"0": 1},
            "category": false
        }));

        let profile = normalize(&item, &user("@jane"), fixed_now());

        assert_eq!(profile.profile_url, None);
        assert_eq!(profile.display_name, None);
        assert_eq!(profile.username, "jane");
        assert_eq!(profile.subscribers, None);
        assert_eq!(profile.category, None);
        assert!(profile.stories.is_empty());
        assert!(profile.spotlights.is_empty());
    }

    #[test]
    fn test_non_object_items_are_empty() {
        for value in [json!(null), json!(12), json!("text"), json!([1, 2])] {
            let profile = normalize(&RawItem::from_value(value), &user("x"), fixed_now());
            assert_eq!(profile.username, "x");
            assert_eq!(profile.display_name, None);
            assert!(profile.stories.is_empty());
        }
    }

    #[test]
    fn test_float_subscribers_are_kept() {
        let item = RawItem::from_value(json!({"subscribers": 1.5}));
        let profile = normalize(&item, &user("x"), fixed_now());
        assert_eq!(profile.subscribers.and_then(|n| n.as_f64()), Some(1.5));
    }

    #[test]
    fn test_serialized_shape() {
        let profile = normalize(&RawItem::default(), &user("john_doe"), fixed_now());
        let value = serde_json::to_value(&profile).unwrap();

        assert_eq!(value["fetchedAt"], "2026-10-19T12:00:00.000Z");
        assert_eq!(value["username"], "john_doe");
        assert_eq!(value["displayName"], Value::Null);
        assert_eq!(value["subscribers"], Value::Null);
        assert_eq!(value["stories"], json!([]));
        assert_eq!(value.as_object().unwrap().len(), 13);
    }
}
