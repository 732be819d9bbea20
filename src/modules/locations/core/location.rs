// Location record and the draft it is created from.
//
// Boundaries
// - No input or output here. The repository assigns `id` and `created_at`; callers only ever
//   hand in a `LocationDraft`.
// - The record is schema-agnostic beyond `id`, `floor` and `createdAt`. Everything else the
//   caller supplies travels along untouched in `fields`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

const RESERVED_KEYS: [&str; 3] = ["id", "floor", "createdAt"];

/// Floor or building level a location belongs to.
///
/// Comparison is strict: `Level(2)` and `Named("2")` are different floors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Floor {
    Level(i64),
    Named(String),
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Floor::Level(level) => write!(f, "{level}"),
            Floor::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for Floor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>()
            .map(Floor::Level)
            .unwrap_or_else(|_| Floor::Named(s.to_string())))
    }
}

impl From<i64> for Floor {
    fn from(level: i64) -> Self {
        Floor::Level(level)
    }
}

impl From<i32> for Floor {
    fn from(level: i32) -> Self {
        Floor::Level(i64::from(level))
    }
}

impl From<&str> for Floor {
    fn from(name: &str) -> Self {
        Floor::Named(name.to_string())
    }
}

impl From<String> for Floor {
    fn from(name: String) -> Self {
        Floor::Named(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("location data must be a JSON object")]
    NotAnObject,

    #[error("location data is missing a valid `floor`")]
    MissingFloor,
}

/// Caller supplied data for a new location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    floor: Floor,
    fields: Map<String, Json>,
}

impl LocationDraft {
    pub fn new(floor: impl Into<Floor>) -> Self {
        Self {
            floor: floor.into(),
            fields: Map::new(),
        }
    }

    /// Adds a caller field. Keys owned by the record itself are ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            warn!(key, "ignoring reserved location field");
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    pub fn from_json(data: Json) -> Result<Self, DraftError> {
        let Json::Object(mut object) = data else {
            return Err(DraftError::NotAnObject);
        };
        let floor = object
            .remove("floor")
            .and_then(|v| serde_json::from_value::<Floor>(v).ok())
            .ok_or(DraftError::MissingFloor)?;
        Ok(object
            .into_iter()
            .fold(Self::new(floor), |draft, (k, v)| draft.with_field(k, v)))
    }

    pub fn floor(&self) -> &Floor {
        &self.floor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    id: String,
    floor: Floor,
    #[serde(with = "iso_millis")]
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    fields: Map<String, Json>,
}

impl Location {
    /// Stamps a draft with a fresh time-ordered id and its creation time.
    pub fn create(draft: LocationDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            floor: draft.floor,
            created_at: now,
            fields: draft.fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn floor(&self) -> &Floor {
        &self.floor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn field(&self, key: &str) -> Option<&Json> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Json> {
        &self.fields
    }
}

/// `createdAt` as `2024-05-01T12:00:00.000Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
