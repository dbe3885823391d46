use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Lifecycle status of an alert.
///
/// Transitions are not constrained server-side: any status may be set from
/// any other through the update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Escalated,
    Declined,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Escalated => "escalated",
            Self::Declined => "declined",
            Self::Resolved => "resolved",
        }
    }
}

impl Display for AlertStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geographic coordinates of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Alert row as stored: coordinates are kept as a flat pair.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: String,
    pub timestamp: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub weapon: String,
    pub confidence: f64,
    pub status: AlertStatus,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub camera_id: Option<String>,
    pub snapshot: Option<String>,
    pub notes: Option<String>,
    pub escalated_by: Option<String>,
    pub escalated_by_name: Option<String>,
}

/// Shaped alert record as returned by the API and carried on the broadcast
/// channel. Coordinates are nested, and the escalating officer's display
/// name is exposed as `officer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub weapon: String,
    pub confidence: f64,
    pub status: AlertStatus,
    pub location: Option<GeoPoint>,
    pub camera_id: Option<String>,
    pub snapshot: Option<String>,
    pub notes: Option<String>,
    pub officer: Option<String>,
    pub escalated_by: Option<String>,
}

impl From<AlertRow> for Alert {
    fn from(row: AlertRow) -> Self {
        let location = match (row.location_lat, row.location_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => None,
        };

        Self {
            id: row.id,
            timestamp: row.timestamp,
            kind: row.kind,
            weapon: row.weapon,
            confidence: row.confidence,
            status: row.status,
            location,
            camera_id: row.camera_id,
            snapshot: row.snapshot,
            notes: row.notes,
            officer: row.escalated_by_name,
            escalated_by: row.escalated_by,
        }
    }
}

/// Coordinates accepted by the ingestion endpoint: either a nested object
/// or a JSON-encoded string of one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Point(GeoPoint),
    Encoded(String),
}

impl LocationInput {
    /// An encoded string that does not parse is treated as absent.
    pub fn decode(&self) -> Option<GeoPoint> {
        match self {
            Self::Point(point) => Some(*point),
            Self::Encoded(raw) => serde_json::from_str(raw).ok(),
        }
    }
}

/// Ingestion payload for a new alert. Every field is optional; defaults are
/// applied at creation time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAlertRequest {
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub weapon: Option<String>,
    pub confidence: Option<f64>,
    pub status: Option<AlertStatus>,
    #[serde(rename = "cameraId")]
    pub camera_id: Option<String>,
    pub snapshot: Option<String>,
    pub notes: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location: Option<LocationInput>,
}

impl CreateAlertRequest {
    /// Normalize coordinates to a flat pair. Flat fields win; the nested
    /// structure is the fallback.
    pub fn resolved_location(&self) -> Option<GeoPoint> {
        match (self.location_lat, self.location_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint { lat, lng }),
            _ => self.location.as_ref().and_then(LocationInput::decode),
        }
    }
}

/// Partial update payload. A key absent from the request leaves the column
/// untouched; a key that is present overwrites it, including an explicit
/// empty string. The doubly-optional fields additionally distinguish an
/// explicit `null` (clear the column) from an absent key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAlertRequest {
    pub status: Option<AlertStatus>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub snapshot: Option<Option<String>>,
    #[serde(rename = "escalatedBy", default, deserialize_with = "present")]
    pub escalated_by: Option<Option<String>>,
    #[serde(rename = "escalatedByName", default, deserialize_with = "present")]
    pub escalated_by_name: Option<Option<String>>,
}

/// Wraps a field's value so that a present-but-null key deserializes to
/// `Some(None)` instead of collapsing into the absent case.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}
