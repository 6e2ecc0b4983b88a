//! Core types for Skyfare
//!
//! Field names match the backend's snake_case JSON so the same structs are
//! used on the wire and in the CLI's `--format json` output.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Flight duration as the backend reports it
///
/// Search results carry ISO-8601 strings (`"PT2H30M"`); some endpoints send
/// plain minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlightDuration {
    Minutes(i64),
    Iso8601(String),
}

impl FlightDuration {
    /// Text stored in the `saved_flights.duration` column
    pub fn to_db(&self) -> String {
        match self {
            FlightDuration::Minutes(m) => m.to_string(),
            FlightDuration::Iso8601(s) => s.clone(),
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(minutes) => FlightDuration::Minutes(minutes),
            Err(_) => FlightDuration::Iso8601(value.to_string()),
        }
    }
}

impl From<i64> for FlightDuration {
    fn from(minutes: i64) -> Self {
        FlightDuration::Minutes(minutes)
    }
}

impl From<&str> for FlightDuration {
    fn from(iso: &str) -> Self {
        FlightDuration::Iso8601(iso.to_string())
    }
}

/// One leg of an offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub departure_at: Option<String>,
    #[serde(default)]
    pub arrival_at: Option<String>,
    #[serde(default)]
    pub carrier_code: Option<String>,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub duration: Option<FlightDuration>,
}

/// A single priced flight option returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub departure_at: Option<String>,
    #[serde(default)]
    pub arrival_at: Option<String>,
    #[serde(default)]
    pub duration: Option<FlightDuration>,
    #[serde(default)]
    pub stops: u32,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub airline_code: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// An offer persisted in the offline store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFlight {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub travel_date: String,
    pub price: f64,
    pub currency: String,
    pub airline: Option<String>,
    pub airline_code: Option<String>,
    pub duration: Option<FlightDuration>,
    pub stops: u32,
    pub segments: Vec<Segment>,
    pub is_favorite: bool,
    /// Unix timestamp (seconds) of the search that produced this row
    pub searched_at: i64,
}

impl SavedFlight {
    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

/// A standing request to monitor a route/date for a target price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceWatcher {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: String,
    pub target_price: f64,
    pub currency: String,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub last_checked_at: Option<String>,
    #[serde(default)]
    pub last_price: Option<f64>,
}

impl PriceWatcher {
    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }
}

/// A server-generated notice that a watcher's target was met
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: String,
    pub watcher_id: String,
    pub route: String,
    pub old_price: f64,
    pub new_price: f64,
    pub is_read: bool,
    pub triggered_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub id: i64,
    pub price: f64,
    pub checked_at: String,
}

/// Body of `POST /watchers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWatcher {
    pub user_identifier: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: String,
    pub target_price: f64,
    pub currency: String,
}

/// Body of `POST /flights/cheapest`
#[derive(Debug, Clone, Serialize)]
pub struct CheapestRequest<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub date: &'a str,
}

/// Body of `POST /flights/search`
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub date: &'a str,
    pub adults: u32,
}

/// The backend's JSON envelope
///
/// Returned to callers as-is; transport and decode failures are folded into
/// `success: false` with the failure text in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    /// Only sent by the alerts listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u32>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            unread_count: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            unread_count: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
            unread_count: self.unread_count,
        }
    }

    /// Interpret the envelope, using `fallback` when the server gave no message
    pub fn into_result(self, fallback: &str) -> std::result::Result<T, ApiError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(ApiError::Decode(format!("{}: response had no data", fallback))),
            (false, _) => Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }

    /// Like [`ApiResponse::into_result`] for endpoints that only confirm
    ///
    /// `data` is ignored, so `{"success": true}` on its own is enough.
    pub fn into_ack(self, fallback: &str) -> std::result::Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Last observed price relative to a watcher's target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTrend {
    pub direction: TrendDirection,
    pub percent: f64,
}
