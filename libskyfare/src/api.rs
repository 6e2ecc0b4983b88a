//! HTTP client for the flight-search backend
//!
//! Every call issues exactly one request and hands the `{success, data, error}`
//! envelope back untouched. Transport and decode failures never surface as
//! `Err`: they are folded into `success: false` so callers have a single
//! shape to inspect.

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ApiError, ConfigError, Result};
use crate::types::{
    ApiResponse, CheapestRequest, FlightOffer, NewWatcher, PriceAlert, PriceHistoryEntry,
    PriceWatcher, SearchRequest,
};

/// Stateless client for the `/api` endpoints
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    base: Url,
    /// Whether the last request reached the server; shared by clones
    reachable: Arc<AtomicBool>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("skyfare/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "api.base_url".to_string(),
                value: base_url.clone(),
            })?;

        Ok(Self {
            http,
            base_url,
            base,
            reachable: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// False after a request failed below HTTP (connect, DNS, timeout)
    pub fn last_seen_online(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    /// Base URL plus `segments`, each one percent-encoded as a single path segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> ApiResponse<T> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} failed: {}", what, e);
                self.reachable.store(false, Ordering::Relaxed);
                return ApiResponse::failure(network_message(&e));
            }
        };
        self.reachable.store(true, Ordering::Relaxed);

        let status = response.status();
        match response.json::<ApiResponse<T>>().await {
            Ok(envelope) => {
                tracing::debug!("{} -> {} (success = {})", what, status, envelope.success);
                envelope
            }
            Err(e) => {
                tracing::warn!("{} returned an unreadable body ({}): {}", what, status, e);
                ApiResponse::failure(format!("Invalid response from server: {}", e))
            }
        }
    }

    /// `POST /flights/cheapest`
    pub async fn search_cheapest(
        &self,
        origin: &str,
        destination: &str,
        date: &str,
    ) -> ApiResponse<FlightOffer> {
        let body = CheapestRequest {
            origin,
            destination,
            date,
        };
        let request = self.http.post(self.url(&["flights", "cheapest"])).json(&body);
        self.send(request, "POST /flights/cheapest").await
    }

    /// `POST /flights/search`
    pub async fn search_flights(
        &self,
        origin: &str,
        destination: &str,
        date: &str,
        adults: u32,
    ) -> ApiResponse<Vec<FlightOffer>> {
        let body = SearchRequest {
            origin,
            destination,
            date,
            adults,
        };
        let request = self.http.post(self.url(&["flights", "search"])).json(&body);
        self.send(request, "POST /flights/search").await
    }

    /// `GET /watchers?user_identifier=`
    pub async fn list_watchers(&self, user_identifier: &str) -> ApiResponse<Vec<PriceWatcher>> {
        let request = self
            .http
            .get(self.url(&["watchers"]))
            .query(&[("user_identifier", user_identifier)]);
        self.send(request, "GET /watchers").await
    }

    /// `POST /watchers`
    pub async fn create_watcher(&self, watcher: &NewWatcher) -> ApiResponse<PriceWatcher> {
        let request = self.http.post(self.url(&["watchers"])).json(watcher);
        self.send(request, "POST /watchers").await
    }

    /// `POST /watchers/{id}/pause`
    pub async fn pause_watcher(&self, id: &str) -> ApiResponse<Value> {
        let request = self.http.post(self.url(&["watchers", id, "pause"]));
        self.send(request, "POST /watchers/:id/pause").await
    }

    /// `POST /watchers/{id}/resume`
    pub async fn resume_watcher(&self, id: &str) -> ApiResponse<Value> {
        let request = self.http.post(self.url(&["watchers", id, "resume"]));
        self.send(request, "POST /watchers/:id/resume").await
    }

    /// `DELETE /watchers/{id}`
    pub async fn delete_watcher(&self, id: &str) -> ApiResponse<Value> {
        let request = self.http.delete(self.url(&["watchers", id]));
        self.send(request, "DELETE /watchers/:id").await
    }

    /// `GET /watchers/{id}/history`
    pub async fn watcher_history(&self, id: &str) -> ApiResponse<Vec<PriceHistoryEntry>> {
        let request = self.http.get(self.url(&["watchers", id, "history"]));
        self.send(request, "GET /watchers/:id/history").await
    }

    /// `GET /alerts?user_identifier=&unread_only=`
    ///
    /// The envelope's `unread_count` is filled in by the server.
    pub async fn list_alerts(
        &self,
        user_identifier: &str,
        unread_only: bool,
    ) -> ApiResponse<Vec<PriceAlert>> {
        let unread = if unread_only { "true" } else { "false" };
        let request = self
            .http
            .get(self.url(&["alerts"]))
            .query(&[("user_identifier", user_identifier), ("unread_only", unread)]);
        self.send(request, "GET /alerts").await
    }

    /// `POST /alerts/{id}/read`
    pub async fn mark_alert_read(&self, id: &str) -> ApiResponse<Value> {
        let request = self.http.post(self.url(&["alerts", id, "read"]));
        self.send(request, "POST /alerts/:id/read").await
    }
}

fn network_message(e: &reqwest::Error) -> String {
    if e.is_connect() {
        format!("Cannot connect to server: {}", e)
    } else if e.is_timeout() {
        "Request timed out".to_string()
    } else {
        format!("Network error: {}", e)
    }
}
