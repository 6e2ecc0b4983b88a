//! Search-and-save flow
//!
//! Holds the search form and the results of the latest search. Every search
//! takes a request token when it starts; a response is only applied if its
//! token is still the newest, so a slow early search can never overwrite the
//! results of a later one.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::events::{Event, EventBus};
use crate::api::ApiClient;
use crate::dates::{default_departure_date, default_return_date, is_valid_date};
use crate::db::Database;
use crate::error::{Result, SkyfareError};
use crate::notify::{NotificationKind, NotificationSender};
use crate::types::{ApiResponse, FlightOffer};

/// Offers kept from a search response
pub const MAX_OFFERS: usize = 5;

pub const NO_FLIGHTS_FOUND: &str = "No flights found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchForm {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    pub round_trip: bool,
    pub adults: u32,
}

impl Default for SearchForm {
    fn default() -> Self {
        Self {
            origin: "MEX".to_string(),
            destination: "VIE".to_string(),
            departure_date: default_departure_date(),
            return_date: default_return_date(),
            round_trip: false,
            adults: 1,
        }
    }
}

impl SearchForm {
    /// Reject codes that are not three letters and dates that are not `YYYY-MM-DD`
    pub fn validate(&self) -> Result<()> {
        for (field, code) in [("origin", &self.origin), ("destination", &self.destination)] {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(SkyfareError::InvalidInput(format!(
                    "{} must be a 3-letter airport code, got '{}'",
                    field, code
                )));
            }
        }
        if !is_valid_date(&self.departure_date) {
            return Err(SkyfareError::InvalidInput(format!(
                "departure date must be YYYY-MM-DD, got '{}'",
                self.departure_date
            )));
        }
        if self.adults == 0 {
            return Err(SkyfareError::InvalidInput(
                "at least one adult is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Route and date a search was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub adults: u32,
}

/// Handed out by [`SearchFlow::begin_search`], redeemed by
/// [`SearchFlow::complete_search`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    token: u64,
    query: SearchQuery,
}

impl SearchTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
}

pub struct SearchFlow {
    api: ApiClient,
    db: Arc<Database>,
    notifier: NotificationSender,
    event_bus: EventBus,

    pub form: SearchForm,

    status: SearchStatus,
    offers: Vec<FlightOffer>,
    error: Option<String>,
    /// Query that produced `offers`
    query: Option<SearchQuery>,
    /// Result index -> saved row id
    saved_ids: HashMap<usize, i64>,
    latest_token: u64,
}

impl SearchFlow {
    pub fn new(
        api: ApiClient,
        db: Arc<Database>,
        notifier: NotificationSender,
        event_bus: EventBus,
    ) -> Self {
        Self {
            api,
            db,
            notifier,
            event_bus,
            form: SearchForm::default(),
            status: SearchStatus::Idle,
            offers: Vec::new(),
            error: None,
            query: None,
            saved_ids: HashMap::new(),
            latest_token: 0,
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    pub fn offers(&self) -> &[FlightOffer] {
        &self.offers
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    /// Row id of the offer at `index` if it has been saved
    pub fn saved_id(&self, index: usize) -> Option<i64> {
        self.saved_ids.get(&index).copied()
    }

    pub fn latest_token(&self) -> u64 {
        self.latest_token
    }

    /// Search the form's route and date, keeping the cheapest offers
    pub async fn search(&mut self) -> SearchStatus {
        let ticket = self.begin_search();
        let q = ticket.query().clone();
        let response = self
            .api
            .search_flights(&q.origin, &q.destination, &q.date, q.adults)
            .await;
        self.complete_search(&ticket, response);
        self.status
    }

    /// Like [`SearchFlow::search`] but asks the backend for its single cheapest offer
    pub async fn search_cheapest(&mut self) -> SearchStatus {
        let ticket = self.begin_search();
        let q = ticket.query().clone();
        let response = self
            .api
            .search_cheapest(&q.origin, &q.destination, &q.date)
            .await
            .map(|offer| vec![offer]);
        self.complete_search(&ticket, response);
        self.status
    }

    /// Enter the loading state and take a new request token
    ///
    /// Previous results, errors and saved markers are cleared.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.latest_token += 1;
        self.status = SearchStatus::Loading;
        self.offers.clear();
        self.error = None;
        self.query = None;
        self.saved_ids.clear();

        let query = SearchQuery {
            origin: self.form.origin.trim().to_uppercase(),
            destination: self.form.destination.trim().to_uppercase(),
            date: self.form.departure_date.clone(),
            adults: self.form.adults.max(1),
        };

        info!(
            "Searching {} → {} on {} (token {})",
            query.origin, query.destination, query.date, self.latest_token
        );
        self.event_bus.emit(Event::SearchStarted {
            token: self.latest_token,
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            date: query.date.clone(),
        });

        SearchTicket {
            token: self.latest_token,
            query,
        }
    }

    /// Apply a response to the flow
    ///
    /// Returns `false` and leaves state untouched if a newer search has
    /// started since `ticket` was issued.
    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        response: ApiResponse<Vec<FlightOffer>>,
    ) -> bool {
        if ticket.token != self.latest_token {
            debug!(
                "Dropping stale search response (token {}, latest {})",
                ticket.token, self.latest_token
            );
            self.event_bus.emit(Event::SearchDiscarded {
                token: ticket.token,
                latest: self.latest_token,
            });
            return false;
        }

        match response.data {
            Some(mut offers) if response.success && !offers.is_empty() => {
                offers.truncate(MAX_OFFERS);
                info!("Search returned {} offer(s)", offers.len());
                self.event_bus.emit(Event::SearchCompleted {
                    token: ticket.token,
                    offers: offers.len(),
                });
                self.offers = offers;
                self.query = Some(ticket.query.clone());
                self.status = SearchStatus::Success;
            }
            _ => {
                let message = response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| NO_FLIGHTS_FOUND.to_string());
                warn!("Search failed: {}", message);
                self.event_bus.emit(Event::SearchFailed {
                    token: ticket.token,
                    error: message.clone(),
                });
                self.error = Some(message);
                self.status = SearchStatus::Error;
            }
        }
        true
    }

    /// Persist the offer at `index` and announce it
    ///
    /// Saving the same index again returns the existing id. A failed
    /// notification is logged and does not undo the save.
    pub async fn save_flight(&mut self, index: usize) -> Result<i64> {
        if let Some(id) = self.saved_id(index) {
            return Ok(id);
        }

        let (offer, query) = match (self.offers.get(index), self.query.as_ref()) {
            (Some(offer), Some(query)) => (offer, query),
            _ => {
                return Err(SkyfareError::InvalidInput(format!(
                    "No offer at index {} (have {})",
                    index,
                    self.offers.len()
                )))
            }
        };

        let id = self
            .db
            .save_flight(&query.origin, &query.destination, &query.date, offer)
            .await?;
        self.saved_ids.insert(index, id);
        info!("Saved offer {} as flight {}", index, id);

        self.event_bus.emit(Event::FlightSaved {
            id,
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            price: offer.price,
            currency: offer.currency.clone(),
        });

        let kind = NotificationKind::FlightSaved {
            origin: query.origin.clone(),
            destination: query.destination.clone(),
            price: offer.price,
            currency: offer.currency.clone(),
        };
        if let Err(e) = self.notifier.notify(&kind).await {
            warn!("Flight {} saved but notification failed: {}", id, e);
        }

        Ok(id)
    }

    /// Drop results and go back to idle; the form is kept
    pub fn reset(&mut self) {
        self.status = SearchStatus::Idle;
        self.offers.clear();
        self.error = None;
        self.query = None;
        self.saved_ids.clear();
    }
}
