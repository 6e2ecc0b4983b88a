//! Skyfare - flight search with an offline cache and price watchers
//!
//! This library backs the `sky-search`, `sky-saved` and `sky-watch` tools:
//! it talks to the flight-search backend, keeps saved offers in a local
//! SQLite database and mirrors the price watchers and alerts held by the
//! server.

pub mod airports;
pub mod api;
pub mod config;
pub mod dates;
pub mod db;
pub mod device;
pub mod error;
pub mod formatters;
pub mod locale;
pub mod logging;
pub mod notify;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use api::ApiClient;
pub use config::Config;
pub use db::Database;
pub use error::{Result, SkyfareError};
pub use locale::Locale;
pub use types::{
    ApiResponse, FlightDuration, FlightOffer, PriceAlert, PriceHistoryEntry, PriceWatcher,
    SavedFlight, Segment,
};
