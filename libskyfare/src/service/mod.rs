//! Service layer for Skyfare
//!
//! `SkyfareService` owns the resources shared by every flow (database, API
//! client, notifier, device identity, event bus) and hands out the flows
//! the CLI tools drive:
//!
//! - `SearchFlow`: search the backend and save offers offline
//! - `PriceWatcherFlow`: mirror and manage server-side watchers and alerts
//! - `Navigation` / `NetworkStatus`: offline-aware tab state
//! - `EventBus`: progress events for any subscriber
//!
//! # Example
//!
//! ```no_run
//! use libskyfare::service::SkyfareService;
//!
//! # async fn example() -> libskyfare::Result<()> {
//! let service = SkyfareService::new().await?;
//!
//! let mut search = service.search();
//! search.form.destination = "MAD".to_string();
//! search.search().await;
//!
//! for offer in search.offers() {
//!     println!("{} {}", offer.price, offer.currency);
//! }
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod navigation;
pub mod search;
pub mod watchers;

pub use events::{Event, EventBus};
pub use navigation::{Navigation, NetworkStatus, Tab};
pub use search::{SearchFlow, SearchForm, SearchStatus};
pub use watchers::{is_price_below_target, price_trend, PriceWatcherFlow};

use std::sync::Arc;

use crate::api::ApiClient;
use crate::device::{DeviceProvider, FileDeviceProvider};
use crate::notify::{ConsoleNotifier, NotificationSender, Notifier};
use crate::{locale, Config, Database, Result};

/// Entry point shared by the CLI tools
///
/// Clones of the database handle, API client and notifier are cheap; each
/// flow gets its own and all of them report to the same event bus.
pub struct SkyfareService {
    config: Arc<Config>,
    db: Arc<Database>,
    api: ApiClient,
    notifier: NotificationSender,
    device: Arc<dyn DeviceProvider>,
    event_bus: EventBus,
}

impl SkyfareService {
    /// Load configuration from the default location and open the database
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Build the service from an explicit configuration
    ///
    /// Applies the configured locale process-wide. The device identifier is
    /// kept next to the database file.
    pub async fn from_config(config: Config) -> Result<Self> {
        let db_path = config.db_path();
        let db = Database::new(&db_path.to_string_lossy()).await?;
        let api = ApiClient::new(config.api.base_url.clone())?;
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(&config.notifications));
        let device: Arc<dyn DeviceProvider> = Arc::new(FileDeviceProvider::beside(&db_path)?);

        Ok(Self::from_parts(config, db, api, notifier, device))
    }

    /// Assemble a service from ready-made parts
    pub fn from_parts(
        config: Config,
        db: Database,
        api: ApiClient,
        notifier: Arc<dyn Notifier>,
        device: Arc<dyn DeviceProvider>,
    ) -> Self {
        locale::set(config.preferences.locale);
        tracing::debug!(
            "Service ready (api = {}, notifier = {})",
            api.base_url(),
            notifier.name()
        );

        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            api,
            notifier: NotificationSender::new(notifier),
            device,
            event_bus: EventBus::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The offline store, for saved-flight management
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notifier(&self) -> &NotificationSender {
        &self.notifier
    }

    pub fn device(&self) -> &Arc<dyn DeviceProvider> {
        &self.device
    }

    /// A fresh search flow with the default form
    pub fn search(&self) -> SearchFlow {
        SearchFlow::new(
            self.api.clone(),
            Arc::clone(&self.db),
            self.notifier.clone(),
            self.event_bus.clone(),
        )
    }

    /// A price-watcher flow with an empty mirror
    pub fn watchers(&self) -> PriceWatcherFlow {
        PriceWatcherFlow::new(
            self.api.clone(),
            Arc::clone(&self.device),
            self.notifier.clone(),
            self.event_bus.clone(),
            self.config.preferences.currency.clone(),
        )
    }

    pub fn subscribe(&self) -> events::EventReceiver {
        self.event_bus.subscribe()
    }
}
