//! Price watchers and alerts
//!
//! Watchers and alerts live on the server. This flow keeps an in-memory
//! mirror: list calls replace it wholesale, single-record calls patch one
//! entry after the server confirms. Failures are stored in `error` and also
//! returned so callers can decide how loud to be.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::events::{Event, EventBus};
use crate::api::ApiClient;
use crate::device::DeviceProvider;
use crate::error::{ApiError, Result, SkyfareError};
use crate::notify::NotificationSender;
use crate::types::{
    NewWatcher, PriceAlert, PriceHistoryEntry, PriceTrend, PriceWatcher, TrendDirection,
};

pub struct PriceWatcherFlow {
    api: ApiClient,
    device: Arc<dyn DeviceProvider>,
    notifier: NotificationSender,
    event_bus: EventBus,
    /// Sent with every new watcher
    currency: String,

    watchers: Vec<PriceWatcher>,
    alerts: Vec<PriceAlert>,
    unread_count: u32,
    loading: bool,
    error: Option<String>,
}

impl PriceWatcherFlow {
    pub fn new(
        api: ApiClient,
        device: Arc<dyn DeviceProvider>,
        notifier: NotificationSender,
        event_bus: EventBus,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            api,
            device,
            notifier,
            event_bus,
            currency: currency.into(),
            watchers: Vec::new(),
            alerts: Vec::new(),
            unread_count: 0,
            loading: false,
            error: None,
        }
    }

    pub fn watchers(&self) -> &[PriceWatcher] {
        &self.watchers
    }

    pub fn alerts(&self) -> &[PriceAlert] {
        &self.alerts
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn watcher(&self, id: &str) -> Option<&PriceWatcher> {
        self.watchers.iter().find(|w| w.id == id)
    }

    pub fn active_watchers(&self) -> Vec<&PriceWatcher> {
        self.watchers.iter().filter(|w| w.is_active).collect()
    }

    pub fn paused_watchers(&self) -> Vec<&PriceWatcher> {
        self.watchers.iter().filter(|w| !w.is_active).collect()
    }

    pub fn unread_alerts(&self) -> Vec<&PriceAlert> {
        self.alerts.iter().filter(|a| !a.is_read).collect()
    }

    fn fail(&mut self, e: ApiError) -> SkyfareError {
        warn!("{}", e);
        self.error = Some(e.to_string());
        e.into()
    }

    /// Replace the watcher mirror with the server's list
    pub async fn fetch_watchers(&mut self) -> Result<()> {
        let user = self.device.device_id()?;
        self.loading = true;
        self.error = None;

        let result = self
            .api
            .list_watchers(&user)
            .await
            .into_result("Failed to fetch watchers");
        self.loading = false;

        match result {
            Ok(watchers) => {
                debug!("Fetched {} watcher(s)", watchers.len());
                self.watchers = watchers;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Replace the alert mirror and unread count with the server's
    pub async fn fetch_alerts(&mut self, unread_only: bool) -> Result<()> {
        let user = self.device.device_id()?;
        let response = self.api.list_alerts(&user, unread_only).await;
        let unread_count = response.unread_count;

        match response.into_result("Failed to fetch alerts") {
            Ok(alerts) => {
                self.unread_count = unread_count
                    .unwrap_or_else(|| alerts.iter().filter(|a| !a.is_read).count() as u32);
                debug!(
                    "Fetched {} alert(s), {} unread",
                    alerts.len(),
                    self.unread_count
                );
                self.alerts = alerts;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Create a watcher and put it at the front of the mirror
    ///
    /// Airport codes are upper-cased. Returns the server-assigned id.
    pub async fn create_watcher(
        &mut self,
        origin: &str,
        destination: &str,
        travel_date: &str,
        target_price: f64,
    ) -> Result<String> {
        if !target_price.is_finite() || target_price <= 0.0 {
            return Err(SkyfareError::InvalidInput(format!(
                "target price must be positive, got {}",
                target_price
            )));
        }

        let request = NewWatcher {
            user_identifier: self.device.device_id()?,
            origin: origin.trim().to_uppercase(),
            destination: destination.trim().to_uppercase(),
            travel_date: travel_date.to_string(),
            target_price,
            currency: self.currency.clone(),
        };

        self.loading = true;
        self.error = None;
        let result = self
            .api
            .create_watcher(&request)
            .await
            .into_result("Failed to create watcher");
        self.loading = false;

        match result {
            Ok(watcher) => {
                let id = watcher.id.clone();
                info!("Created watcher {} for {}", id, watcher.route());
                self.event_bus.emit(Event::WatcherCreated {
                    id: id.clone(),
                    route: watcher.route(),
                });
                self.watchers.insert(0, watcher);
                Ok(id)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn pause_watcher(&mut self, id: &str) -> Result<()> {
        let response = self.api.pause_watcher(id).await;
        self.confirm_active_change(id, response.into_ack("Failed to pause watcher"), false)
    }

    pub async fn resume_watcher(&mut self, id: &str) -> Result<()> {
        let response = self.api.resume_watcher(id).await;
        self.confirm_active_change(id, response.into_ack("Failed to resume watcher"), true)
    }

    fn confirm_active_change<T>(
        &mut self,
        id: &str,
        result: std::result::Result<T, ApiError>,
        is_active: bool,
    ) -> Result<()> {
        if let Err(e) = result {
            return Err(self.fail(e));
        }
        if let Some(watcher) = self.watchers.iter_mut().find(|w| w.id == id) {
            watcher.is_active = is_active;
        }
        info!(
            "Watcher {} {}",
            id,
            if is_active { "resumed" } else { "paused" }
        );
        self.event_bus.emit(Event::WatcherUpdated {
            id: id.to_string(),
            is_active,
        });
        Ok(())
    }

    /// Pause an active watcher or resume a paused one
    ///
    /// Uses the cached state, so the watcher must be in the mirror. Returns
    /// the new active flag.
    pub async fn toggle_watcher(&mut self, id: &str) -> Result<bool> {
        let is_active = self
            .watcher(id)
            .map(|w| w.is_active)
            .ok_or_else(|| SkyfareError::InvalidInput(format!("Unknown watcher: {}", id)))?;

        if is_active {
            self.pause_watcher(id).await?;
        } else {
            self.resume_watcher(id).await?;
        }
        Ok(!is_active)
    }

    pub async fn delete_watcher(&mut self, id: &str) -> Result<()> {
        let result = self
            .api
            .delete_watcher(id)
            .await
            .into_ack("Failed to delete watcher");
        if let Err(e) = result {
            return Err(self.fail(e));
        }

        self.watchers.retain(|w| w.id != id);
        info!("Deleted watcher {}", id);
        self.event_bus.emit(Event::WatcherDeleted { id: id.to_string() });
        Ok(())
    }

    /// Price checks recorded for a watcher; empty if the request fails
    pub async fn price_history(&self, id: &str) -> Vec<PriceHistoryEntry> {
        match self
            .api
            .watcher_history(id)
            .await
            .into_result("Failed to fetch price history")
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Price history for {} unavailable: {}", id, e);
                Vec::new()
            }
        }
    }

    /// Acknowledge an alert on the server and mark it read locally
    pub async fn mark_alert_read(&mut self, id: &str) -> Result<()> {
        let result = self
            .api
            .mark_alert_read(id)
            .await
            .into_ack("Failed to mark alert as read");
        if let Err(e) = result {
            return Err(self.fail(e));
        }

        if let Some(alert) = self.alerts.iter_mut().find(|a| a.id == id) {
            if !alert.is_read {
                alert.is_read = true;
                self.unread_count = self.unread_count.saturating_sub(1);
            }
        }
        self.event_bus.emit(Event::AlertRead {
            id: id.to_string(),
            unread_count: self.unread_count,
        });
        Ok(())
    }

    /// Show a notification for every unread alert in the mirror
    pub async fn notify_unread(&self) -> u32 {
        let unread: Vec<PriceAlert> = self.unread_alerts().into_iter().cloned().collect();
        self.notifier.notify_alerts(&unread).await
    }
}

/// Last observed price is strictly under the target
pub fn is_price_below_target(watcher: &PriceWatcher) -> bool {
    watcher
        .last_price
        .is_some_and(|price| price < watcher.target_price)
}

/// Last observed price relative to the target, as an absolute percentage
///
/// Stable at 0% until the watcher has been checked.
pub fn price_trend(watcher: &PriceWatcher) -> PriceTrend {
    let Some(last) = watcher.last_price else {
        return PriceTrend {
            direction: TrendDirection::Stable,
            percent: 0.0,
        };
    };

    let diff = last - watcher.target_price;
    let percent = if watcher.target_price == 0.0 {
        0.0
    } else {
        (diff / watcher.target_price * 100.0).abs()
    };
    let direction = if diff < 0.0 {
        TrendDirection::Down
    } else if diff > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Stable
    };

    PriceTrend { direction, percent }
}
