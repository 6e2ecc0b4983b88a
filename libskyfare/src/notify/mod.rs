//! Notification dispatch
//!
//! A [`Notifier`] is the platform's notification centre: it reports and
//! requests permission and shows a title/body pair. [`NotificationSender`]
//! sits in front of it, checks permission before every send and renders the
//! two message templates in the active locale.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::formatters::format_price;
use crate::locale::{self, Locale};
use crate::types::PriceAlert;

pub mod console;
pub mod mock;

pub use console::ConsoleNotifier;
pub use mock::{MockNotifier, MockNotifierConfig};

/// Platform notification backend
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn is_permission_granted(&self) -> Result<bool>;

    /// Ask the user for permission; returns whether it was granted
    async fn request_permission(&self) -> Result<bool>;

    async fn send(&self, notification: &Notification) -> Result<()>;

    fn name(&self) -> &str;
}

/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// The messages the app can show
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    FlightSaved {
        origin: String,
        destination: String,
        price: f64,
        currency: String,
    },
    PriceAlert {
        route: String,
        new_price: f64,
        currency: String,
    },
}

impl NotificationKind {
    pub fn render(&self, locale: Locale) -> Notification {
        match self {
            NotificationKind::FlightSaved {
                origin,
                destination,
                price,
                currency,
            } => Notification {
                title: match locale {
                    Locale::En => "✈️ Flight saved",
                    Locale::Es => "✈️ Vuelo guardado",
                }
                .to_string(),
                body: format!(
                    "{} → {} · {}",
                    origin,
                    destination,
                    format_price(*price, currency)
                ),
            },
            NotificationKind::PriceAlert {
                route,
                new_price,
                currency,
            } => {
                let price = format_price(*new_price, currency);
                match locale {
                    Locale::En => Notification {
                        title: "🔔 Price Alert".to_string(),
                        body: format!("{} dropped to {}!", route, price),
                    },
                    Locale::Es => Notification {
                        title: "🔔 Alerta de Precio".to_string(),
                        body: format!("¡{} bajó a {}!", route, price),
                    },
                }
            }
        }
    }
}

impl From<&PriceAlert> for NotificationKind {
    fn from(alert: &PriceAlert) -> Self {
        // Alerts are raised for watchers created in MXN
        NotificationKind::PriceAlert {
            route: alert.route.clone(),
            new_price: alert.new_price,
            currency: "MXN".to_string(),
        }
    }
}

/// Permission-aware front end over a [`Notifier`]
#[derive(Clone)]
pub struct NotificationSender {
    backend: Arc<dyn Notifier>,
}

impl NotificationSender {
    pub fn new(backend: Arc<dyn Notifier>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Notifier> {
        &self.backend
    }

    /// Check permission, requesting it once if not yet granted
    ///
    /// Backend errors count as "not granted".
    pub async fn ensure_permission(&self) -> bool {
        let granted = match self.backend.is_permission_granted().await {
            Ok(true) => return true,
            Ok(false) => self.backend.request_permission().await,
            Err(e) => Err(e),
        };

        match granted {
            Ok(granted) => granted,
            Err(e) => {
                tracing::error!("Notification permission check failed: {}", e);
                false
            }
        }
    }

    /// Render `kind` in the active locale and show it
    ///
    /// Returns `Ok(false)` without sending when permission is denied.
    pub async fn notify(&self, kind: &NotificationKind) -> Result<bool> {
        self.notify_in(kind, locale::current()).await
    }

    pub async fn notify_in(&self, kind: &NotificationKind, locale: Locale) -> Result<bool> {
        if !self.ensure_permission().await {
            tracing::warn!("Notification permission not granted");
            return Ok(false);
        }

        let notification = kind.render(locale);
        self.backend.send(&notification).await?;
        tracing::debug!(
            "Sent notification via {}: {}",
            self.backend.name(),
            notification.title
        );
        Ok(true)
    }

    /// One price-alert notification per alert; returns how many were shown
    ///
    /// A failed send is logged and does not stop the remaining alerts.
    pub async fn notify_alerts(&self, alerts: &[PriceAlert]) -> u32 {
        let mut sent = 0;
        for alert in alerts {
            match self.notify(&NotificationKind::from(alert)).await {
                Ok(true) => sent += 1,
                Ok(false) => break,
                Err(e) => tracing::warn!("Failed to notify alert {}: {}", alert.id, e),
            }
        }
        sent
    }
}
