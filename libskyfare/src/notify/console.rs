//! Terminal notification backend
//!
//! Shows notifications on stderr. Permission mirrors the
//! `[notifications] enabled` setting; requesting it cannot change the answer.

use async_trait::async_trait;
use std::io::Write;

use crate::config::NotificationConfig;
use crate::error::{Result, SkyfareError};
use crate::notify::{Notification, Notifier};

pub struct ConsoleNotifier {
    enabled: bool,
}

impl ConsoleNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            enabled: config.enabled,
        }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn is_permission_granted(&self) -> Result<bool> {
        Ok(self.enabled)
    }

    async fn request_permission(&self) -> Result<bool> {
        Ok(self.enabled)
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}\n  {}", notification.title, notification.body)
            .map_err(|e| SkyfareError::Notification(format!("Failed to write notification: {}", e)))
    }

    fn name(&self) -> &str {
        "console"
    }
}
