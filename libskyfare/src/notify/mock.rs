//! Recording notification backend for tests
//!
//! Compiled for all builds so integration tests and the CLI test harness can
//! observe what would have been shown.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SkyfareError};
use crate::notify::{Notification, Notifier};

/// Behaviour of a [`MockNotifier`]
#[derive(Debug, Clone)]
pub struct MockNotifierConfig {
    /// Initial permission state
    pub granted: bool,

    /// Whether `request_permission` grants it
    pub grant_on_request: bool,

    /// Error returned by both permission calls
    pub permission_error: Option<String>,

    /// Error returned by `send`
    pub send_error: Option<String>,
}

impl Default for MockNotifierConfig {
    fn default() -> Self {
        Self {
            granted: true,
            grant_on_request: true,
            permission_error: None,
            send_error: None,
        }
    }
}

/// Clones share the recorded state
#[derive(Debug, Clone)]
pub struct MockNotifier {
    config: MockNotifierConfig,
    granted: Arc<Mutex<bool>>,
    request_count: Arc<Mutex<usize>>,
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl MockNotifier {
    pub fn new(config: MockNotifierConfig) -> Self {
        Self {
            granted: Arc::new(Mutex::new(config.granted)),
            config,
            request_count: Arc::new(Mutex::new(0)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn granted() -> Self {
        Self::new(MockNotifierConfig::default())
    }

    /// Permission is off and requests are refused
    pub fn denied() -> Self {
        Self::new(MockNotifierConfig {
            granted: false,
            grant_on_request: false,
            ..Default::default()
        })
    }

    pub fn send_failure(error: &str) -> Self {
        Self::new(MockNotifierConfig {
            send_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    pub fn request_count(&self) -> usize {
        *self.request_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Everything successfully sent so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn permission_error(&self) -> Option<SkyfareError> {
        self.config
            .permission_error
            .as_ref()
            .map(|e| SkyfareError::Notification(e.clone()))
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn is_permission_granted(&self) -> Result<bool> {
        if let Some(e) = self.permission_error() {
            return Err(e);
        }
        Ok(*self.granted.lock().unwrap_or_else(|e| e.into_inner()))
    }

    async fn request_permission(&self) -> Result<bool> {
        *self.request_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        if let Some(e) = self.permission_error() {
            return Err(e);
        }

        let mut granted = self.granted.lock().unwrap_or_else(|e| e.into_inner());
        if self.config.grant_on_request {
            *granted = true;
        }
        Ok(*granted)
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        if let Some(e) = &self.config.send_error {
            return Err(SkyfareError::Notification(e.clone()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
