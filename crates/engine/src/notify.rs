//! Notification sink boundary.
//!
//! Fire-and-forget: a failed delivery is logged and never rolls back the
//! status change that triggered it.

use std::sync::Mutex;

use thiserror::Error;

use waybill_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// A single outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_ids: Vec<UserId>,
    pub title: String,
    pub message: String,
    pub entity_type: String,
    pub entity_id: String,
}

/// Delivery boundary for interested-party notifications.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Discards everything. Default for contexts with no delivery channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Captures notifications for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError("lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for std::sync::Arc<S> {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        (**self).notify(notification)
    }
}
