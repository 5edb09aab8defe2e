//! Toast notifications.
//!
//! Collections and the auth flow report outcomes through a [`Notifier`];
//! whoever renders them drains the paired [`NotificationFeed`]. In the
//! server each request gets its own pair and the drained toasts are returned
//! with the response.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

/// A single toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Sending half. Cloning shares the same feed.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

/// Receiving half.
#[derive(Debug)]
pub struct NotificationFeed {
    rx: mpsc::UnboundedReceiver<Notification>,
}

/// Create a connected notifier and feed.
#[must_use]
pub fn channel() -> (Notifier, NotificationFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, NotificationFeed { rx })
}

impl Notifier {
    /// A notifier whose toasts are only logged.
    #[must_use]
    pub fn discard() -> Self {
        channel().0
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    fn push(&self, level: Level, message: String) {
        match level {
            Level::Error => tracing::warn!(%message, "Error notification"),
            Level::Success | Level::Info => tracing::info!(%message, "Notification"),
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message,
            created_at: Utc::now(),
        };
        // A dropped feed means nobody is rendering; the log line above stands.
        let _ = self.tx.send(notification);
    }
}

impl NotificationFeed {
    /// Take every pending notification, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.rx.try_recv() {
            drained.push(notification);
        }
        drained
    }
}
