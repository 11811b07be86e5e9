//! Control messages, background sync, push and notification clicks
//!
//! None of these touch cached entries except `CLEAR_CACHE`. Sync, push and
//! click handlers log their own failures and never return an error.

use super::host::{Notification, NotificationAction, NotificationData};
use super::CacheWorker;
use crate::error::SootResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Sync tag registered by the contact form
pub const CONTACT_FORM_SYNC_TAG: &str = "contact-form-sync";

/// Commands a page can post to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Activate a waiting version without waiting for old clients to close
    SkipWaiting,
    /// Drop the current generation; fetches repopulate it lazily
    ClearCache,
}

impl Command {
    /// Parse a posted message; anything unrecognized yields `None`
    pub fn from_message(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }

    /// The message payload that encodes this command
    pub fn to_message(self) -> serde_json::Value {
        match self {
            Self::SkipWaiting => serde_json::json!({"type": "SKIP_WAITING"}),
            Self::ClearCache => serde_json::json!({"type": "CLEAR_CACHE"}),
        }
    }
}

impl CacheWorker {
    /// Handle a posted control message
    pub async fn handle_message(&self, payload: &serde_json::Value) -> SootResult<()> {
        match Command::from_message(payload) {
            Some(Command::SkipWaiting) => self.host.skip_waiting().await,
            Some(Command::ClearCache) => {
                self.storage.delete(&self.settings.cache_name).await?;
                info!("Cache cleared: {}", self.settings.cache_name);
                Ok(())
            }
            None => {
                debug!("Ignoring message: {}", payload);
                Ok(())
            }
        }
    }

    /// Handle a background sync
    pub async fn handle_sync(&self, tag: &str) {
        if tag == CONTACT_FORM_SYNC_TAG {
            info!("Syncing contact form...");
        } else {
            debug!("Ignoring sync tag {}", tag);
        }
    }

    /// Handle a push by showing a notification
    pub async fn handle_push(&self, data: Option<&str>) {
        let config = &self.settings.notifications;
        let notification = Notification {
            title: config.title.clone(),
            body: data
                .filter(|text| !text.is_empty())
                .unwrap_or(&config.default_body)
                .to_string(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: config.vibrate.clone(),
            data: NotificationData {
                date_of_arrival: Utc::now(),
                primary_key: 1,
            },
            actions: vec![
                NotificationAction {
                    action: "explore".to_string(),
                    title: "View".to_string(),
                },
                NotificationAction {
                    action: "close".to_string(),
                    title: "Close".to_string(),
                },
            ],
        };

        if let Err(e) = self.host.show_notification(notification).await {
            warn!("Failed to show notification: {}", e);
        }
    }

    /// Handle a click on a notification or one of its actions
    pub async fn handle_notification_click(&self, action: Option<&str>) {
        if let Err(e) = self
            .host
            .close_notification(&self.settings.notifications.title)
            .await
        {
            warn!("Failed to close notification: {}", e);
        }

        if action == Some("explore") {
            if let Err(e) = self.host.open_window(&self.settings.root_url).await {
                warn!("Failed to open window: {}", e);
            }
        }
    }
}
