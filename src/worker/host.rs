//! Services the host runtime provides to the worker
//!
//! The worker never talks to pages directly. Skipping the waiting phase,
//! claiming clients, showing notifications and opening windows all go through
//! `ServiceHost`. `LocalHost` records each call so the CLI can report it and
//! tests can assert on it.

use crate::error::SootResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};
use url::Url;

/// Button shown on a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Data attached to a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    pub date_of_arrival: DateTime<Utc>,
    pub primary_key: u32,
}

/// A notification to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Abstract host runtime interface
#[async_trait]
pub trait ServiceHost: Send + Sync {
    /// Ask to replace the active version as soon as this one is installed
    async fn skip_waiting(&self) -> SootResult<()>;

    /// Take control of every open client page
    async fn claim_clients(&self) -> SootResult<()>;

    /// Display a notification
    async fn show_notification(&self, notification: Notification) -> SootResult<()>;

    /// Dismiss a displayed notification by title
    async fn close_notification(&self, title: &str) -> SootResult<()>;

    /// Open a new client window
    async fn open_window(&self, url: &Url) -> SootResult<()>;
}

/// Host that records requests in memory
#[derive(Debug, Default)]
pub struct LocalHost {
    skip_waiting: AtomicBool,
    claimed: AtomicBool,
    notifications: Mutex<Vec<Notification>>,
    opened: Mutex<Vec<Url>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a skip-waiting request is pending
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Consume a pending skip-waiting request
    pub fn take_skip_waiting(&self) -> bool {
        self.skip_waiting.swap(false, Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Notifications currently displayed
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Windows opened so far
    pub fn opened_windows(&self) -> Vec<Url> {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ServiceHost for LocalHost {
    async fn skip_waiting(&self) -> SootResult<()> {
        debug!("Skip waiting requested");
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self) -> SootResult<()> {
        debug!("Claiming clients");
        self.claimed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn show_notification(&self, notification: Notification) -> SootResult<()> {
        info!("Showing notification: {}", notification.title);
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
        Ok(())
    }

    async fn close_notification(&self, title: &str) -> SootResult<()> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|n| n.title != title);
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> SootResult<()> {
        info!("Opening window: {}", url);
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.clone());
        Ok(())
    }
}
