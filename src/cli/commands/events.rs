//! Sync, push and click commands - fire the auxiliary worker events

use super::WorkerContext;
use crate::config::Config;
use crate::error::SootResult;
use crate::ui::{self, UiContext};
use crate::worker::Event;
use std::path::Path;

/// Fire a background sync
pub async fn sync(tag: String, config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect();
    let runtime = WorkerContext::open(config, state_dir)?;
    runtime.controlled().await?;

    runtime.worker.dispatch(Event::Sync { tag: tag.clone() }).await?;
    ui::step_ok(&ctx, &format!("Sync {} delivered", tag));
    Ok(())
}

/// Deliver a push message and show the resulting notification
pub async fn push(data: Option<String>, config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect();
    let runtime = WorkerContext::open(config, state_dir)?;
    runtime.controlled().await?;

    runtime.worker.dispatch(Event::Push { data }).await?;

    for notification in runtime.host.notifications() {
        ui::note(&ctx, &notification.title, &notification.body);
        let actions: Vec<String> = notification
            .actions
            .iter()
            .map(|a| format!("{} ({})", a.title, a.action))
            .collect();
        ui::key_value(&ctx, "actions", &actions.join(", "));
        ui::key_value(&ctx, "icon", &notification.icon);
    }
    Ok(())
}

/// Click the notification, optionally on one of its actions
pub async fn click(action: Option<String>, config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect();
    let runtime = WorkerContext::open(config, state_dir)?;
    runtime.controlled().await?;

    runtime
        .worker
        .dispatch(Event::NotificationClick { action })
        .await?;

    let opened = runtime.host.opened_windows();
    if opened.is_empty() {
        ui::step_info(&ctx, "Notification closed");
    }
    for url in opened {
        ui::step_ok_detail(&ctx, "Opened window", url.as_str());
    }
    Ok(())
}
