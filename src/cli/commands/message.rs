//! Message command - post a control message to the worker

use super::WorkerContext;
use crate::cli::args::{MessageArgs, MessageKind};
use crate::config::Config;
use crate::error::SootResult;
use crate::ui::{self, UiContext};
use crate::worker::Command;
use std::path::Path;

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let runtime = WorkerContext::open(config, state_dir)?;

    match args.kind {
        MessageKind::SkipWaiting => skip_waiting(&ctx, &runtime).await,
        MessageKind::ClearCache => clear_cache(&ctx, &runtime).await,
    }
}

async fn skip_waiting(ctx: &UiContext, runtime: &WorkerContext) -> SootResult<()> {
    let mut registration = runtime.registration().await?;

    runtime
        .worker
        .handle_message(&Command::SkipWaiting.to_message())
        .await?;

    if registration
        .apply_skip_waiting(&runtime.worker, &runtime.host)
        .await?
    {
        runtime.save_registration(&registration).await?;
        ui::step_ok(ctx, &format!("{} is active", runtime.worker.cache_name()));
    } else {
        ui::step_info(ctx, "No version is waiting");
    }

    Ok(())
}

async fn clear_cache(ctx: &UiContext, runtime: &WorkerContext) -> SootResult<()> {
    let cache_name = runtime.worker.cache_name();
    let prompt = format!("Delete every entry in {}?", cache_name);

    if !ui::confirm(ctx, &prompt, false).await? {
        ui::step_info(ctx, "Cancelled");
        ui::remark(ctx, "Use --yes to clear without prompting");
        return Ok(());
    }

    runtime
        .worker
        .handle_message(&Command::ClearCache.to_message())
        .await?;
    ui::step_ok(ctx, &format!("Cleared {}", cache_name));

    Ok(())
}
