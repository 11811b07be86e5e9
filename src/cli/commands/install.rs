//! Install command - precache the configured version and register it

use super::WorkerContext;
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::SootResult;
use crate::ui::{self, PrecacheProgress, UiContext};
use crate::worker::WorkerState;
use std::path::Path;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect();
    let runtime = WorkerContext::open(config, state_dir)?;
    let mut registration = runtime.registration().await?;
    let cache_name = runtime.worker.cache_name().to_string();

    ui::intro(&ctx, &format!("Installing {}", cache_name));

    let progress = PrecacheProgress::new(&ctx, runtime.worker.settings().precache.len() as u64);
    let result = registration
        .install(
            &runtime.worker,
            &runtime.host,
            &|url| progress.on_fetched(url),
            !args.no_activate,
        )
        .await;
    progress.finish();

    let state = match result {
        Ok(state) => state,
        Err(e) => {
            if let Some(active) = registration.controller() {
                ui::remark(&ctx, &format!("{} remains active", active.cache_name));
            }
            ui::outro_error(&ctx, &format!("{} is {}", cache_name, WorkerState::Redundant));
            return Err(e);
        }
    };

    runtime.save_registration(&registration).await?;

    match state {
        WorkerState::Active => ui::outro_success(&ctx, &format!("{} is active", cache_name)),
        _ => {
            ui::step_info(&ctx, &format!("{} is {}", cache_name, state));
            ui::remark(&ctx, "Run: sootcache activate");
        }
    }

    Ok(())
}
