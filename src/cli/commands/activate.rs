//! Activate command - promote the waiting version

use super::WorkerContext;
use crate::config::Config;
use crate::error::SootResult;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the activate command
pub async fn execute(config: &Config, state_dir: &Path) -> SootResult<()> {
    let ctx = UiContext::detect();
    let runtime = WorkerContext::open(config, state_dir)?;
    let mut registration = runtime.registration().await?;

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Activating {}...", runtime.worker.cache_name()));

    let deleted = match registration.activate(&runtime.worker).await {
        Ok(deleted) => deleted,
        Err(e) => {
            spinner.stop_error("Activation failed");
            return Err(e);
        }
    };
    runtime.save_registration(&registration).await?;

    spinner.stop(&format!("{} is active", runtime.worker.cache_name()));
    for name in &deleted {
        ui::step_ok_detail(&ctx, "Deleted old cache", name);
    }

    Ok(())
}
