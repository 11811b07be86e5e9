//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{SootError, SootResult};

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> SootResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on the terminal
    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message).initial_value(default).interact()
    })
    .await
    .map_err(|e| SootError::Internal(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| SootError::User(format!("Prompt failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirm_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Clear cache?", false).await.unwrap());
    }

    #[tokio::test]
    async fn confirm_non_interactive_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Clear cache?", true).await.unwrap());
        assert!(!confirm(&ctx, "Clear cache?", false).await.unwrap());
    }
}
