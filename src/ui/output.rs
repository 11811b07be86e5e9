//! Output functions for consistent CLI formatting
//!
//! Interactive terminals get cliclack framing; everything else gets plain
//! bracketed tags that read well in CI logs.

use super::context::UiContext;
use console::{style, Style};

/// Display intro banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

/// Display success outro
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

/// Display error outro
pub fn outro_error(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).red().bold()).ok();
    } else {
        println!("{} {}", style("[ERROR]").red(), message);
    }
}

/// Display a titled note
pub fn note(ctx: &UiContext, title: &str, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::note(title, message).ok();
    } else {
        println!("{}: {}", style(title).bold(), message);
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    step_ok(ctx, &format!("{} ({})", message, style(detail).dim()));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        println!("  {} {}", style("[INFO]").cyan(), message);
    }
}

/// Display a warning with a dimmed hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{} - {}", message, style(hint).dim())).ok();
    } else {
        println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
    }
}

/// Display a dimmed remark
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// Key-value pair colored by whether the value is healthy
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    if ctx.use_fancy_output() {
        let value_style = if ok {
            Style::new().green()
        } else {
            Style::new().yellow()
        };
        println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
    } else {
        println!("  {}: {}", key, value);
    }
}
