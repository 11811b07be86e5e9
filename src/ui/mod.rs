//! Terminal UI with automatic fallback to plain output in CI
//!
//! Uses `cliclack` for framing and prompts and `indicatif` for the precache
//! progress bar. Every entry point takes a [`UiContext`] and degrades to
//! plain `println!` lines when stdout is not an interactive terminal.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, note, outro_error, outro_success, remark, step_info,
    step_ok, step_ok_detail, step_warn_hint,
};
pub use progress::{PrecacheProgress, TaskSpinner};
pub use prompts::confirm;
