//! CLI command implementations

pub mod activate;
pub mod config;
mod context;
pub mod events;
pub mod fetch;
pub mod install;
pub mod message;
pub mod status;

pub use activate::execute as activate;
pub use config::execute as config;
pub use context::WorkerContext;
pub use events::{click, push, sync};
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use message::execute as message;
pub use status::execute as status;
