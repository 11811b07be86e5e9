//! sootcache - offline cache worker for a static site
//!
//! Precaches the site shell on install, drops stale cache generations on
//! activate, and answers requests with network-first navigation and
//! stale-while-revalidate for everything else.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod ui;
pub mod worker;

pub use error::{SootError, SootResult};
