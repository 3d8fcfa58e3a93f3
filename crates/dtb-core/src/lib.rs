//! Core domain + application logic for the traffic usage bot.
//!
//! This crate is intentionally framework-agnostic. The account/hosting HTTP clients and
//! Telegram live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod filters;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod usage;

pub use errors::{Error, Result};
