//! Autonomous reply engine for a personal messaging account.

pub mod commands;
pub mod config;
pub mod context;
pub mod cooldown;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod presence;
pub mod store;
pub mod transport;

pub use error::{Error, Result};
