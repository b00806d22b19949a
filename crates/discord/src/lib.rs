//! Discord adapter for the steward bot.
//!
//! Maps slash commands onto the core dispatcher via serenity, and implements
//! the status surface as a channel/category rename.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handler;
pub mod surface;

pub use {
    bot::run,
    error::{Error, Result},
};
