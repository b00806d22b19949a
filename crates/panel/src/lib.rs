//! Crafty Controller v2 REST client.
//!
//! Thin capability wrapper implementing [`steward_core::PanelClient`]:
//! session login (or a static bearer token), start/stop/restart actions and
//! status reads, every call with a bounded timeout.

pub mod client;
pub mod types;

pub use {
    client::CraftyClient,
    types::{ServerStats, ServerSummary},
};
