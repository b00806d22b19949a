//! Command authorization and status synchronization engine.
//!
//! The core knows nothing about Discord or HTTP: it consumes the control
//! panel and the chat surface through the [`PanelClient`] and
//! [`StatusSurface`] traits and is driven by the adapter crates.

pub mod access;
pub mod dispatch;
pub mod panel;
pub mod registry;
pub mod surface;
pub mod sync;

pub use {
    access::{AccessPolicy, Actor, GlobalAllowlist},
    dispatch::{CommandError, Dispatcher, Intent, Outcome},
    panel::{PanelClient, PanelError, PowerState},
    registry::{ManagedServer, RegistryError, ServerRegistry},
    surface::{StatusSurface, SurfaceError},
    sync::{MIN_UPDATE_INTERVAL, StatusSnapshot, SyncOptions, Synchronizer, render_label},
};
