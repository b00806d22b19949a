//! Shared error plumbing for the steward workspace.
//!
//! Crates define their own `thiserror` error enums; this crate only carries
//! the [`FromMessage`] trait and the [`impl_context!`] macro that wire those
//! enums up with `.context()` helpers.

pub mod error;

pub use error::FromMessage;
