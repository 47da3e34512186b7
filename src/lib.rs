//! # Storefront Orders
//!
//! Order lifecycle and refund tracking engine for a client-side
//! storefront: orders placed at checkout, per-item delivery tracking
//! advanced on a timer, cancel/return transitions feeding a returned-items
//! ledger and a timer-stepped refund pipeline, and a payments ledger
//! projected from both. State lives in three JSON collections over a
//! pluggable key-value store; a single cooperative writer, no locking.

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod errors;
pub mod implementation;
pub mod remote;
pub mod scheduler;
pub mod store;
pub mod types;

// Re-exports for public API
pub use errors::{OrderFlowError, OrderFlowResult};
pub use implementation::OrderEngine;
pub use types::EngineConfig;
