//! # Order Lifecycle Manager
//!
//! Creates orders at checkout, advances per-item delivery tracking on the
//! delivery tick, and applies the cancel/return transitions that feed the
//! returned-items ledger and flip payments to `Refunded`.

mod service;

#[cfg(test)]
mod tests;

pub use service::OrderLifecycle;
