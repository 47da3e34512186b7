//! # Refund/Return Pipeline
//!
//! The returned-items ledger and its timer-stepped refund state machine.
//! Entries advance one stage per tick until the absorbing final stage,
//! where the order's payment is marked fully refunded.

mod service;


pub use service::RefundPipeline;
