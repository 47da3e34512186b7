//! # Payments Projection
//!
//! Maintains the per-order payments ledger derived from orders and the
//! returned-items ledger: one `Paid` record per observed order, flipped to
//! `Refunded` by cancel/return events and stepped along the refund pipeline
//! as returns progress.

mod service;


pub use service::{PaymentsLedger, SyncReport};
