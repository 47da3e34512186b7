//! # Remote Order Mirror
//!
//! Optional mirroring of the orders collection to a backend order API. The
//! mirror is never the source of truth: pushes happen after the local save
//! succeeds, reads fall back to the local store, and every failure is
//! reported as [`OrderFlowError::RemoteSync`] for the caller to swallow.

use crate::errors::{OrderFlowError, OrderFlowResult};
use crate::types::records::Order;

/// A remote order API the engine may mirror reads and writes to.
pub trait OrderMirror: Send + Sync {
    /// Pushes the full orders collection after a local mutation.
    fn push_orders(&self, orders: &[Order]) -> OrderFlowResult<()>;

    /// Fetches the mirrored orders collection.
    fn fetch_orders(&self) -> OrderFlowResult<Vec<Order>>;
}

/// HTTP mirror speaking JSON to `{base_url}/api/orders`.
pub struct HttpOrderMirror {
    base_url: String,
    client:   reqwest::blocking::Client,
}

impl HttpOrderMirror {
    /// Creates a mirror client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> OrderFlowResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| OrderFlowError::RemoteSync(e.to_string()))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { base_url, client })
    }

    fn orders_url(&self) -> String {
        format!("{}/api/orders", self.base_url)
    }
}

impl OrderMirror for HttpOrderMirror {
    fn push_orders(&self, orders: &[Order]) -> OrderFlowResult<()> {
        self.client
            .put(self.orders_url())
            .json(orders)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map(|_| ())
            .map_err(|e| OrderFlowError::RemoteSync(e.to_string()))
    }

    fn fetch_orders(&self) -> OrderFlowResult<Vec<Order>> {
        self.client
            .get(self.orders_url())
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| OrderFlowError::RemoteSync(e.to_string()))?
            .json()
            .map_err(|e| OrderFlowError::RemoteSync(e.to_string()))
    }
}
