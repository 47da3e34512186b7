//! Implementation details for the order engine

pub mod order_lifecycle;
pub mod payments;
pub mod refund_pipeline;

use std::sync::Arc;

use tracing::warn;

use crate::errors::OrderFlowResult;
use crate::remote::{HttpOrderMirror, OrderMirror};
use crate::scheduler::{Clock, SystemClock, TickScheduler};
use crate::store::{RecordStore, StorageBackend};
use crate::types::records::{CustomerInfo, ItemDraft, Order, OrderId, Payment, ReturnedItem};
use crate::types::EngineConfig;

use order_lifecycle::OrderLifecycle;
use payments::PaymentsLedger;
use refund_pipeline::RefundPipeline;

/// The order engine: one object wiring the record store, the three
/// services and the tick scheduler. External callers (checkout, the
/// orders/returns/payments views) go through this facade.
pub struct OrderEngine {
    config:    EngineConfig,
    store:     Arc<RecordStore>,
    clock:     Arc<dyn Clock>,
    payments:  Arc<PaymentsLedger>,
    lifecycle: Arc<OrderLifecycle>,
    refunds:   Arc<RefundPipeline>,
}

impl OrderEngine {
    /// Creates an engine over a fresh in-memory store and the wall clock.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backend(config, Box::new(crate::store::MemoryBackend::new()))
    }

    /// Creates an engine over the given storage backend and the wall
    /// clock. The configured mirror URL, if any, is turned into an HTTP
    /// mirror; a mirror that cannot even be constructed is disabled for
    /// the session.
    #[must_use]
    pub fn with_backend(config: EngineConfig, backend: Box<dyn StorageBackend>) -> Self {
        let mirror: Option<Arc<dyn OrderMirror>> = match &config.mirror_base_url {
            Some(base_url) => match HttpOrderMirror::new(base_url.clone()) {
                Ok(mirror) => {
                    let mirror: Arc<dyn OrderMirror> = Arc::new(mirror);
                    Some(mirror)
                },
                Err(err) => {
                    warn!(%err, "disabling order mirror for this session");
                    None
                },
            },
            None => None,
        };

        Self::with_parts(config, backend, Arc::new(SystemClock), mirror)
    }

    /// Fully explicit constructor: backend, clock and mirror are all
    /// injected. This is the seam tests and simulations use.
    #[must_use]
    pub fn with_parts(
        config: EngineConfig, backend: Box<dyn StorageBackend>, clock: Arc<dyn Clock>,
        mirror: Option<Arc<dyn OrderMirror>>,
    ) -> Self {
        let store = Arc::new(RecordStore::new(backend));
        let payments = Arc::new(PaymentsLedger::new(store.clone(), clock.clone()));
        let lifecycle = Arc::new(OrderLifecycle::new(
            store.clone(),
            clock.clone(),
            payments.clone(),
            mirror,
        ));
        let refunds =
            Arc::new(RefundPipeline::new(store.clone(), clock.clone(), payments.clone()));

        Self { config, store, clock, payments, lifecycle, refunds }
    }

    // ========================================================================
    // CHECKOUT / ORDER UI
    // ========================================================================

    /// Places an order from checkout input.
    pub fn place_order(
        &self, items: Vec<ItemDraft>, customer: CustomerInfo,
    ) -> OrderFlowResult<Order> {
        self.lifecycle.place_order(items, customer)
    }

    /// Cancels an active item.
    pub fn cancel_item(&self, order_id: &OrderId, item_id: &str) -> OrderFlowResult<()> {
        self.lifecycle.cancel_item(order_id, item_id)
    }

    /// Returns an active item.
    pub fn return_item(&self, order_id: &OrderId, item_id: &str) -> OrderFlowResult<()> {
        self.lifecycle.return_item(order_id, item_id)
    }

    // ========================================================================
    // RETURNS / PAYMENTS UI
    // ========================================================================

    /// Hard-removes a returned-items ledger entry.
    pub fn delete_returned_item(&self, order_id: &OrderId, item_id: &str) -> OrderFlowResult<()> {
        self.refunds.delete_returned_item(order_id, item_id)
    }

    /// The returned-items ledger.
    #[must_use]
    pub fn returned_items(&self) -> Vec<ReturnedItem> {
        self.refunds.returned_items()
    }

    /// The payments ledger, reconciled on read.
    pub fn payments(&self) -> OrderFlowResult<Vec<Payment>> {
        self.payments.payments()
    }

    // ========================================================================
    // SERVICES & SCHEDULING
    // ========================================================================

    /// The order lifecycle service.
    #[must_use]
    pub fn lifecycle(&self) -> &Arc<OrderLifecycle> {
        &self.lifecycle
    }

    /// The refund pipeline service.
    #[must_use]
    pub fn refunds(&self) -> &Arc<RefundPipeline> {
        &self.refunds
    }

    /// The payments projection service.
    #[must_use]
    pub fn payments_ledger(&self) -> &Arc<PaymentsLedger> {
        &self.payments
    }

    /// The shared record store.
    #[must_use]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the scheduler running the engine's two periodic tasks at
    /// their configured, independent cadences. Tick failures are logged
    /// and retried on the next period; a failed save means the tick
    /// applied nothing.
    #[must_use]
    pub fn scheduler(&self) -> TickScheduler {
        let mut scheduler = TickScheduler::new(self.clock.clone());

        let lifecycle = self.lifecycle.clone();
        scheduler.register("delivery", self.config.delivery_tick_secs, move || {
            if let Err(err) = lifecycle.advance_delivery_tick() {
                warn!(%err, "delivery tick failed");
            }
        });

        let refunds = self.refunds.clone();
        scheduler.register("refund", self.config.refund_tick_secs, move || {
            if let Err(err) = refunds.advance_refund_tick() {
                warn!(%err, "refund tick failed");
            }
        });

        scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualClock;
    use crate::store::MemoryBackend;
    use crate::types::records::{ItemStatus, OrderStatus, PaymentStatus};

    fn engine_with_manual_clock() -> (OrderEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let engine = OrderEngine::with_parts(
            EngineConfig::default(),
            Box::new(MemoryBackend::new()),
            clock.clone(),
            None,
        );
        (engine, clock)
    }

    fn drafts() -> Vec<ItemDraft> {
        vec![ItemDraft::new("Keyboard", 100, 1), ItemDraft::new("Mouse", 50, 1)]
    }

    #[test]
    fn test_full_order_to_refund_flow() {
        // Scenarios A, B and C end to end through the facade.
        let (engine, clock) = engine_with_manual_clock();
        let order = engine.place_order(drafts(), CustomerInfo::default()).expect("place");

        let payments = engine.payments().expect("payments view");
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 150);
        assert_eq!(payments[0].status, PaymentStatus::Paid);
        assert_eq!(order.items[0].tracking_step_name(), "Order Placed");

        engine.cancel_item(&order.id, "line-1").expect("cancel");
        let payments = engine.payments().expect("payments view");
        assert_eq!(payments[0].status, PaymentStatus::Refunded);
        assert_eq!(payments[0].refund_step, 0);
        assert_eq!(engine.lifecycle().orders()[0].status, OrderStatus::Active);

        engine.return_item(&order.id, "line-2").expect("return");
        assert_eq!(engine.lifecycle().orders()[0].status, OrderStatus::Completed);
        assert_eq!(engine.returned_items().len(), 1);

        // Four refund periods on the scheduler's clock.
        let mut scheduler = engine.scheduler();
        for _ in 0..4 {
            clock.advance(engine.config().refund_tick_secs);
            scheduler.run_pending();
        }

        let entries = engine.returned_items();
        assert_eq!(entries[0].refund_step, 3);
        assert_eq!(entries[0].refund_step_name(), "Amount Credited");
        let payments = engine.payments().expect("payments view");
        assert_eq!(payments[0].refund_step, 3);
        assert_eq!(payments[0].status, PaymentStatus::Refunded);
        assert_eq!(payments[0].status.display_name(), "Refunded");
        assert!(payments[0].refund_date.is_some());
    }

    #[test]
    fn test_scheduler_cadences_through_engine() {
        let (engine, clock) = engine_with_manual_clock();
        let order = engine.place_order(drafts(), CustomerInfo::default()).expect("place");
        engine.return_item(&order.id, "line-2").expect("return");

        let mut scheduler = engine.scheduler();
        assert_eq!(scheduler.task_names(), vec!["delivery", "refund"]);

        // 20 seconds: two delivery periods (10 s), five refund periods (4 s).
        for _ in 0..20 {
            clock.advance(1);
            scheduler.run_pending();
        }

        let orders = engine.lifecycle().orders();
        assert_eq!(orders[0].items[0].tracking_step, 2);
        // Refund pipeline capped at the final stage after 3 of 5 periods.
        assert_eq!(engine.returned_items()[0].refund_step, 3);
    }

    #[test]
    fn test_delete_returned_item_through_engine() {
        // Scenario E at the facade level.
        let (engine, _) = engine_with_manual_clock();
        let order = engine.place_order(drafts(), CustomerInfo::default()).expect("place");
        engine.return_item(&order.id, "line-1").expect("return");

        engine.delete_returned_item(&order.id, "line-1").expect("delete");

        assert!(engine.returned_items().is_empty());
        assert_eq!(engine.lifecycle().orders()[0].items[0].status, ItemStatus::Returned);
        let payments = engine.payments().expect("payments view");
        assert_eq!(payments[0].status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_engine_defaults() {
        let engine = OrderEngine::new(EngineConfig::default());
        assert_eq!(engine.config().delivery_tick_secs, 10);
        assert_eq!(engine.config().refund_tick_secs, 4);
        assert!(engine.lifecycle().orders().is_empty());
    }

    #[test]
    fn test_unreachable_mirror_degrades_to_local() {
        // Discard port: the push is refused, the local write still lands.
        let config = EngineConfig::default()
            .with_refund_tick_secs(2)
            .with_mirror_base_url("http://127.0.0.1:9/");
        let engine = OrderEngine::with_backend(config, Box::new(MemoryBackend::new()));

        engine
            .place_order(drafts(), CustomerInfo::default())
            .expect("local placement must survive mirror failure");
        assert_eq!(engine.lifecycle().orders().len(), 1);
        assert_eq!(engine.lifecycle().mirrored_orders().len(), 1);
        assert_eq!(engine.config().refund_tick_secs, 2);
    }
}
