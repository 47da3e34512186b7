//! Order lifecycle implementation.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::errors::{OrderFlowError, OrderFlowResult};
use crate::implementation::payments::PaymentsLedger;
use crate::remote::OrderMirror;
use crate::scheduler::Clock;
use crate::store::{RecordStore, ORDERS, RETURNED_ITEMS};
use crate::types::records::{
    CustomerInfo, ItemDraft, ItemStatus, Order, OrderId, OrderItem, OrderStatus, ReturnedItem,
    FINAL_STEP,
};

/// First order number handed out on a fresh store.
const FIRST_ORDER_NUMBER: u64 = 1000;

/// Order lifecycle service.
pub struct OrderLifecycle {
    store:         Arc<RecordStore>,
    clock:         Arc<dyn Clock>,
    payments:      Arc<PaymentsLedger>,
    mirror:        Option<Arc<dyn OrderMirror>>,
    order_counter: Mutex<u64>,
}

impl OrderLifecycle {
    /// Creates the service over the shared store, clock and payments
    /// projection. The order counter resumes above the highest sequential
    /// ID already persisted, so IDs stay unique across sessions.
    #[must_use]
    pub fn new(
        store: Arc<RecordStore>, clock: Arc<dyn Clock>, payments: Arc<PaymentsLedger>,
        mirror: Option<Arc<dyn OrderMirror>>,
    ) -> Self {
        let orders: Vec<Order> = store.load(ORDERS);
        let next = orders
            .iter()
            .filter_map(|o| o.id.sequence())
            .max()
            .map_or(FIRST_ORDER_NUMBER, |n| n + 1);

        Self { store, clock, payments, mirror, order_counter: Mutex::new(next) }
    }

    // ========================================================================
    // CHECKOUT
    // ========================================================================

    /// Places an order from checkout input. Every item starts `Active` at
    /// tracking step 0; the order starts `Active`. No payment record is
    /// created here; the projection creates one lazily on first
    /// observation.
    pub fn place_order(
        &self, drafts: Vec<ItemDraft>, customer: CustomerInfo,
    ) -> OrderFlowResult<Order> {
        if drafts.is_empty() {
            return Err(OrderFlowError::EmptyOrder);
        }
        if drafts.iter().any(|d| d.quantity == 0) {
            return Err(OrderFlowError::InvalidQuantity);
        }

        let items = drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| OrderItem {
                id: format!("line-{}", i + 1),
                name: draft.name,
                price: draft.price,
                quantity: draft.quantity,
                image: draft.image,
                status: ItemStatus::Active,
                tracking_step: 0,
            })
            .collect();

        let order = Order {
            id: self.next_order_id()?,
            items,
            customer,
            status: OrderStatus::Active,
            placed_at: self.clock.now_unix(),
        };

        let mut orders: Vec<Order> = self.store.load(ORDERS);
        orders.push(order.clone());
        self.store.save(ORDERS, &orders)?;
        self.push_mirror(&orders);

        debug!(order_id = %order.id, items = order.items.len(), "order placed");
        Ok(order)
    }

    // ========================================================================
    // DELIVERY TRACKING
    // ========================================================================

    /// Advances delivery tracking for every active item of every active
    /// order by one stage, capped at the absorbing final stage. Items that
    /// left `Active` are frozen. Returns the number of items advanced.
    pub fn advance_delivery_tick(&self) -> OrderFlowResult<usize> {
        let mut orders: Vec<Order> = self.store.load(ORDERS);
        let mut advanced = 0;

        for order in orders.iter_mut().filter(|o| o.status == OrderStatus::Active) {
            for item in order.items.iter_mut().filter(|i| i.status == ItemStatus::Active) {
                if item.tracking_step < FINAL_STEP {
                    item.tracking_step += 1;
                    advanced += 1;
                }
            }
        }

        self.store.save(ORDERS, &orders)?;
        if advanced > 0 {
            debug!(advanced, "delivery tracking advanced");
        }
        Ok(advanced)
    }

    // ========================================================================
    // CANCEL / RETURN
    // ========================================================================

    /// Cancels an active item. Recomputes the order status and flips the
    /// order's payment to `Refunded` at refund step 0.
    pub fn cancel_item(&self, order_id: &OrderId, item_id: &str) -> OrderFlowResult<()> {
        self.transition_item(order_id, item_id, ItemStatus::Cancelled)
    }

    /// Returns an active item. Same as cancelling, plus a returned-items
    /// ledger entry that enters the refund pipeline at step 0.
    pub fn return_item(&self, order_id: &OrderId, item_id: &str) -> OrderFlowResult<()> {
        self.transition_item(order_id, item_id, ItemStatus::Returned)
    }

    fn transition_item(
        &self, order_id: &OrderId, item_id: &str, to: ItemStatus,
    ) -> OrderFlowResult<()> {
        let not_eligible = || OrderFlowError::ItemNotEligible {
            order_id: order_id.to_string(),
            item_id:  item_id.to_string(),
        };

        let mut orders: Vec<Order> = self.store.load(ORDERS);

        let Some(order) = orders.iter_mut().find(|o| &o.id == order_id) else {
            warn!(%order_id, item_id, "transition requested for unknown order");
            return Err(not_eligible());
        };
        let Some(item) = order.items.iter_mut().find(|i| i.id == item_id) else {
            warn!(%order_id, item_id, "transition requested for unknown item");
            return Err(not_eligible());
        };
        if item.status != ItemStatus::Active {
            warn!(
                %order_id,
                item_id,
                status = item.status.display_name(),
                "transition requested for terminal item"
            );
            return Err(not_eligible());
        }

        item.status = to;
        let ledger_entry = (to == ItemStatus::Returned)
            .then(|| ReturnedItem::from_item(item, order_id, self.clock.now_unix()));
        order.recompute_status();

        self.store.save(ORDERS, &orders)?;

        if let Some(entry) = ledger_entry {
            let mut entries: Vec<ReturnedItem> = self.store.load(RETURNED_ITEMS);
            entries.push(entry);
            self.store.save(RETURNED_ITEMS, &entries)?;
        }

        self.payments.begin_refund(order_id)?;
        self.push_mirror(&orders);

        debug!(%order_id, item_id, status = to.display_name(), "item transitioned");
        Ok(())
    }

    // ========================================================================
    // READ VIEWS
    // ========================================================================

    /// Every order, in placement order.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.store.load(ORDERS)
    }

    /// Active orders that still have at least one active item: the
    /// storefront's "your orders" view.
    #[must_use]
    pub fn active_orders(&self) -> Vec<Order> {
        self.orders()
            .into_iter()
            .filter(|o| o.status == OrderStatus::Active && o.has_active_items())
            .collect()
    }

    /// Orders whose every item is terminal.
    #[must_use]
    pub fn completed_orders(&self) -> Vec<Order> {
        self.orders().into_iter().filter(|o| o.status == OrderStatus::Completed).collect()
    }

    /// Orders with at least one cancelled item. The view filters; it never
    /// deletes; cancelled line items stay on their order.
    #[must_use]
    pub fn cancelled_orders(&self) -> Vec<Order> {
        self.orders().into_iter().filter(Order::has_cancelled_items).collect()
    }

    /// Orders as seen by the remote mirror, falling back to the local
    /// store when the mirror is absent or unreachable.
    #[must_use]
    pub fn mirrored_orders(&self) -> Vec<Order> {
        if let Some(mirror) = &self.mirror {
            match mirror.fetch_orders() {
                Ok(orders) => return orders,
                Err(err) => {
                    warn!(%err, "mirror unreachable, serving local orders");
                },
            }
        }
        self.orders()
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    fn next_order_id(&self) -> OrderFlowResult<OrderId> {
        let mut counter = self.order_counter.lock().map_err(|_| OrderFlowError::Lock)?;
        let id = OrderId::from_sequence(*counter);
        *counter += 1;
        Ok(id)
    }

    /// Best-effort push to the remote mirror. Failures are logged and
    /// swallowed; the local store stays authoritative.
    fn push_mirror(&self, orders: &[Order]) {
        if let Some(mirror) = &self.mirror {
            if let Err(err) = mirror.push_orders(orders) {
                warn!(%err, "order mirror push failed");
            }
        }
    }
}
