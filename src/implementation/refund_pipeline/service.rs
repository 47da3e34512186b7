//! Refund pipeline implementation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{OrderFlowError, OrderFlowResult};
use crate::implementation::payments::PaymentsLedger;
use crate::scheduler::Clock;
use crate::store::{RecordStore, RETURNED_ITEMS};
use crate::types::records::{OrderId, ReturnedItem, FINAL_STEP};

/// Refund/return pipeline service.
pub struct RefundPipeline {
    store:    Arc<RecordStore>,
    clock:    Arc<dyn Clock>,
    payments: Arc<PaymentsLedger>,
}

impl RefundPipeline {
    /// Creates the service over the shared store, clock and payments
    /// projection.
    #[must_use]
    pub fn new(
        store: Arc<RecordStore>, clock: Arc<dyn Clock>, payments: Arc<PaymentsLedger>,
    ) -> Self {
        Self { store, clock, payments }
    }

    /// Advances every ledger entry below the final stage by one step. An
    /// entry arriving at the final stage marks its order's payment fully
    /// refunded, stamping the refund date. Returns the number of entries
    /// advanced.
    pub fn advance_refund_tick(&self) -> OrderFlowResult<usize> {
        let now = self.clock.now_unix();
        let mut entries: Vec<ReturnedItem> = self.store.load(RETURNED_ITEMS);
        let mut advanced = 0;
        let mut credited: Vec<OrderId> = Vec::new();

        for entry in &mut entries {
            if entry.refund_step < FINAL_STEP {
                entry.refund_step += 1;
                advanced += 1;
                if entry.refund_step == FINAL_STEP {
                    credited.push(entry.order_id.clone());
                }
            }
        }

        self.store.save(RETURNED_ITEMS, &entries)?;

        for order_id in credited {
            self.payments.mark_refunded(&order_id, FINAL_STEP, now)?;
        }

        if advanced > 0 {
            debug!(advanced, "refund pipeline advanced");
        }
        Ok(advanced)
    }

    /// Hard-removes a ledger entry. The source order keeps its item status
    /// and the payment keeps whatever refund state it reached; the ledger
    /// is an independent audit trail.
    pub fn delete_returned_item(&self, order_id: &OrderId, item_id: &str) -> OrderFlowResult<()> {
        let mut entries: Vec<ReturnedItem> = self.store.load(RETURNED_ITEMS);
        let before = entries.len();
        entries.retain(|e| !(&e.order_id == order_id && e.item_id == item_id));

        if entries.len() == before {
            warn!(%order_id, item_id, "no returned item to delete");
            return Err(OrderFlowError::ItemNotEligible {
                order_id: order_id.to_string(),
                item_id:  item_id.to_string(),
            });
        }

        self.store.save(RETURNED_ITEMS, &entries)
    }

    /// The returned-items ledger, in return order.
    #[must_use]
    pub fn returned_items(&self) -> Vec<ReturnedItem> {
        self.store.load(RETURNED_ITEMS)
    }
}
