//! Payments ledger implementation.

use std::sync::Arc;

use tracing::debug;

use crate::errors::OrderFlowResult;
use crate::scheduler::Clock;
use crate::store::{RecordStore, ORDERS, PAYMENTS, RETURNED_ITEMS};
use crate::types::records::{
    Order, OrderId, Payment, PaymentStatus, ReturnedItem, FINAL_STEP, UNSPECIFIED_METHOD,
};

/// Outcome of one reconciliation sweep over the payments collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Payments created for orders that had none.
    pub payments_created: u32,
    /// Payments updated from returned-ledger entries.
    pub refunds_mirrored: u32,
}

impl SyncReport {
    /// Whether the sweep changed anything.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.payments_created > 0 || self.refunds_mirrored > 0
    }
}

/// Payments projection service.
///
/// All operations are whole-collection read-modify-write over the shared
/// record store; safe under the engine's single-writer model.
pub struct PaymentsLedger {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
}

impl PaymentsLedger {
    /// Creates the service over a shared store and clock.
    #[must_use]
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Ensures a payment record exists for the order. Idempotent: a second
    /// call returns the existing record untouched. The amount is computed
    /// once, here, from the order's current item list.
    pub fn ensure_payment(&self, order: &Order) -> OrderFlowResult<Payment> {
        let mut payments: Vec<Payment> = self.store.load(PAYMENTS);

        if let Some(existing) = payments.iter().find(|p| p.order_id == order.id) {
            return Ok(existing.clone());
        }

        let payment = Payment::for_order(next_id(&payments), order, self.clock.now_unix());
        payments.push(payment.clone());
        self.store.save(PAYMENTS, &payments)?;
        debug!(order_id = %order.id, amount = payment.amount, "payment created");
        Ok(payment)
    }

    /// Cancel/return trigger: flips the order's payment to `Refunded` and
    /// resets its refund step to the start of the pipeline. The refund date
    /// is stamped at this first transition. Creates the record with
    /// ensure-time defaults if the order was never observed.
    pub fn begin_refund(&self, order_id: &OrderId) -> OrderFlowResult<()> {
        let now = self.clock.now_unix();
        let mut payments: Vec<Payment> = self.store.load(PAYMENTS);

        match payments.iter().position(|p| &p.order_id == order_id) {
            Some(index) => {
                let payment = &mut payments[index];
                payment.status = PaymentStatus::Refunded;
                payment.refund_step = 0;
                payment.refund_date = Some(now);
            },
            None => {
                let mut payment = self.payment_defaults(next_id(&payments), order_id, now);
                payment.status = PaymentStatus::Refunded;
                payment.refund_date = Some(now);
                payments.push(payment);
            },
        }

        self.store.save(PAYMENTS, &payments)?;
        debug!(%order_id, "payment marked refunded, pipeline reset");
        Ok(())
    }

    /// Idempotent upsert from the refund pipeline: the refund step only
    /// moves forward (`max` of current and reported), status becomes
    /// `Refunded`, and the refund date is recorded.
    pub fn mark_refunded(
        &self, order_id: &OrderId, refund_step: u8, refund_date: u64,
    ) -> OrderFlowResult<()> {
        let refund_step = refund_step.min(FINAL_STEP);
        let mut payments: Vec<Payment> = self.store.load(PAYMENTS);

        match payments.iter().position(|p| &p.order_id == order_id) {
            Some(index) => {
                let payment = &mut payments[index];
                payment.status = PaymentStatus::Refunded;
                payment.refund_step = payment.refund_step.max(refund_step);
                payment.refund_date = Some(refund_date);
            },
            None => {
                let mut payment =
                    self.payment_defaults(next_id(&payments), order_id, self.clock.now_unix());
                payment.status = PaymentStatus::Refunded;
                payment.refund_step = refund_step;
                payment.refund_date = Some(refund_date);
                payments.push(payment);
            },
        }

        self.store.save(PAYMENTS, &payments)
    }

    /// Reconciles the projection from both source ledgers: every order
    /// gains a payment if it has none, and every returned-ledger entry
    /// mirrors its furthest refund step and return date into the payment.
    pub fn synchronize(&self) -> OrderFlowResult<SyncReport> {
        let orders: Vec<Order> = self.store.load(ORDERS);
        let returned: Vec<ReturnedItem> = self.store.load(RETURNED_ITEMS);
        let mut payments: Vec<Payment> = self.store.load(PAYMENTS);
        let mut report = SyncReport::default();

        for order in &orders {
            if !payments.iter().any(|p| p.order_id == order.id) {
                let payment = Payment::for_order(next_id(&payments), order, self.clock.now_unix());
                payments.push(payment);
                report.payments_created += 1;
            }
        }

        for entry in &returned {
            match payments.iter().position(|p| p.order_id == entry.order_id) {
                Some(index) => {
                    let payment = &mut payments[index];
                    let mirrored_step = payment.refund_step.max(entry.refund_step);
                    if payment.status != PaymentStatus::Refunded
                        || payment.refund_step != mirrored_step
                    {
                        report.refunds_mirrored += 1;
                    }
                    payment.status = PaymentStatus::Refunded;
                    payment.refund_step = mirrored_step;
                    payment.refund_date = Some(entry.return_date);
                },
                None => {
                    let payment = Payment {
                        id: next_id(&payments),
                        order_id: entry.order_id.clone(),
                        date: self.clock.now_unix(),
                        amount: entry.refund_total(),
                        method: UNSPECIFIED_METHOD.to_string(),
                        status: PaymentStatus::Refunded,
                        refund_step: entry.refund_step,
                        refund_date: Some(entry.return_date),
                    };
                    payments.push(payment);
                    report.refunds_mirrored += 1;
                },
            }
        }

        if report.changed() {
            self.store.save(PAYMENTS, &payments)?;
            debug!(
                created = report.payments_created,
                mirrored = report.refunds_mirrored,
                "payments synchronized"
            );
        }

        Ok(report)
    }

    /// The payments collection, reconciled first so lazily created records
    /// appear on first read.
    pub fn payments(&self) -> OrderFlowResult<Vec<Payment>> {
        self.synchronize()?;
        Ok(self.store.load(PAYMENTS))
    }

    /// Defaults for a payment created outside `ensure_payment`, where the
    /// order may no longer be loadable: amount falls back to the order's
    /// current items when present, zero otherwise.
    fn payment_defaults(&self, id: u64, order_id: &OrderId, date: u64) -> Payment {
        let orders: Vec<Order> = self.store.load(ORDERS);
        match orders.iter().find(|o| &o.id == order_id) {
            Some(order) => Payment::for_order(id, order, date),
            None => Payment {
                id,
                order_id: order_id.clone(),
                date,
                amount: 0,
                method: UNSPECIFIED_METHOD.to_string(),
                status: PaymentStatus::Paid,
                refund_step: 0,
                refund_date: None,
            },
        }
    }
}

fn next_id(payments: &[Payment]) -> u64 {
    payments.len() as u64 + 1
}
