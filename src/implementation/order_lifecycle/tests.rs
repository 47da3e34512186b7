//! # Order Lifecycle Tests

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::errors::{OrderFlowError, OrderFlowResult};
    use crate::implementation::order_lifecycle::OrderLifecycle;
    use crate::implementation::payments::PaymentsLedger;
    use crate::remote::OrderMirror;
    use crate::scheduler::ManualClock;
    use crate::store::{RecordStore, PAYMENTS, RETURNED_ITEMS};
    use crate::types::records::{
        CustomerInfo, ItemDraft, ItemStatus, Order, OrderId, OrderStatus, Payment, PaymentStatus,
        ReturnedItem,
    };

    fn lifecycle() -> (OrderLifecycle, Arc<RecordStore>, Arc<ManualClock>) {
        let store = Arc::new(RecordStore::in_memory());
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let payments = Arc::new(PaymentsLedger::new(store.clone(), clock.clone()));
        let service = OrderLifecycle::new(store.clone(), clock.clone(), payments, None);
        (service, store, clock)
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            first_name: "Asha".to_string(),
            city: "Pune".to_string(),
            phone: "9876543210".to_string(),
            email: "asha@example.com".to_string(),
            ..Default::default()
        }
    }

    fn two_item_order(service: &OrderLifecycle) -> Order {
        service
            .place_order(
                vec![
                    ItemDraft::new("Keyboard", 100, 1).with_image("kb.png"),
                    ItemDraft::new("Mouse", 50, 1),
                ],
                customer(),
            )
            .expect("should place order")
    }

    #[test]
    fn test_place_order_shape() {
        let (service, _, _) = lifecycle();
        let order = two_item_order(&service);

        assert_eq!(order.id.as_str(), "ORD-1000");
        assert_eq!(order.status, OrderStatus::Active);
        assert_eq!(order.placed_at, 1_700_000_000);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].id, "line-1");
        assert_eq!(order.items[1].id, "line-2");
        for item in &order.items {
            assert_eq!(item.status, ItemStatus::Active);
            assert_eq!(item.tracking_step, 0);
        }
        assert_eq!(order.customer.first_name, "Asha");
    }

    #[test]
    fn test_order_ids_are_monotonic() {
        let (service, _, _) = lifecycle();
        let first = two_item_order(&service);
        let second = two_item_order(&service);
        assert_eq!(first.id.as_str(), "ORD-1000");
        assert_eq!(second.id.as_str(), "ORD-1001");
    }

    #[test]
    fn test_counter_resumes_above_persisted_orders() {
        let (service, store, clock) = lifecycle();
        two_item_order(&service);
        two_item_order(&service);

        // A fresh service over the same store continues the sequence.
        let payments = Arc::new(PaymentsLedger::new(store.clone(), clock.clone()));
        let resumed = OrderLifecycle::new(store, clock, payments, None);
        let order = two_item_order(&resumed);
        assert_eq!(order.id.as_str(), "ORD-1002");
    }

    #[test]
    fn test_place_order_rejects_empty_checkout() {
        let (service, _, _) = lifecycle();
        let err = service.place_order(vec![], customer()).expect_err("should reject");
        assert!(matches!(err, OrderFlowError::EmptyOrder));
    }

    #[test]
    fn test_place_order_rejects_zero_quantity() {
        let (service, _, _) = lifecycle();
        let err = service
            .place_order(vec![ItemDraft::new("Keyboard", 100, 0)], customer())
            .expect_err("should reject");
        assert!(matches!(err, OrderFlowError::InvalidQuantity));
    }

    #[test]
    fn test_place_order_creates_no_payment() {
        let (service, store, _) = lifecycle();
        two_item_order(&service);
        let payments: Vec<Payment> = store.load(PAYMENTS);
        assert!(payments.is_empty());
    }

    #[test]
    fn test_delivery_tick_caps_at_final_stage() {
        // Scenario D: five ticks on a fresh item stop increasing at 3.
        let (service, _, _) = lifecycle();
        two_item_order(&service);

        let mut seen = Vec::new();
        for _ in 0..5 {
            service.advance_delivery_tick().expect("tick");
            let current = service.orders();
            seen.push(current[0].items[0].tracking_step);
        }

        assert_eq!(seen, vec![1, 2, 3, 3, 3]);
    }

    #[test]
    fn test_delivery_tick_skips_terminal_items() {
        let (service, _, _) = lifecycle();
        let order = two_item_order(&service);
        service.advance_delivery_tick().expect("tick");
        service.cancel_item(&order.id, "line-1").expect("should cancel");

        service.advance_delivery_tick().expect("tick");
        service.advance_delivery_tick().expect("tick");

        let current = service.orders();
        // Frozen at the step it had when cancelled.
        assert_eq!(current[0].items[0].tracking_step, 1);
        assert_eq!(current[0].items[1].tracking_step, 3);
    }

    #[test]
    fn test_delivery_tick_skips_completed_orders() {
        let (service, _, _) = lifecycle();
        let order = service
            .place_order(vec![ItemDraft::new("Keyboard", 100, 1)], customer())
            .expect("should place order");
        service.cancel_item(&order.id, "line-1").expect("should cancel");

        assert_eq!(service.advance_delivery_tick().expect("tick"), 0);
    }

    #[test]
    fn test_cancel_keeps_order_active_while_items_remain() {
        // Scenario B.
        let (service, store, _) = lifecycle();
        let order = two_item_order(&service);

        service.cancel_item(&order.id, "line-1").expect("should cancel");

        let current = service.orders();
        assert_eq!(current[0].status, OrderStatus::Active);
        assert_eq!(current[0].items[0].status, ItemStatus::Cancelled);
        assert_eq!(current[0].items[1].status, ItemStatus::Active);

        let payments: Vec<Payment> = store.load(PAYMENTS);
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Refunded);
        assert_eq!(payments[0].refund_step, 0);
    }

    #[test]
    fn test_return_of_last_item_completes_order() {
        // Scenario C, up to the ledger entry.
        let (service, store, _) = lifecycle();
        let order = two_item_order(&service);
        service.cancel_item(&order.id, "line-1").expect("should cancel");

        service.return_item(&order.id, "line-2").expect("should return");

        let current = service.orders();
        assert_eq!(current[0].status, OrderStatus::Completed);

        let entries: Vec<ReturnedItem> = store.load(RETURNED_ITEMS);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item_id, "line-2");
        assert_eq!(entries[0].name, "Mouse");
        assert_eq!(entries[0].refund_step, 0);
        assert_eq!(entries[0].return_date, 1_700_000_000);
    }

    #[test]
    fn test_cancel_leaves_no_ledger_entry() {
        let (service, store, _) = lifecycle();
        let order = two_item_order(&service);

        service.cancel_item(&order.id, "line-1").expect("should cancel");

        let entries: Vec<ReturnedItem> = store.load(RETURNED_ITEMS);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_terminal_item_is_not_eligible() {
        let (service, _, _) = lifecycle();
        let order = two_item_order(&service);
        service.cancel_item(&order.id, "line-1").expect("should cancel");

        let err = service.cancel_item(&order.id, "line-1").expect_err("already terminal");
        assert!(err.is_not_eligible());
        let err = service.return_item(&order.id, "line-1").expect_err("already terminal");
        assert!(err.is_not_eligible());
    }

    #[test]
    fn test_unknown_ids_are_not_eligible() {
        let (service, _, _) = lifecycle();
        let order = two_item_order(&service);

        let err = service
            .cancel_item(&OrderId::new("ORD-404"), "line-1")
            .expect_err("unknown order");
        assert!(err.is_not_eligible());

        let err = service.cancel_item(&order.id, "line-9").expect_err("unknown item");
        assert!(err.is_not_eligible());

        // Nothing moved.
        let current = service.orders();
        assert_eq!(current[0].items[0].status, ItemStatus::Active);
    }

    #[test]
    fn test_completion_invariant_over_random_transitions() {
        let (service, _, _) = lifecycle();
        let order = service
            .place_order(
                vec![
                    ItemDraft::new("A", 10, 1),
                    ItemDraft::new("B", 20, 1),
                    ItemDraft::new("C", 30, 1),
                ],
                customer(),
            )
            .expect("should place order");

        for (item_id, expect_completed) in
            [("line-2", false), ("line-1", false), ("line-3", true)]
        {
            service.return_item(&order.id, item_id).expect("should return");
            let current = service.orders();
            let all_terminal = current[0].items.iter().all(|i| i.status.is_terminal());
            assert_eq!(all_terminal, expect_completed);
            assert_eq!(
                current[0].status == OrderStatus::Completed,
                all_terminal,
                "status must match the every-item-terminal rule"
            );
        }
    }

    #[test]
    fn test_read_views() {
        let (service, _, _) = lifecycle();
        let first = two_item_order(&service);
        let second = service
            .place_order(vec![ItemDraft::new("Lamp", 75, 1)], customer())
            .expect("should place order");

        service.cancel_item(&first.id, "line-1").expect("cancel one of two");
        service.cancel_item(&second.id, "line-1").expect("cancel only item");

        let active = service.active_orders();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, first.id);

        let completed = service.completed_orders();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, second.id);

        let cancelled = service.cancelled_orders();
        assert_eq!(cancelled.len(), 2);
    }

    // ------------------------------------------------------------------------
    // Mirror behavior
    // ------------------------------------------------------------------------

    struct RecordingMirror {
        pushes: Mutex<usize>,
        fail:   bool,
    }

    impl RecordingMirror {
        fn new(fail: bool) -> Self {
            Self { pushes: Mutex::new(0), fail }
        }
    }

    impl OrderMirror for RecordingMirror {
        fn push_orders(&self, _orders: &[Order]) -> OrderFlowResult<()> {
            *self.pushes.lock().expect("test mutex") += 1;
            if self.fail {
                return Err(OrderFlowError::RemoteSync("connection refused".to_string()));
            }
            Ok(())
        }

        fn fetch_orders(&self) -> OrderFlowResult<Vec<Order>> {
            if self.fail {
                return Err(OrderFlowError::RemoteSync("connection refused".to_string()));
            }
            Ok(Vec::new())
        }
    }

    fn lifecycle_with_mirror(fail: bool) -> (OrderLifecycle, Arc<RecordingMirror>) {
        let store = Arc::new(RecordStore::in_memory());
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let payments = Arc::new(PaymentsLedger::new(store.clone(), clock.clone()));
        let mirror = Arc::new(RecordingMirror::new(fail));
        let as_mirror: Arc<dyn OrderMirror> = mirror.clone();
        let service = OrderLifecycle::new(store, clock, payments, Some(as_mirror));
        (service, mirror)
    }

    #[test]
    fn test_mutations_push_to_mirror() {
        let (service, mirror) = lifecycle_with_mirror(false);
        let order = two_item_order(&service);
        service.cancel_item(&order.id, "line-1").expect("should cancel");

        assert_eq!(*mirror.pushes.lock().expect("test mutex"), 2);
    }

    #[test]
    fn test_mirror_failure_is_swallowed() {
        let (service, mirror) = lifecycle_with_mirror(true);
        let order = two_item_order(&service);
        service.cancel_item(&order.id, "line-1").expect("local state must win");

        // Both mutations attempted the push and survived its failure.
        assert_eq!(*mirror.pushes.lock().expect("test mutex"), 2);
        assert_eq!(service.orders()[0].items[0].status, ItemStatus::Cancelled);
    }

    #[test]
    fn test_mirrored_orders_fall_back_to_local() {
        let (service, _) = lifecycle_with_mirror(true);
        two_item_order(&service);

        let seen = service.mirrored_orders();
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_mirrored_orders_prefer_mirror() {
        let (service, _) = lifecycle_with_mirror(false);
        two_item_order(&service);

        // The (empty) mirror answer wins when it is reachable.
        assert!(service.mirrored_orders().is_empty());
    }
}
