//! # Persisted Record Types
//!
//! The data model shared by the three logical collections: orders, the
//! returned-items ledger, and the payments ledger. Every persisted field
//! carries a serde default so that records written by older revisions (or
//! by hand) decode without error; absent fields take the documented
//! defaults.

use serde::{Deserialize, Serialize};

// ============================================================================
// PIPELINE STAGES
// ============================================================================

/// Delivery tracking stages, in order.
pub const DELIVERY_STEPS: [&str; 4] =
    ["Order Placed", "Shipped", "Out for Delivery", "Delivered"];

/// Refund tracking stages, in order.
pub const REFUND_STEPS: [&str; 4] =
    ["Return Initiated", "Received by Warehouse", "Refund Processed", "Amount Credited"];

/// Index of the absorbing final stage of either 4-stage pipeline.
pub const FINAL_STEP: u8 = 3;

// ============================================================================
// BASIC IDENTIFIERS
// ============================================================================

/// Unique order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    /// Creates an order ID from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Formats the sequential order number assigned at placement.
    #[must_use]
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("ORD-{}", sequence))
    }

    /// The numeric suffix of a sequential ID, if it has one.
    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        self.0.strip_prefix("ORD-").and_then(|s| s.parse().ok())
    }

    /// String form of the ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// STATUS ENUMS
// ============================================================================

/// Order status. `Completed` holds exactly when every item is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// At least one item is still being fulfilled.
    #[default]
    Active,
    /// Every item has been cancelled or returned.
    Completed,
}

impl OrderStatus {
    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

/// Line item status. Terminal statuses never revert to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// In the delivery pipeline.
    #[default]
    Active,
    /// Cancelled by the customer.
    Cancelled,
    /// Returned by the customer.
    Returned,
}

impl ItemStatus {
    /// Whether the item has left the delivery pipeline for good.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Returned)
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
        }
    }
}

/// Payment status. `Refunded` is terminal; there is no way back to `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Payment captured at order time.
    #[default]
    Paid,
    /// At least one item of the order was cancelled or returned.
    Refunded,
}

impl PaymentStatus {
    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Refunded => "Refunded",
        }
    }
}

// ============================================================================
// ORDERS
// ============================================================================

/// Billing snapshot captured at checkout. Opaque to the engine; the fields
/// mirror the checkout form and are stored verbatim with the order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Company name.
    #[serde(default)]
    pub company:    String,
    /// Street address.
    #[serde(default)]
    pub address:    String,
    /// Apartment, floor, etc.
    #[serde(default)]
    pub apartment:  String,
    /// Town or city.
    #[serde(default)]
    pub city:       String,
    /// Mobile number.
    #[serde(default)]
    pub phone:      String,
    /// Email address.
    #[serde(default)]
    pub email:      String,
}

/// Checkout input for one line item. The engine assigns line IDs itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    /// Product name.
    pub name:     String,
    /// Unit price in minor currency units.
    pub price:    u64,
    /// Quantity ordered, at least 1.
    pub quantity: u32,
    /// Product image reference.
    #[serde(default)]
    pub image:    String,
}

impl ItemDraft {
    /// Creates a draft line item.
    #[must_use]
    pub fn new(name: impl Into<String>, price: u64, quantity: u32) -> Self {
        Self { name: name.into(), price, quantity, image: String::new() }
    }

    /// Sets the product image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// A single product line within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Line ID, assigned at order creation.
    #[serde(default)]
    pub id:            String,
    /// Product name.
    #[serde(default)]
    pub name:          String,
    /// Unit price in minor currency units.
    #[serde(default)]
    pub price:         u64,
    /// Quantity ordered.
    #[serde(default = "default_quantity")]
    pub quantity:      u32,
    /// Product image reference.
    #[serde(default)]
    pub image:         String,
    /// Item status.
    #[serde(default)]
    pub status:        ItemStatus,
    /// Index into the delivery pipeline, capped at [`FINAL_STEP`]. Frozen
    /// once the item leaves `Active`.
    #[serde(default)]
    pub tracking_step: u8,
}

fn default_quantity() -> u32 {
    1
}

impl OrderItem {
    /// Line total in minor units.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.quantity))
    }

    /// Name of the current delivery stage.
    #[must_use]
    pub fn tracking_step_name(&self) -> &'static str {
        DELIVERY_STEPS[usize::from(self.tracking_step.min(FINAL_STEP))]
    }
}

/// A checkout transaction containing one or more line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    #[serde(default)]
    pub id:        OrderId,
    /// Line items, in display order.
    #[serde(default)]
    pub items:     Vec<OrderItem>,
    /// Billing snapshot at order time.
    #[serde(default)]
    pub customer:  CustomerInfo,
    /// Order status.
    #[serde(default)]
    pub status:    OrderStatus,
    /// Creation timestamp, unix seconds.
    #[serde(default)]
    pub placed_at: u64,
}

impl Order {
    /// Sum of `price × quantity` over all line items.
    #[must_use]
    pub fn items_total(&self) -> u64 {
        self.items.iter().fold(0u64, |acc, i| acc.saturating_add(i.line_total()))
    }

    /// Recomputes the order status from its items: `Completed` iff every
    /// item is terminal. Empty orders never exist (checkout rejects them),
    /// so the vacuous case keeps the order `Active`.
    pub fn recompute_status(&mut self) {
        self.status = if !self.items.is_empty()
            && self.items.iter().all(|i| i.status.is_terminal())
        {
            OrderStatus::Completed
        } else {
            OrderStatus::Active
        };
    }

    /// Whether any item is still in the delivery pipeline.
    #[must_use]
    pub fn has_active_items(&self) -> bool {
        self.items.iter().any(|i| i.status == ItemStatus::Active)
    }

    /// Whether any item was cancelled.
    #[must_use]
    pub fn has_cancelled_items(&self) -> bool {
        self.items.iter().any(|i| i.status == ItemStatus::Cancelled)
    }
}

// ============================================================================
// RETURNED-ITEMS LEDGER
// ============================================================================

/// Audit-ledger entry created when an item is cancelled or returned.
///
/// A decoupled copy of the line item at the moment of return: deleting the
/// entry never touches the source order or its payment, and the source
/// order advancing has no effect here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnedItem {
    /// Ledger entry provenance tag.
    #[serde(default = "default_entry_id")]
    pub entry_id:    String,
    /// Order the item belonged to (non-owning back-reference).
    #[serde(default)]
    pub order_id:    OrderId,
    /// Line ID within that order.
    #[serde(default)]
    pub item_id:     String,
    /// Product name, copied.
    #[serde(default)]
    pub name:        String,
    /// Unit price, copied.
    #[serde(default)]
    pub price:       u64,
    /// Quantity, copied.
    #[serde(default = "default_quantity")]
    pub quantity:    u32,
    /// Product image reference, copied.
    #[serde(default)]
    pub image:       String,
    /// Creation timestamp, unix seconds.
    #[serde(default)]
    pub return_date: u64,
    /// Index into the refund pipeline, capped at [`FINAL_STEP`],
    /// monotonically increasing.
    #[serde(default)]
    pub refund_step: u8,
}

fn default_entry_id() -> String {
    format!("ret-{}", uuid::Uuid::new_v4())
}

impl ReturnedItem {
    /// Creates a ledger entry from a line item at the moment of return.
    /// The refund pipeline always starts at step 0, regardless of how far
    /// delivery tracking had advanced.
    #[must_use]
    pub fn from_item(item: &OrderItem, order_id: &OrderId, return_date: u64) -> Self {
        Self {
            entry_id: default_entry_id(),
            order_id: order_id.clone(),
            item_id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
            return_date,
            refund_step: 0,
        }
    }

    /// Refund amount for this entry in minor units.
    #[must_use]
    pub fn refund_total(&self) -> u64 {
        self.price.saturating_mul(u64::from(self.quantity))
    }

    /// Name of the current refund stage.
    #[must_use]
    pub fn refund_step_name(&self) -> &'static str {
        REFUND_STEPS[usize::from(self.refund_step.min(FINAL_STEP))]
    }

    /// Whether the refund pipeline has reached the absorbing final stage.
    #[must_use]
    pub fn is_credited(&self) -> bool {
        self.refund_step >= FINAL_STEP
    }
}

// ============================================================================
// PAYMENTS
// ============================================================================

/// Payment method recorded when none was captured at checkout.
pub const UNSPECIFIED_METHOD: &str = "Not Specified";

/// The per-order financial record derived from order and return state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Sequential payment ID.
    #[serde(default)]
    pub id:          u64,
    /// Order this payment covers. At most one payment exists per order.
    #[serde(default)]
    pub order_id:    OrderId,
    /// Creation timestamp, unix seconds.
    #[serde(default)]
    pub date:        u64,
    /// Amount in minor units, fixed when the record is first created.
    /// Never recomputed, even if items are cancelled later.
    #[serde(default)]
    pub amount:      u64,
    /// Payment method.
    #[serde(default = "default_method")]
    pub method:      String,
    /// Payment status.
    #[serde(default)]
    pub status:      PaymentStatus,
    /// Furthest refund pipeline step observed for this order.
    #[serde(default)]
    pub refund_step: u8,
    /// When the payment first became `Refunded`, unix seconds.
    #[serde(default)]
    pub refund_date: Option<u64>,
}

fn default_method() -> String {
    UNSPECIFIED_METHOD.to_string()
}

impl Payment {
    /// Creates a `Paid` record for an order, amount computed once from the
    /// order's current item list.
    #[must_use]
    pub fn for_order(id: u64, order: &Order, date: u64) -> Self {
        Self {
            id,
            order_id: order.id.clone(),
            date,
            amount: order.items_total(),
            method: default_method(),
            status: PaymentStatus::Paid,
            refund_step: 0,
            refund_date: None,
        }
    }
}
