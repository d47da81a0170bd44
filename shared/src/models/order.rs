//! Web Order Model
//!
//! Orders placed through the storefront. The `status` field only moves
//! through the lifecycle state machine owned by the server; these types
//! carry no transition logic themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Web order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Shipped,
    ReadyForPickup,
    Delivered,
    PickedUp,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PickedUp | Self::Cancelled)
    }

    /// Wire representation (matches the serde rename)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Shipped => "shipped",
            Self::ReadyForPickup => "ready_for_pickup",
            Self::Delivered => "delivered",
            Self::PickedUp => "picked_up",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "shipped" => Ok(Self::Shipped),
            "ready_for_pickup" => Ok(Self::ReadyForPickup),
            "delivered" => Ok(Self::Delivered),
            "picked_up" => Ok(Self::PickedUp),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

/// How the customer receives the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    #[default]
    Delivery,
    Pickup,
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery => f.write_str("delivery"),
            Self::Pickup => f.write_str("pickup"),
        }
    }
}

/// Order line item
///
/// `product_name` and `unit_price` are snapshots taken at order creation,
/// so historic receipts stay stable when the catalog record changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Catalog product reference
    pub product_id: String,
    /// Product name snapshot
    pub product_name: String,
    /// Quantity (> 0)
    pub quantity: u32,
    /// Unit price snapshot (>= 0)
    pub unit_price: f64,
    /// Line subtotal (= quantity * unit_price, validated at creation)
    pub subtotal: f64,
}

/// Web order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (uuid, assigned by server)
    pub id: String,
    /// Human-readable unique order number
    pub order_number: String,
    /// Customer name
    pub customer_name: String,
    /// Customer email (notification target)
    pub customer_email: String,
    /// Customer phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Delivery or pickup
    pub shipping_method: ShippingMethod,
    /// Shipping address (delivery orders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    /// District / city (delivery orders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_district: Option<String>,
    /// Selected site / location reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    /// Payment method chosen at checkout
    pub payment_method: String,
    /// Whether the payment method requires an uploaded proof
    #[serde(default)]
    pub requires_payment_proof: bool,
    /// Uploaded payment proof, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_proof_url: Option<String>,
    /// Line items
    pub items: Vec<OrderItem>,
    /// Sum of line subtotals (>= 0)
    pub subtotal: f64,
    /// Shipping cost (>= 0)
    pub shipping_cost: f64,
    /// Total (= subtotal + shipping_cost)
    pub total: f64,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Carrier tracking URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    /// Estimated delivery / pickup readiness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    /// Creation timestamp (immutable)
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Touch the mutation timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Pickup feedback, recorded once on the `picked_up` transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderFeedback {
    /// Order this feedback belongs to
    pub order_id: String,
    /// Rating in [1, 5]
    pub rating: u8,
    /// Free-form comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Would the customer recommend the store
    pub recommend: bool,
    /// Recording timestamp
    pub created_at: DateTime<Utc>,
}
