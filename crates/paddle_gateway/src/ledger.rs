// --- File: crates/paddle_gateway/src/ledger.rs ---
//! Order ledger abstraction.
//!
//! The gateway never owns orders; it reads them to build a pay-link and marks
//! them paid once a webhook verifies. This trait is the seam to whatever
//! actually stores orders, and allows for dependency injection and easier
//! testing by decoupling the gateway logic from a concrete store.

use std::collections::HashMap;
use std::sync::Mutex;

/// One purchasable line of an order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_id: u64,
    pub name: String,
}

/// Read-only snapshot of an order as the gateway needs it.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: u64,
    pub total: f64,
    pub tax: f64,
    pub billing_email: String,
    pub billing_country: String,
    pub billing_postcode: String,
    pub line_items: Vec<LineItem>,
}

/// A trait for order ledger operations.
pub trait OrderLedger: Send + Sync {
    /// Get a snapshot of the given order, if it exists.
    fn order(&self, order_id: u64) -> Option<Order>;

    /// Mark the order paid. Must be idempotent: marking an already-paid order
    /// succeeds again. Returns false only when the order does not exist.
    fn mark_paid(&self, order_id: u64) -> bool;
}

/// In-memory ledger used by the backend binary and the tests.
///
/// A panic while holding the lock poisons it and every later call panics
/// too, failing the request instead of serving a half-updated ledger.
#[derive(Default)]
pub struct InMemoryOrderLedger {
    orders: Mutex<HashMap<u64, (Order, bool)>>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order: Order) {
        self.orders
            .lock()
            .unwrap()
            .insert(order.id, (order, false));
    }

    pub fn is_paid(&self, order_id: u64) -> bool {
        self.orders
            .lock()
            .unwrap()
            .get(&order_id)
            .map(|(_, paid)| *paid)
            .unwrap_or(false)
    }
}

impl OrderLedger for InMemoryOrderLedger {
    fn order(&self, order_id: u64) -> Option<Order> {
        self.orders
            .lock()
            .unwrap()
            .get(&order_id)
            .map(|(order, _)| order.clone())
    }

    fn mark_paid(&self, order_id: u64) -> bool {
        match self.orders.lock().unwrap().get_mut(&order_id) {
            Some((_, paid)) => {
                *paid = true;
                true
            }
            None => false,
        }
    }
}
