//! Order history

use chrono::{DateTime, Local, TimeZone};

use crate::interface::{NewOrder, Order};
use crate::observable::{Observable, SubscriptionId};

/// Orders placed this session, newest first
#[derive(Default)]
pub struct OrderBook {
    orders: Observable<Vec<Order>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an order dated today
    pub fn add_order(&self, new_order: NewOrder) -> Order {
        self.add_order_at(new_order, Local::now())
    }

    /// Record an order with an explicit placement time
    pub fn add_order_at<Tz: TimeZone>(&self, new_order: NewOrder, placed_at: DateTime<Tz>) -> Order
    where
        Tz::Offset: std::fmt::Display,
    {
        let date = format_order_date(&placed_at);
        self.orders.update(|orders| {
            let order = Order {
                id: order_id(orders.len() + 1),
                date,
                items: new_order.items,
                total: new_order.total,
                status: new_order.status,
                payment_method: new_order.payment_method,
            };
            orders.insert(0, order.clone());
            order
        })
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.orders
            .read(|orders| orders.iter().find(|order| order.id == order_id).cloned())
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.get()
    }

    pub fn len(&self) -> usize {
        self.orders.read(|orders| orders.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Vec<Order>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.orders.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.orders.unsubscribe(id)
    }
}

impl Order {
    /// Number of pieces across all lines
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| item.quantity as u64).sum()
    }
}

/// `ORD001`, `ORD002`, ... (wider once past 999)
fn order_id(sequence: usize) -> String {
    format!("ORD{:03}", sequence)
}

/// en-GB short date: `5 Mar 2026`
fn format_order_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-d %b %Y").to_string()
}
