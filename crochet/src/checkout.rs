//! Checkout: payment options, totals, and turning the cart into an order

use tracing::info;

use crate::cart::{line_total, Cart};
use crate::interface::{CheckoutSummary, CrochetError, NewOrder, Order, OrderStatus, PaymentMethod};
use crate::orders::OrderBook;

/// Flat shipping fee added to every order
pub const SHIPPING_FEE_RUPIAH: u64 = 15_000;

/// (id, display name, icon, brand color)
const PAYMENT_METHODS: &[(&str, &str, &str, &str)] = &[
    ("dana", "DANA", "wallet", "#118EEA"),
    ("bank_transfer", "Bank Transfer", "bank", "#1E88E5"),
    ("gopay", "GoPay", "wallet-outline", "#00AA13"),
    ("ovo", "OVO", "credit-card", "#4C2A86"),
    ("shopeepay", "ShopeePay", "wallet-outline", "#EE4D2D"),
];

pub fn payment_methods() -> Vec<PaymentMethod> {
    PAYMENT_METHODS
        .iter()
        .map(|(id, name, icon, color)| PaymentMethod {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
        })
        .collect()
}

/// Display name for a payment method id; unknown ids are shown as-is
pub fn payment_method_name(id: &str) -> String {
    PAYMENT_METHODS
        .iter()
        .find(|(method_id, ..)| *method_id == id)
        .map(|(_, name, ..)| name.to_string())
        .unwrap_or_else(|| id.to_string())
}

pub fn summary(cart: &Cart) -> CheckoutSummary {
    summarize(cart.total())
}

fn summarize(subtotal: u64) -> CheckoutSummary {
    CheckoutSummary {
        subtotal,
        shipping_fee: SHIPPING_FEE_RUPIAH,
        total: subtotal.saturating_add(SHIPPING_FEE_RUPIAH),
    }
}

/// Empty the cart and record its lines as a completed order.
pub fn place_order(
    cart: &Cart,
    orders: &OrderBook,
    payment_method_id: &str,
) -> Result<Order, CrochetError> {
    let payment_method_id = payment_method_id.trim();
    if payment_method_id.is_empty() {
        return Err(CrochetError::InvalidInput("payment method required".into()));
    }

    // Lines added after this point stay in the cart for the next order
    let items = cart.take()?;

    let totals = summarize(line_total(&items));
    let order = orders.add_order(NewOrder {
        items,
        total: totals.total,
        status: OrderStatus::Completed,
        payment_method: payment_method_name(payment_method_id),
    });

    info!(order_id = %order.id, total = order.total, "order placed");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::Product;

    fn cart_with(price: u64, quantity: u32) -> Cart {
        let cart = Cart::new();
        let product = Product {
            id: "amigurumi".to_string(),
            name: "Amigurumi Bunny".to_string(),
            price_rupiah: price,
            ..Default::default()
        };
        cart.add(&product, quantity).unwrap();
        cart
    }

    #[test]
    fn test_payment_methods_list() {
        let ids: Vec<String> = payment_methods().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["dana", "bank_transfer", "gopay", "ovo", "shopeepay"]);
    }

    #[test]
    fn test_payment_method_name_fallback() {
        assert_eq!(payment_method_name("ovo"), "OVO");
        assert_eq!(payment_method_name("cash"), "cash");
    }

    #[test]
    fn test_summary_adds_shipping() {
        let cart = cart_with(45_000, 2);
        let s = summary(&cart);
        assert_eq!(s.subtotal, 90_000);
        assert_eq!(s.shipping_fee, 15_000);
        assert_eq!(s.total, 105_000);
    }

    #[test]
    fn test_place_order_records_and_clears() {
        let cart = cart_with(45_000, 2);
        let orders = OrderBook::new();

        let order = place_order(&cart, &orders, "gopay").unwrap();

        assert_eq!(order.id, "ORD001");
        assert_eq!(order.total, 105_000);
        assert_eq!(order.payment_method, "GoPay");
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.item_count(), 2);
        assert!(cart.is_empty());
        assert_eq!(orders.len(), 1);
    }

    #[test]
    fn test_place_order_requires_payment_method() {
        let cart = cart_with(45_000, 1);
        let orders = OrderBook::new();

        let err = place_order(&cart, &orders, "  ").unwrap_err();
        assert_eq!(err, CrochetError::InvalidInput("payment method required".into()));
        assert!(!cart.is_empty());
        assert!(orders.is_empty());
    }

    #[test]
    fn test_place_order_requires_items() {
        let cart = Cart::new();
        let orders = OrderBook::new();

        let err = place_order(&cart, &orders, "dana").unwrap_err();
        assert_eq!(err, CrochetError::InvalidInput("cart is empty".into()));
        assert!(orders.is_empty());
    }

    #[test]
    fn test_item_added_while_ordering_stays_in_cart() {
        use std::sync::Arc;

        let cart = Arc::new(cart_with(45_000, 1));
        let orders = OrderBook::new();
        let late = Product {
            id: "late".to_string(),
            name: "Late Scarf".to_string(),
            price_rupiah: 60_000,
            ..Default::default()
        };
        let cart_clone = Arc::clone(&cart);
        orders.subscribe(move |_| {
            cart_clone.add(&late, 1).unwrap();
        });

        let order = place_order(&cart, &orders, "dana").unwrap();

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].id, "amigurumi");
        let left: Vec<String> = cart.items().into_iter().map(|item| item.id).collect();
        assert_eq!(left, vec!["late"]);
    }
}
