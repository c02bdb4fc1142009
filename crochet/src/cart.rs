//! Shopping cart state

use crate::interface::{CartItem, CrochetError, Product};
use crate::observable::{Observable, SubscriptionId};

/// Cart lines in the order they were first added
#[derive(Default)]
pub struct Cart {
    items: Observable<Vec<CartItem>>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product, merging with an existing line for the same id
    pub fn add(&self, product: &Product, quantity: u32) -> Result<(), CrochetError> {
        if quantity == 0 {
            return Err(CrochetError::InvalidInput("quantity must be at least 1".into()));
        }
        self.items.update(|items| {
            match items.iter_mut().find(|item| item.id == product.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(quantity);
                }
                None => items.push(CartItem {
                    id: product.id.clone(),
                    name: product.name.clone(),
                    price: product.price_rupiah,
                    quantity,
                    image_uri: product.url_picture.clone(),
                }),
            }
        });
        Ok(())
    }

    pub fn remove(&self, product_id: &str) -> bool {
        self.items
            .try_update(|items| {
                let before = items.len();
                items.retain(|item| item.id != product_id);
                if items.len() == before {
                    Err(())
                } else {
                    Ok(())
                }
            })
            .is_ok()
    }

    /// Zero removes the line
    pub fn set_quantity(&self, product_id: &str, quantity: u32) -> Result<(), CrochetError> {
        if quantity == 0 {
            return if self.remove(product_id) {
                Ok(())
            } else {
                Err(CrochetError::NotFound(format!("cart item {}", product_id)))
            };
        }
        self.items.try_update(|items| {
            let item = items
                .iter_mut()
                .find(|item| item.id == product_id)
                .ok_or_else(|| CrochetError::NotFound(format!("cart item {}", product_id)))?;
            item.quantity = quantity;
            Ok(())
        })
    }

    /// Empty the cart and hand back its lines in one step.
    /// An empty cart is an error and stays untouched.
    pub fn take(&self) -> Result<Vec<CartItem>, CrochetError> {
        self.items.try_update(|items| {
            if items.is_empty() {
                Err(CrochetError::InvalidInput("cart is empty".into()))
            } else {
                Ok(std::mem::take(items))
            }
        })
    }

    pub fn clear(&self) {
        self.items.set(Vec::new());
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.items.get()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read(|items| items.is_empty())
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.read(|items| items.iter().any(|item| item.id == product_id))
    }

    /// Sum of price * quantity, in rupiah
    pub fn total(&self) -> u64 {
        self.items.read(|items| line_total(items))
    }

    /// Sum of quantities, shown on the cart badge
    pub fn item_count(&self) -> u64 {
        self.items.read(|items| items.iter().map(|item| item.quantity as u64).sum())
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Vec<CartItem>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.items.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.items.unsubscribe(id)
    }
}

pub(crate) fn line_total(items: &[CartItem]) -> u64 {
    items.iter().fold(0u64, |acc, item| {
        acc.saturating_add(item.price.saturating_mul(item.quantity as u64))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: u64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            url_picture: format!("https://img.example/{}.jpg", id),
            price_rupiah: price,
            ..Default::default()
        }
    }

    #[test]
    fn test_add_merges_same_product() {
        let cart = Cart::new();
        cart.add(&product("a", 50_000), 1).unwrap();
        cart.add(&product("b", 20_000), 2).unwrap();
        cart.add(&product("a", 50_000), 2).unwrap();

        let items = cart.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].image_uri, "https://img.example/a.jpg");
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total(), 3 * 50_000 + 2 * 20_000);
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let cart = Cart::new();
        assert!(matches!(
            cart.add(&product("a", 1), 0),
            Err(CrochetError::InvalidInput(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity() {
        let cart = Cart::new();
        cart.add(&product("a", 10_000), 1).unwrap();
        cart.set_quantity("a", 4).unwrap();
        assert_eq!(cart.total(), 40_000);

        cart.set_quantity("a", 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.set_quantity("missing", 2),
            Err(CrochetError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_and_clear() {
        let cart = Cart::new();
        cart.add(&product("a", 1), 1).unwrap();
        cart.add(&product("b", 1), 1).unwrap();

        assert!(cart.remove("a"));
        assert!(!cart.remove("a"));
        assert_eq!(cart.items().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn test_total_saturates() {
        let cart = Cart::new();
        cart.add(&product("a", u64::MAX), 2).unwrap();
        assert_eq!(cart.total(), u64::MAX);
    }

    #[test]
    fn test_changes_notify_subscribers() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let cart = Cart::new();
        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts_clone = Arc::clone(&counts);
        cart.subscribe(move |items| counts_clone.lock().push(items.len()));

        cart.add(&product("a", 1), 1).unwrap();
        cart.add(&product("b", 1), 1).unwrap();
        cart.remove("a");
        cart.clear();

        assert_eq!(*counts.lock(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_take_empties_and_returns_lines() {
        let cart = Cart::new();
        assert!(matches!(cart.take(), Err(CrochetError::InvalidInput(_))));

        cart.add(&product("a", 1), 2).unwrap();
        let taken = cart.take().unwrap();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].quantity, 2);
        assert!(cart.is_empty());
    }
}
