//! Storefront - Main API for Swift/Kotlin interop
//!
//! Owns the catalog, the search session and the client-side stores (cart,
//! orders, profile) and wires them together. Each piece is an explicit state
//! holder passed by handle; nothing here is a global.
//!
//! Async Cancellation Architecture:
//! When the host cancels an async task, UniFFI drops the Rust Future. A DropGuard
//! inside the future triggers a CancellationToken, and the spawned backend work
//! selects on that token so it stops instead of running to completion unobserved.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::RealtimeDbSource;
use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::checkout;
use crate::config::BackendConfig;
use crate::interface::{
    CartItem, CartObserver, CheckoutSummary, CrochetError, DisplayObserver, LoadOutcome, Order,
    OrdersObserver, PaymentMethod, Product, ProductDraft, ProductSource, ProfileObserver,
    ProfileUpdate, RankedProduct, StorefrontApi, UserProfile,
};
use crate::observable::SubscriptionId;
use crate::orders::OrderBook;
use crate::profile::{self, ProfileState};
use crate::search::SearchSession;

/// Global fallback Tokio runtime for when async functions are called outside any runtime context.
/// This is shared across all Storefront instances and never dropped.
/// Used by UniFFI which doesn't provide a tokio runtime.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("crochet-rt")
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Get a tokio runtime handle - uses current runtime if available, otherwise global fallback
pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

/// RAII guard that cancels a token when dropped.
/// When the host cancels an async Task, UniFFI drops the Future, which drops this guard,
/// which triggers the cancellation token.
pub(crate) struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Thread-safe storefront core
///
/// Concurrency Model:
/// - State holders use parking_lot locks held only for a read or a swap
/// - Observers are called synchronously, after the new value is readable
/// - Backend work is spawned on the caller's runtime, or FALLBACK_RUNTIME from UniFFI
#[derive(uniffi::Object)]
pub struct Storefront {
    catalog: Arc<Catalog>,
    search: Arc<SearchSession>,
    cart: Arc<Cart>,
    orders: Arc<OrderBook>,
    profile: Arc<ProfileState>,
}

// Internal implementation (not exported via FFI)
impl Storefront {
    pub fn from_parts(
        catalog: Arc<Catalog>,
        cart: Arc<Cart>,
        orders: Arc<OrderBook>,
        profile: Arc<ProfileState>,
    ) -> Self {
        let search = SearchSession::new(Arc::clone(&catalog));
        Self {
            catalog,
            search,
            cart,
            orders,
            profile,
        }
    }

    pub fn catalog_handle(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn search_session(&self) -> &Arc<SearchSession> {
        &self.search
    }

    pub fn cart_handle(&self) -> &Arc<Cart> {
        &self.cart
    }

    pub fn orders_handle(&self) -> &Arc<OrderBook> {
        &self.orders
    }

    pub fn profile_handle(&self) -> &Arc<ProfileState> {
        &self.profile
    }
}

// FFI-exported constructors (must be in standalone impl block)
#[uniffi::export]
impl Storefront {
    /// Create a storefront over a host-provided product source
    #[uniffi::constructor]
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self::from_parts(
            Arc::new(Catalog::new(source)),
            Arc::new(Cart::new()),
            Arc::new(OrderBook::new()),
            Arc::new(ProfileState::default()),
        )
    }

    /// Create a storefront backed by the Realtime Database REST API
    #[uniffi::constructor]
    pub fn with_realtime_database(config: BackendConfig) -> Result<Self, CrochetError> {
        let source = RealtimeDbSource::new(config)?;
        info!(path = %source.config().products_path, "using realtime database product source");
        Ok(Self::new(Arc::new(source)))
    }
}

// Observers and search extras (not on trait, to keep the foreign interface small)
#[uniffi::export]
impl Storefront {
    /// Catalog ranked against the current query, with each product's match tier
    pub fn ranked_products(&self) -> Vec<RankedProduct> {
        self.search.ranked_with_tiers()
    }

    pub fn subscribe_display(&self, observer: Arc<dyn DisplayObserver>) -> SubscriptionId {
        self.search
            .subscribe(move |products| observer.display_changed(products.clone()))
    }

    pub fn subscribe_cart(&self, observer: Arc<dyn CartObserver>) -> SubscriptionId {
        self.cart
            .subscribe(move |items| observer.cart_changed(items.clone()))
    }

    pub fn subscribe_orders(&self, observer: Arc<dyn OrdersObserver>) -> SubscriptionId {
        self.orders
            .subscribe(move |orders| observer.orders_changed(orders.clone()))
    }

    pub fn subscribe_profile(&self, observer: Arc<dyn ProfileObserver>) -> SubscriptionId {
        self.profile
            .subscribe(move |profile| observer.profile_changed(profile.clone()))
    }

    /// Remove a subscription made through any `subscribe_*`. Returns false if unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.search.unsubscribe(id)
            || self.cart.unsubscribe(id)
            || self.orders.unsubscribe(id)
            || self.profile.unsubscribe(id)
    }
}

#[uniffi::export]
#[async_trait::async_trait]
impl StorefrontApi for Storefront {
    // ─────────────────────────────────────────────────────────────────────────────
    // Catalog & Search
    // ─────────────────────────────────────────────────────────────────────────────

    async fn load_catalog(&self) -> Result<LoadOutcome, CrochetError> {
        self.catalog.load().await
    }

    fn catalog(&self) -> Vec<Product> {
        self.catalog.products().as_ref().clone()
    }

    fn set_query(&self, query: String) -> Vec<Product> {
        self.search.set_query(query)
    }

    fn query(&self) -> String {
        self.search.query()
    }

    fn display_sequence(&self) -> Vec<Product> {
        self.search.display_sequence()
    }

    /// Validate the draft, then save it through the product source.
    /// The catalog is not reloaded; the caller decides when to refresh.
    async fn add_product(&self, draft: ProductDraft) -> Result<(), CrochetError> {
        let product = draft.into_product()?;

        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());
        let source = Arc::clone(self.catalog.source());
        let name = product.name.clone();

        let handle = runtime_handle().spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(CrochetError::Cancelled),
                saved = source.save(product) => saved,
            }
        });

        match handle.await {
            Ok(Ok(())) => {
                info!(%name, "product saved");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(%name, error = %e, "saving product failed");
                Err(e)
            }
            Err(_join_error) => Err(CrochetError::Cancelled),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Cart
    // ─────────────────────────────────────────────────────────────────────────────

    fn add_to_cart(&self, product: Product, quantity: u32) -> Result<(), CrochetError> {
        self.cart.add(&product, quantity)
    }

    fn remove_from_cart(&self, product_id: String) -> bool {
        self.cart.remove(&product_id)
    }

    fn set_cart_quantity(&self, product_id: String, quantity: u32) -> Result<(), CrochetError> {
        self.cart.set_quantity(&product_id, quantity)
    }

    fn clear_cart(&self) {
        self.cart.clear()
    }

    fn cart_items(&self) -> Vec<CartItem> {
        self.cart.items()
    }

    fn cart_total(&self) -> u64 {
        self.cart.total()
    }

    fn cart_item_count(&self) -> u64 {
        self.cart.item_count()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Checkout & Orders
    // ─────────────────────────────────────────────────────────────────────────────

    fn payment_methods(&self) -> Vec<PaymentMethod> {
        checkout::payment_methods()
    }

    fn checkout_summary(&self) -> CheckoutSummary {
        checkout::summary(&self.cart)
    }

    fn place_order(&self, payment_method_id: String) -> Result<Order, CrochetError> {
        checkout::place_order(&self.cart, &self.orders, &payment_method_id)
    }

    fn orders(&self) -> Vec<Order> {
        self.orders.orders()
    }

    fn order_by_id(&self, order_id: String) -> Option<Order> {
        self.orders.get(&order_id)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────────

    fn profile(&self) -> UserProfile {
        self.profile.profile()
    }

    fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, CrochetError> {
        self.profile.update(update)
    }

    fn validate_password_change(
        &self,
        current_password: String,
        new_password: String,
        confirm_password: String,
    ) -> Result<(), CrochetError> {
        profile::validate_password_change(&current_password, &new_password, &confirm_password)
    }
}
