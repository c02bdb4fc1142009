//! Crochet FFI Interface Definition
//!
//! This file defines the public interface exposed to Swift and Kotlin via UniFFI.
//! It acts as the source of truth for shared types.

use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// How a product name relates to the current search query.
///
/// Variant order is rank order: `Exact` sorts first, `NoMatch` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, uniffi::Enum)]
pub enum MatchTier {
    /// Lowercased name equals the query
    Exact,
    /// Lowercased name starts with the query
    Prefix,
    /// Lowercased name contains the query somewhere after the start
    Substring,
    NoMatch,
}

/// Lifecycle state shown in order history
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum OrderStatus {
    Completed,
    Processing,
    Cancelled,
}

/// Result of a catalog load that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LoadOutcome {
    /// The fetched products replaced the reference set
    Committed { product_count: u64 },
    /// A later load already committed; this result was discarded
    Superseded,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// A catalog product. Only `name` is interpreted by search; the rest is passthrough.
#[derive(Debug, Clone, PartialEq, Eq, Default, uniffi::Record)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub url_picture: String,
    pub total_likes: u64,
    pub price_rupiah: u64,
    pub description: Option<String>,
}

/// Input from the add-product screen, validated before it reaches the backend
#[derive(Debug, Clone, PartialEq, Eq, Default, uniffi::Record)]
pub struct ProductDraft {
    pub name: String,
    pub price_rupiah: u64,
    pub description: String,
    pub url_picture: Option<String>,
}

/// One line in the cart. `id` is the product id.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: u64,
    pub quantity: u32,
    pub image_uri: String,
}

/// A placed order
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Order {
    /// `ORD001`, `ORD002`, ...
    pub id: String,
    /// Day the order was placed, e.g. `18 Oct 2026`
    pub date: String,
    pub items: Vec<CartItem>,
    pub total: u64,
    pub status: OrderStatus,
    /// Display name of the payment method
    pub payment_method: String,
}

/// Order fields supplied by the caller; id and date are assigned on insert
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct NewOrder {
    pub items: Vec<CartItem>,
    pub total: u64,
    pub status: OrderStatus,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub gender: String,
    pub profile_image: String,
}

/// Partial profile update. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, uniffi::Record)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
}

/// A payment option offered at checkout
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    /// Icon glyph name understood by the host UI
    pub icon: String,
    /// `#RRGGBB`
    pub color: String,
}

/// Amounts shown on the checkout screen, all in rupiah
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct CheckoutSummary {
    pub subtotal: u64,
    pub shipping_fee: u64,
    pub total: u64,
}

/// A ranked product together with the tier it landed in
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct RankedProduct {
    pub product: Product,
    pub tier: MatchTier,
}

/// Error type for storefront operations
#[derive(Debug, Clone, PartialEq, Eq, Error, uniffi::Error)]
pub enum CrochetError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Callback error: {0}")]
    Callback(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for CrochetError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        CrochetError::Callback(e.reason)
    }
}

impl From<crate::backend::BackendError> for CrochetError {
    fn from(e: crate::backend::BackendError) -> Self {
        use crate::backend::BackendError;
        match e {
            BackendError::Config(inner) => CrochetError::from(inner),
            BackendError::Decode(_) | BackendError::Json(_) => CrochetError::Parse(e.to_string()),
            BackendError::InvalidKey(_) | BackendError::Url(_) => {
                CrochetError::InvalidInput(e.to_string())
            }
            BackendError::Http(_) | BackendError::Status { .. } => {
                CrochetError::Transport(e.to_string())
            }
        }
    }
}

impl From<crate::config::ConfigError> for CrochetError {
    fn from(e: crate::config::ConfigError) -> Self {
        CrochetError::InvalidInput(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPOSITORY INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// Remote product repository. Implemented in Rust by `RealtimeDbSource`,
/// or by the host app for any other backend.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the whole catalog in source order. Must not modify server state.
    async fn fetch_all(&self) -> Result<Vec<Product>, CrochetError>;

    /// Store a product. An empty `id` asks the backend to assign one.
    async fn save(&self, product: Product) -> Result<(), CrochetError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// OBSERVERS
// ═══════════════════════════════════════════════════════════════════════════════
//
// Called synchronously on the thread that made the change, after the new value
// is visible through the corresponding getter.

#[uniffi::export(with_foreign)]
pub trait DisplayObserver: Send + Sync {
    fn display_changed(&self, products: Vec<Product>);
}

#[uniffi::export(with_foreign)]
pub trait CartObserver: Send + Sync {
    fn cart_changed(&self, items: Vec<CartItem>);
}

#[uniffi::export(with_foreign)]
pub trait OrdersObserver: Send + Sync {
    fn orders_changed(&self, orders: Vec<Order>);
}

#[uniffi::export(with_foreign)]
pub trait ProfileObserver: Send + Sync {
    fn profile_changed(&self, profile: UserProfile);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// The primary interface for the storefront core.
/// This matches the functionality exposed by the `Storefront` object.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait StorefrontApi: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────────
    // Catalog & Search
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fetch the catalog and commit it unless a newer load already committed.
    /// On failure the previous catalog stays in place.
    async fn load_catalog(&self) -> Result<LoadOutcome, CrochetError>;

    /// The full catalog in source order
    fn catalog(&self) -> Vec<Product>;

    /// Store the query typed into the search bar and return the re-ranked catalog
    fn set_query(&self, query: String) -> Vec<Product>;

    /// Current query as last set
    fn query(&self) -> String;

    /// Catalog ranked against the current query
    fn display_sequence(&self) -> Vec<Product>;

    /// Validate a draft and save it through the product source
    async fn add_product(&self, draft: ProductDraft) -> Result<(), CrochetError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Cart
    // ─────────────────────────────────────────────────────────────────────────────

    fn add_to_cart(&self, product: Product, quantity: u32) -> Result<(), CrochetError>;

    /// Returns false if the product was not in the cart
    fn remove_from_cart(&self, product_id: String) -> bool;

    /// Zero removes the line
    fn set_cart_quantity(&self, product_id: String, quantity: u32) -> Result<(), CrochetError>;

    fn clear_cart(&self);

    fn cart_items(&self) -> Vec<CartItem>;

    /// Sum of price * quantity
    fn cart_total(&self) -> u64;

    /// Sum of quantities (cart badge)
    fn cart_item_count(&self) -> u64;

    // ─────────────────────────────────────────────────────────────────────────────
    // Checkout & Orders
    // ─────────────────────────────────────────────────────────────────────────────

    fn payment_methods(&self) -> Vec<PaymentMethod>;

    fn checkout_summary(&self) -> CheckoutSummary;

    /// Turn the cart into a completed order and empty the cart
    fn place_order(&self, payment_method_id: String) -> Result<Order, CrochetError>;

    /// Newest first
    fn orders(&self) -> Vec<Order>;

    fn order_by_id(&self, order_id: String) -> Option<Order>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────────

    fn profile(&self) -> UserProfile;

    fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, CrochetError>;

    /// Check the change-password form. The change itself happens in the auth backend.
    fn validate_password_change(
        &self,
        current_password: String,
        new_password: String,
        confirm_password: String,
    ) -> Result<(), CrochetError>;
}
