//! Crochet Core - Rust business logic for the crochet storefront app
//!
//! Catalog loading, "rank, don't filter" product search, and the client-side
//! stores behind the cart, checkout, order history and profile screens.
//!
//! Types are exported via UniFFI proc-macros (#[derive(uniffi::Record/Enum)]).

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod interface;
pub mod logging;
pub mod models;
pub mod observable;
pub mod orders;
pub mod profile;
pub mod ranking;
pub mod search;
mod store;

pub use config::BackendConfig;
pub use interface::*;
pub use models::format_price;
pub use store::Storefront;

/// Parse the backend config JSON handed over by the host app
#[uniffi::export]
pub fn parse_backend_config(json: String) -> Result<BackendConfig, CrochetError> {
    Ok(BackendConfig::from_json(&json)?)
}

/// Rank an arbitrary product list against a query, without a storefront
#[uniffi::export]
pub fn rank_products(products: Vec<Product>, query: String) -> Vec<Product> {
    search::rank(&products, &query)
}

uniffi::setup_scaffolding!("crochet");
