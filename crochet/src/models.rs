//! Core data models for the storefront
//!
//! Types with uniffi derives live in `interface`. This module holds the wire
//! representation of products in the backend and the conversions around it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::interface::{CrochetError, Product, ProductDraft};
use crate::profile::is_http_url;

// ─────────────────────────────────────────────────────────────────────────────
// REMOTE RECORD (backend JSON, not exposed via FFI)
// ─────────────────────────────────────────────────────────────────────────────

/// A product record as stored in the backend.
///
/// Decoding is lenient: older records written by the add-product screen use
/// `productName`/`productPrice`, prices may arrive as strings, and any field
/// may be missing or hold the wrong type. A bad field decodes as absent, never
/// failing the record, and a missing name decodes as `""` so ranking stays total.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RemoteProduct {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "productName", deserialize_with = "lenient_string")]
    pub legacy_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub url_picture: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub total_likes: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub price_rupiah: Option<u64>,
    #[serde(rename = "productPrice", deserialize_with = "lenient_u64")]
    pub legacy_price: Option<u64>,
    #[serde(deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

impl RemoteProduct {
    /// Convert to a `Product`, using `key` (the backend's child key) when the
    /// record carries no id of its own. Current field names win over legacy ones.
    pub fn into_product(self, key: &str) -> Product {
        Product {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| key.to_string()),
            name: self.name.or(self.legacy_name).unwrap_or_default(),
            url_picture: self.url_picture.unwrap_or_default(),
            total_likes: self.total_likes.unwrap_or(0),
            price_rupiah: self.price_rupiah.or(self.legacy_price).unwrap_or(0),
            description: self.description,
        }
    }
}

/// Body written when saving a product. The id is the record's key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteProductBody<'a> {
    pub name: &'a str,
    pub url_picture: &'a str,
    pub total_likes: u64,
    pub price_rupiah: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

impl<'a> From<&'a Product> for RemoteProductBody<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            name: &product.name,
            url_picture: &product.url_picture,
            total_likes: product.total_likes,
            price_rupiah: product.price_rupiah,
            description: product.description.as_deref(),
        }
    }
}

/// Accept a string; anything else is treated as absent
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Accept a non-negative number, a numeric string, or null
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// PRODUCT DRAFT
// ─────────────────────────────────────────────────────────────────────────────

impl ProductDraft {
    /// Name and description are required; a picture, if given, must be an http(s) URL
    pub fn validate(&self) -> Result<(), CrochetError> {
        if self.name.trim().is_empty() {
            return Err(CrochetError::InvalidInput("product name is required".into()));
        }
        if self.description.trim().is_empty() {
            return Err(CrochetError::InvalidInput("product description is required".into()));
        }
        if let Some(url) = self.url_picture.as_deref().filter(|u| !u.trim().is_empty()) {
            if !is_http_url(url) {
                return Err(CrochetError::InvalidInput(format!("invalid picture url: {}", url)));
            }
        }
        Ok(())
    }

    /// Validate and build a new product. The id is left empty for the backend to assign.
    pub fn into_product(self) -> Result<Product, CrochetError> {
        self.validate()?;
        Ok(Product {
            id: String::new(),
            name: self.name.trim().to_string(),
            url_picture: self
                .url_picture
                .map(|u| u.trim().to_string())
                .unwrap_or_default(),
            total_likes: 0,
            price_rupiah: self.price_rupiah,
            description: Some(self.description.trim().to_string()),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DISPLAY
// ─────────────────────────────────────────────────────────────────────────────

/// Rupiah with id-ID digit grouping: `Rp 150.000`
#[uniffi::export]
pub fn format_price(rupiah: u64) -> String {
    let digits = rupiah.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("Rp {}", grouped)
}
