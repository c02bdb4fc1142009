//! Realtime Database REST backend
//!
//! `ProductSource` over the Firebase Realtime Database REST API: products live
//! under one collection path, each child keyed by a push id. Push ids sort
//! chronologically, so key order is creation order, which is also the order
//! the database returns children in.

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{BackendConfig, ConfigError};
use crate::interface::{CrochetError, Product, ProductSource};
use crate::models::{RemoteProduct, RemoteProductBody};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {status}")]
    Status { status: u16 },
    #[error("Invalid response JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected response shape: {0}")]
    Decode(String),
    #[error("Invalid product key: {0:?}")]
    InvalidKey(String),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Characters the database does not allow in keys
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '$', '#', '[', ']', '/'];

/// Response to a push (POST): the generated key
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

pub struct RealtimeDbSource {
    client: reqwest::Client,
    config: BackendConfig,
}

impl RealtimeDbSource {
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("crochet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// `{root}/{products_path}.json` or `{root}/{products_path}/{key}.json`
    fn endpoint(&self, key: Option<&str>) -> BackendResult<Url> {
        let base = self.config.base_url()?;
        let collection = self.config.products_path.trim_matches('/');
        let relative = match key {
            Some(key) => format!("{}/{}.json", collection, key),
            None => format!("{}.json", collection),
        };
        let mut url = base.join(&relative)?;
        if let Some(token) = self.config.auth_token.as_deref().filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    /// GET the whole collection
    pub async fn fetch_products(&self) -> BackendResult<Vec<Product>> {
        let url = self.endpoint(None)?;
        // Log the path only: the query may carry the auth token
        debug!(path = url.path(), "fetching products");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let products = decode_catalog(&body)?;
        debug!(count = products.len(), "fetched products");
        Ok(products)
    }

    /// Create (empty id) or overwrite a product.
    /// Returns the generated key when the product was created.
    pub async fn save_product(&self, product: &Product) -> BackendResult<Option<String>> {
        let body = RemoteProductBody::from(product);

        if product.id.is_empty() {
            let url = self.endpoint(None)?;
            debug!(path = url.path(), "pushing new product");
            let response = self.client.post(url).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::Status {
                    status: status.as_u16(),
                });
            }
            let pushed: PushResponse = serde_json::from_str(&response.text().await?)?;
            info!(key = %pushed.name, "product created");
            return Ok(Some(pushed.name));
        }

        validate_key(&product.id)?;
        let url = self.endpoint(Some(&product.id))?;
        debug!(path = url.path(), "writing product");
        let response = self.client.put(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }
        info!(key = %product.id, "product updated");
        Ok(None)
    }
}

#[async_trait::async_trait]
impl ProductSource for RealtimeDbSource {
    async fn fetch_all(&self) -> Result<Vec<Product>, CrochetError> {
        Ok(self.fetch_products().await?)
    }

    async fn save(&self, product: Product) -> Result<(), CrochetError> {
        self.save_product(&product).await?;
        Ok(())
    }
}

fn validate_key(key: &str) -> BackendResult<()> {
    if key.trim().is_empty() || key.contains(FORBIDDEN_KEY_CHARS) {
        return Err(BackendError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Decode a collection response body.
///
/// - `null`: the collection does not exist yet, empty catalog
/// - object: children in the database's key order: integer-like keys first,
///   numerically, then the rest as strings (push ids sort by creation time)
/// - array: the database's rendering of integer keys; `null` holes are skipped
///
/// Children that are not objects are skipped with a warning. Object children
/// always decode; bad fields inside them are treated as absent.
pub fn decode_catalog(body: &str) -> BackendResult<Vec<Product>> {
    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            Ok(entries
                .into_iter()
                .filter_map(|(key, value)| decode_entry(&key, value))
                .collect())
        }
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| decode_entry(&index.to_string(), value))
            .collect()),
        other => Err(BackendError::Decode(format!(
            "expected an object or array of products, got {}",
            json_kind(&other)
        ))),
    }
}

/// Realtime Database child order: 32-bit integer keys ascending, then strings
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Canonical decimal integers only: `"7"`, `"-3"`, not `"07"` or `"+7"`
fn integer_key(key: &str) -> Option<i32> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

fn decode_entry(key: &str, value: Value) -> Option<Product> {
    match value {
        Value::Null => None,
        Value::Object(_) => match serde_json::from_value::<RemoteProduct>(value) {
            Ok(record) => Some(record.into_product(key)),
            Err(e) => {
                warn!(key, error = %e, "skipping undecodable product record");
                None
            }
        },
        other => {
            warn!(key, kind = json_kind(&other), "skipping non-object product record");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
