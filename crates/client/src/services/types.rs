//! Minimal DTOs for the bundled service groups.
//!
//! Deliberately sparse: only the fields the SDK itself exercises. Unknown
//! fields are ignored on deserialization, so these types stay compatible
//! with whatever extensions a site has active. Integrations with richer
//! needs define their own DTOs and use [`Resource`](super::Resource)
//! directly.

use serde::{Deserialize, Serialize};

/// A catalog product (store or admin representation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Product id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Price as the API reports it (minor units or decimal string,
    /// surface-dependent).
    #[serde(default)]
    pub price: Option<String>,
    /// Publication status (admin surface only).
    #[serde(default)]
    pub status: Option<String>,
    /// URL slug.
    #[serde(default)]
    pub slug: Option<String>,
}

/// An order (admin representation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order id.
    pub id: u64,
    /// Order status (`pending`, `processing`, ...).
    pub status: String,
    /// Grand total as a decimal string.
    #[serde(default)]
    pub total: Option<String>,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// One line of a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Line key.
    pub key: String,
    /// Product id.
    pub id: u64,
    /// Quantity.
    pub quantity: u32,
    /// Product name.
    #[serde(default)]
    pub name: Option<String>,
}

/// The current cart (store surface).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Cart {
    /// Cart lines.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Total number of items.
    #[serde(default)]
    pub items_count: u32,
}
