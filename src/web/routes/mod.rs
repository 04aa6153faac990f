//! Route handlers, one module per area.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod products;
pub mod sales;
pub mod till;
pub mod users;

use serde::{Deserialize, Deserializer};

/// Treats an empty form field as absent.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}
