//! HTTP route handlers.
//!
//! ```text
//! /health                     health::check
//! /register, /login           auth
//! /api/categories[/{id}]      categories   (categories:read | categories:write)
//! /api/units[/{id}]           units        (units:read | units:write)
//! /api/products[/{id}]        products     (products:read | products:write)
//! /api/sales[/{id}]           sales        (sales:read | sales:create)
//! ```

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod sales;
pub mod units;

/// Body of the category and unit create/update endpoints.
#[derive(Debug, Deserialize)]
pub struct NamedEntityRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NamedEntityRequest {
    /// Trimmed name, validated.
    pub fn name(&self) -> Result<String, erp_core::ValidationError> {
        let name = self.name.trim();
        erp_core::validation::validate_name("name", name)?;
        Ok(name.to_string())
    }

    /// Description with blank values collapsed to `None`.
    pub fn description(&self) -> Option<String> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }
}

/// `{"message": "..."}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
