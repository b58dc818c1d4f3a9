//! # Permissions
//!
//! Roles own a set of named permissions; handlers ask the set whether an
//! action is allowed instead of checking a role name.
//!
//! ## Permission Names
//! ```text
//! <resource>:<action>
//!
//! categories:read   categories:write
//! units:read        units:write
//! products:read     products:write
//! sales:read        sales:create
//!
//! Wildcards:  "*"            every permission
//!             "products:*"   every action on products
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// Permission Names
// =============================================================================

pub const CATEGORIES_READ: &str = "categories:read";
pub const CATEGORIES_WRITE: &str = "categories:write";
pub const UNITS_READ: &str = "units:read";
pub const UNITS_WRITE: &str = "units:write";
pub const PRODUCTS_READ: &str = "products:read";
pub const PRODUCTS_WRITE: &str = "products:write";
pub const SALES_READ: &str = "sales:read";
pub const SALES_CREATE: &str = "sales:create";

/// Grants everything.
pub const WILDCARD: &str = "*";

// =============================================================================
// Permission Set
// =============================================================================

/// The permissions granted to one role.
///
/// ## Example
/// ```rust
/// use erp_core::permission::{PermissionSet, PRODUCTS_READ, PRODUCTS_WRITE};
///
/// let perms: PermissionSet = ["products:read"].into_iter().collect();
/// assert!(perms.allows(PRODUCTS_READ));
/// assert!(!perms.allows(PRODUCTS_WRITE));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// Creates an empty set (allows nothing).
    pub fn new() -> Self {
        PermissionSet(BTreeSet::new())
    }

    /// Adds a permission.
    pub fn grant(&mut self, permission: impl Into<String>) {
        self.0.insert(permission.into());
    }

    /// Checks whether `permission` is granted, directly or via a wildcard.
    pub fn allows(&self, permission: &str) -> bool {
        if self.0.contains(WILDCARD) || self.0.contains(permission) {
            return true;
        }

        match permission.split_once(':') {
            Some((resource, _)) => self.0.contains(&format!("{resource}:*")),
            None => false,
        }
    }

    /// Iterates the granted names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PermissionSet(iter.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
