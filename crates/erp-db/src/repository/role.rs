//! # Role Repository
//!
//! Roles and their permission sets. Both are seeded by migration.

use sqlx::SqlitePool;

use crate::error::DbResult;
use erp_core::{PermissionSet, Role};

#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoleRepository { pool }
    }

    /// Lists roles sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Role>> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(role)
    }

    /// Loads the permissions granted to a role.
    ///
    /// An unknown role yields an empty set.
    pub async fn permissions(&self, role_id: &str) -> DbResult<PermissionSet> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT permission FROM role_permissions WHERE role_id = ?1",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(names.into_iter().collect())
    }
}
