//! # Unit Repository
//!
//! CRUD for units of measure. Same shape as categories.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use erp_core::Unit;

/// Repository for unit-of-measure database operations.
#[derive(Debug, Clone)]
pub struct UnitRepository {
    pool: SqlitePool,
}

impl UnitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UnitRepository { pool }
    }

    /// Lists all units sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Unit>> {
        let units = sqlx::query_as::<_, Unit>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM units
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Unit>> {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM units
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Unit>> {
        let unit = sqlx::query_as::<_, Unit>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM units
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    pub async fn insert(&self, unit: &Unit) -> DbResult<Unit> {
        debug!(name = %unit.name, "Inserting unit");

        sqlx::query(
            r#"
            INSERT INTO units (id, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&unit.id)
        .bind(&unit.name)
        .bind(&unit.description)
        .bind(unit.created_at)
        .bind(unit.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(unit.clone())
    }

    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> DbResult<Unit> {
        debug!(id = %id, "Updating unit");

        let unit = sqlx::query_as::<_, Unit>(
            r#"
            UPDATE units
            SET name = ?2, description = ?3, updated_at = ?4
            WHERE id = ?1
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        unit.ok_or_else(|| DbError::not_found("Unit", id))
    }

    /// Deletes a unit. Fails with ForeignKeyViolation while products use it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting unit");

        let result = sqlx::query("DELETE FROM units WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Unit", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::new_unit;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.units();

        repo.insert(&new_unit("Piece")).await.unwrap();
        repo.insert(&new_unit("Kilogram")).await.unwrap();
        repo.insert(&new_unit("Liter")).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Kilogram", "Liter", "Piece"]);
        assert!(repo.get_by_name("Liter").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rename_to_taken_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.units();

        repo.insert(&new_unit("Piece")).await.unwrap();
        let kg = repo.insert(&new_unit("Kilogram")).await.unwrap();

        let err = repo.update(&kg.id, "Piece", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
