//! # Category Repository
//!
//! CRUD for product categories.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use erp_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Gets a category by its (unique) name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken
    pub async fn insert(&self, category: &Category) -> DbResult<Category> {
        debug!(name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category.clone())
    }

    /// Updates name and description, refreshing `updated_at`.
    pub async fn update(&self, id: &str, name: &str, description: Option<&str>) -> DbResult<Category> {
        debug!(id = %id, "Updating category");

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
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

        category.ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - products still use it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{new_category, new_product, new_unit};
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_crud_round() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let created = repo.insert(&new_category("Electronics")).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);

        let updated = repo
            .update(&created.id, "Gadgets", Some("Small devices"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Gadgets");
        assert_eq!(updated.description.as_deref(), Some("Small devices"));
        assert_eq!(updated.created_at, created.created_at);

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.insert(&new_category("Food")).await.unwrap();
        let err = repo.insert(&new_category("Food")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field } if field == "name"));
    }

    #[tokio::test]
    async fn test_missing_category() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        assert!(matches!(
            repo.update("nope", "x", None).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(repo.delete("nope").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_in_use_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.categories().insert(&new_category("Food")).await.unwrap();
        let unit = db.units().insert(&new_unit("Piece")).await.unwrap();
        db.products()
            .insert(&new_product("Bread", 250, 10, &category.id, &unit.id))
            .await
            .unwrap();

        let err = db.categories().delete(&category.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
