//! Startup seeding.
//!
//! Creates the `admin` account and a small sample catalogue when they are
//! missing. Running it twice changes nothing. Roles and their permissions
//! come from the migration, not from here.

use chrono::Utc;
use erp_core::{Category, Unit, User, ADMIN_ROLE_ID};
use erp_db::{Database, DbError};
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::config::ApiConfig;
use crate::error::ApiError;

pub const ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_CATEGORIES: [&str; 3] = ["Electronics", "Food", "Clothing"];
pub const DEFAULT_UNITS: [&str; 3] = ["Piece", "Kilogram", "Liter"];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Failed to prepare admin account: {0}")]
    Admin(String),
}

impl From<ApiError> for SeedError {
    fn from(err: ApiError) -> Self {
        SeedError::Admin(err.to_string())
    }
}

/// What a seeding run created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub categories_created: usize,
    pub units_created: usize,
}

/// Seeds the admin user and sample catalogue.
pub async fn seed_defaults(db: &Database, config: &ApiConfig) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();
    let now = Utc::now();

    if db.users().get_by_username(ADMIN_USERNAME).await?.is_none() {
        let admin = User {
            id: Uuid::new_v4().to_string(),
            username: ADMIN_USERNAME.to_string(),
            email: "admin@erp.local".to_string(),
            password_hash: hash_password(&config.admin_password)?,
            role_id: ADMIN_ROLE_ID.to_string(),
            created_at: now,
            updated_at: now,
        };
        db.users().insert(&admin).await?;
        report.admin_created = true;
    }

    for name in DEFAULT_CATEGORIES {
        if db.categories().get_by_name(name).await?.is_none() {
            db.categories()
                .insert(&Category {
                    id: Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    description: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            report.categories_created += 1;
        }
    }

    for name in DEFAULT_UNITS {
        if db.units().get_by_name(name).await?.is_none() {
            db.units()
                .insert(&Unit {
                    id: Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    description: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            report.units_created += 1;
        }
    }

    info!(
        admin_created = report.admin_created,
        categories = report.categories_created,
        units = report.units_created,
        "Seeding complete"
    );

    Ok(report)
}
