use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{Category, Venue};

pub struct LookupRepo {
    db: PgPool,
}

impl LookupRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn venues(&self) -> Result<Vec<Venue>> {
        sqlx::query_as::<_, Venue>(
            "SELECT id, name, address, capacity, created_at FROM venues ORDER BY name ASC",
        )
        .fetch_all(&self.db)
        .await
    }

    pub async fn create_venue(
        &self,
        name: &str,
        address: Option<String>,
        capacity: Option<i32>,
    ) -> Result<Venue> {
        sqlx::query_as::<_, Venue>(
            "INSERT INTO venues (id, name, address, capacity) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, address, capacity, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(address)
        .bind(capacity)
        .fetch_one(&self.db)
        .await
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories ORDER BY name ASC")
            .fetch_all(&self.db)
            .await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name) VALUES ($1, $2) RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.db)
        .await
    }
}
