//! # Stores
//!
//! Handles to the three record sets. Built once at startup and shared through
//! [`crate::state::AppState`], so handlers never reach for a global connection.
//!
//! - [`crate::database::MongoStore`] backs them with MongoDB collections
//! - [`crate::memory::MemoryStore`] keeps everything in process for local runs and tests
use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Meal, Order, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate key")]
    Duplicate,

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Looks up the user a token was issued to.
    async fn resolve_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_meals(&self) -> Result<Vec<Meal>, StoreError>;

    /// Meals matching any of `ids`, unknown ids are skipped.
    async fn find_meals(&self, ids: &[String]) -> Result<Vec<Meal>, StoreError>;

    async fn insert_meals(&self, meals: Vec<Meal>) -> Result<(), StoreError>;

    async fn count_meals(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// Orders owned by `user_id`, most recent first.
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError>;
}
