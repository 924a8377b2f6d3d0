//! # MongoDB
//!
//! Document database behind the three stores.
//!
//! ## Collections
//!
//! - `users`: one document per account, unique index on `email`
//! - `meals`: the catalog, written by the startup seed only
//! - `orders`: one document per placed order, looked up by `userId`
//!
//! ## Notes
//!
//! - Ids are plain strings (UUID v4), not `ObjectId`, so references submitted by the
//!   browser pass through untouched
//! - Timestamps are stored as RFC 3339 strings and ordered in process after the fetch
//! - Email uniqueness is enforced by the index at write time, a duplicate insert
//!   surfaces as [`StoreError::Duplicate`] even when two registrations race
use async_trait::async_trait;
use mongodb::{
    Client, Collection, Cursor, Database, IndexModel,
    bson::doc,
    error::{Error, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    models::{Meal, Order, User},
    store::{CatalogStore, OrderStore, StoreError, UserStore},
};

pub const USERS: &str = "users";
pub const MEALS: &str = "meals";
pub const ORDERS: &str = "orders";

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self {
            db: client.database(database),
        };

        store.ensure_indexes().await?;
        info!("Connected to MongoDB database {database}");

        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(unique_email).await?;

        let by_owner = IndexModel::builder().keys(doc! { "userId": 1 }).build();
        self.orders().create_index(by_owner).await?;

        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn meals(&self) -> Collection<Meal> {
        self.db.collection(MEALS)
    }

    fn orders(&self) -> Collection<Order> {
        self.db.collection(ORDERS)
    }
}

async fn drain<T>(mut cursor: Cursor<T>) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned + Send + Sync,
{
    let mut items = Vec::new();
    while cursor.advance().await? {
        items.push(cursor.deserialize_current()?);
    }

    Ok(items)
}

fn is_duplicate_key(error: &Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY
        }
        _ => false,
    }
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        if is_duplicate_key(&error) {
            return StoreError::Duplicate;
        }

        StoreError::Backend(error.to_string())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn resolve_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users().insert_one(user).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MongoStore {
    async fn list_meals(&self) -> Result<Vec<Meal>, StoreError> {
        drain(self.meals().find(doc! {}).await?).await
    }

    async fn find_meals(&self, ids: &[String]) -> Result<Vec<Meal>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        drain(self.meals().find(filter).await?).await
    }

    async fn insert_meals(&self, meals: Vec<Meal>) -> Result<(), StoreError> {
        if meals.is_empty() {
            return Ok(());
        }

        self.meals().insert_many(meals).await?;
        Ok(())
    }

    async fn count_meals(&self) -> Result<u64, StoreError> {
        Ok(self.meals().count_documents(doc! {}).await?)
    }
}

#[async_trait]
impl OrderStore for MongoStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders().insert_one(order).await?;
        Ok(())
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        let mut orders = drain(self.orders().find(doc! { "userId": user_id }).await?).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders)
    }
}
