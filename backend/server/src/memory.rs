use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    models::{Meal, Order, User},
    store::{CatalogStore, OrderStore, StoreError, UserStore},
};

/// Process-local store, selected when no `MONGODB_URI` is configured.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    meals: RwLock<Vec<Meal>>,
    orders: RwLock<Vec<Order>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;

        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn resolve_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;

        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        // check and push under one write lock, same guarantee as the unique index
        let mut users = self.users.write().await;

        if users.iter().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate);
        }

        users.push(user.clone());
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_meals(&self) -> Result<Vec<Meal>, StoreError> {
        Ok(self.meals.read().await.clone())
    }

    async fn find_meals(&self, ids: &[String]) -> Result<Vec<Meal>, StoreError> {
        let meals = self.meals.read().await;

        Ok(meals
            .iter()
            .filter(|meal| ids.contains(&meal.id))
            .cloned()
            .collect())
    }

    async fn insert_meals(&self, meals: Vec<Meal>) -> Result<(), StoreError> {
        self.meals.write().await.extend(meals);
        Ok(())
    }

    async fn count_meals(&self) -> Result<u64, StoreError> {
        Ok(self.meals.read().await.len() as u64)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;

        // newest insert first so equal timestamps still come out newest-first
        let mut owned: Vec<Order> = orders
            .iter()
            .rev()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::OrderStatus;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
        }
    }

    fn order(id: &str, user_id: &str, minutes_ago: i64) -> Order {
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            meals: Vec::new(),
            total: 0.0,
            status: OrderStatus::Pending,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();

        store.insert_user(&user("u1", "ada@example.com")).await.unwrap();
        let second = store.insert_user(&user("u2", "ada@example.com")).await;

        assert!(matches!(second, Err(StoreError::Duplicate)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn orders_are_scoped_and_newest_first() {
        let store = MemoryStore::new();

        store.insert_order(&order("old", "a", 10)).await.unwrap();
        store.insert_order(&order("other", "b", 5)).await.unwrap();
        store.insert_order(&order("new", "a", 1)).await.unwrap();

        let ids: Vec<String> = store
            .orders_for_user("a")
            .await
            .unwrap()
            .into_iter()
            .map(|order| order.id)
            .collect();

        assert_eq!(ids, ["new", "old"]);
    }
}
