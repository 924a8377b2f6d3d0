//! # Models
//!
//! Records kept in the stores plus the request/response payloads of the JSON API.
//!
//! Records serialize with `_id` and camelCase keys so the same shape is stored in
//! MongoDB and returned to the browser.
//!
//! ## Ownership
//! - A [`User`] is created at registration and never updated.
//! - A [`Meal`] is written once by the catalog seed.
//! - An [`Order`] belongs to exactly one user and is read-only after creation.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never the submitted password
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutri_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub meal_id: String,
    pub quantity: u32,
    /// Price per unit at the moment the order was placed
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub meals: Vec<LineItem>,
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Swaps each meal reference for the catalog record, `None` once the meal is gone.
    pub fn populate(self, catalog: &HashMap<String, Meal>) -> OrderView {
        let meals = self
            .meals
            .into_iter()
            .map(|item| PopulatedLineItem {
                meal_id: catalog.get(&item.meal_id).cloned(),
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        OrderView {
            id: self.id,
            user_id: self.user_id,
            meals,
            total: self.total,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

pub fn compute_total(items: &[LineItem]) -> f64 {
    items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedLineItem {
    pub meal_id: Option<Meal>,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub meals: Vec<PopulatedLineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    #[serde(default)]
    pub meal_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub meals: Vec<LineItemRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order: Order,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(meal_id: &str, quantity: u32, price: f64) -> LineItem {
        LineItem {
            meal_id: meal_id.to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn total_is_price_times_quantity() {
        let items = [item("m1", 2, 3000.0), item("m2", 1, 4000.0)];

        assert_eq!(compute_total(&items), 10000.0);
        assert_eq!(compute_total(&[]), 0.0);
    }

    #[test]
    fn order_serializes_with_mongo_keys() {
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            meals: vec![item("m1", 1, 3000.0)],
            total: 3000.0,
            status: OrderStatus::default(),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["_id"], "o1");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["meals"][0]["mealId"], "m1");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn populate_leaves_missing_meals_empty() {
        let meal = Meal {
            id: "m1".to_string(),
            name: "Semovita".to_string(),
            price: 3000.0,
            image: None,
            category: None,
            nutri_score: None,
            rating: None,
            reviews: None,
            description: None,
        };
        let catalog = HashMap::from([(meal.id.clone(), meal.clone())]);
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            meals: vec![item("m1", 1, 3000.0), item("gone", 2, 10.0)],
            total: 3020.0,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };

        let view = order.populate(&catalog);
        assert_eq!(view.meals[0].meal_id.as_ref(), Some(&meal));
        assert!(view.meals[1].meal_id.is_none());
        assert_eq!(view.meals[1].quantity, 2);
    }

    #[test]
    fn line_item_request_tolerates_missing_fields() {
        let request: OrderRequest =
            serde_json::from_str(r#"{"meals":[{"quantity":2,"price":3000}]}"#).unwrap();

        assert!(request.meals[0].meal_id.is_none());
        assert_eq!(request.meals[0].quantity, Some(2));
    }
}
