//! # Orders
//!
//! ## Placing
//! 1. Every line item needs a `mealId` and a positive `quantity`, nothing is stored otherwise
//! 2. Prices come from the catalog, or from the request when `ORDER_PRICING=client`
//! 3. `total` is always computed here from the priced line items
//! 4. The order is stored as `pending`, then a confirmation goes out best effort
//!
//! ## Listing
//! - Only the caller's orders, newest first
//! - Each `mealId` is replaced with the full meal, `null` if it was removed
use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::PriceSource,
    error::AppError,
    models::{
        LineItem, LineItemRequest, Meal, Order, OrderRequest, OrderStatus, OrderView, User,
        compute_total,
    },
    notifier::{ORDER_SUBJECT, order_message},
    state::AppState,
};

/// A line item that passed validation, price still to be settled.
struct Requested {
    meal_id: String,
    quantity: u32,
    price: Option<f64>,
}

fn validate(items: Vec<LineItemRequest>, pricing: PriceSource) -> Result<Vec<Requested>, AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(
            "Order must contain at least one meal".to_string(),
        ));
    }

    if items
        .iter()
        .any(|item| !matches!(item.meal_id.as_deref(), Some(id) if !id.trim().is_empty()))
    {
        return Err(AppError::Validation("Each meal must have a mealId".to_string()));
    }

    items
        .into_iter()
        .map(|item| {
            let quantity = match item.quantity {
                Some(quantity) if quantity > 0 => quantity,
                _ => {
                    return Err(AppError::Validation(
                        "Each meal must have a positive quantity".to_string(),
                    ));
                }
            };

            if pricing == PriceSource::Client
                && !item.price.is_some_and(|price| price.is_finite() && price >= 0.0)
            {
                return Err(AppError::Validation(
                    "Each meal must have a valid price".to_string(),
                ));
            }

            Ok(Requested {
                meal_id: item.meal_id.unwrap_or_default().trim().to_string(),
                quantity,
                price: item.price,
            })
        })
        .collect()
}

async fn price(
    state: &AppState,
    requested: Vec<Requested>,
) -> Result<Vec<LineItem>, AppError> {
    if state.config.pricing == PriceSource::Client {
        return Ok(requested
            .into_iter()
            .map(|item| LineItem {
                meal_id: item.meal_id,
                quantity: item.quantity,
                price: item.price.unwrap_or_default(),
            })
            .collect());
    }

    let ids = unique_ids(requested.iter().map(|item| item.meal_id.as_str()));
    let catalog = state
        .catalog
        .find_meals(&ids)
        .await
        .map_err(AppError::OrderFailed)?;
    let prices: HashMap<&str, f64> = catalog
        .iter()
        .map(|meal| (meal.id.as_str(), meal.price))
        .collect();

    requested
        .into_iter()
        .map(|item| match prices.get(item.meal_id.as_str()) {
            Some(&price) => Ok(LineItem {
                meal_id: item.meal_id,
                quantity: item.quantity,
                price,
            }),
            None => Err(AppError::Validation(format!("Unknown meal: {}", item.meal_id))),
        })
        .collect()
}

fn unique_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();

    ids.filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

pub async fn place_order(
    state: &AppState,
    user: &User,
    request: OrderRequest,
) -> Result<Order, AppError> {
    let requested = validate(request.meals, state.config.pricing)?;
    let meals = price(state, requested).await?;

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        total: compute_total(&meals),
        meals,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
    };

    state
        .orders
        .insert_order(&order)
        .await
        .map_err(AppError::OrderFailed)?;
    info!("Order {} placed by {}, total {}", order.id, user.id, order.total);

    state
        .notifier
        .notify(user, ORDER_SUBJECT, &order_message(&order.id, order.total))
        .await;

    Ok(order)
}

pub async fn list_orders(state: &AppState, user: &User) -> Result<Vec<OrderView>, AppError> {
    let orders = state.orders.orders_for_user(&user.id).await?;

    let ids = unique_ids(
        orders
            .iter()
            .flat_map(|order| order.meals.iter().map(|item| item.meal_id.as_str())),
    );
    let catalog: HashMap<String, Meal> = state
        .catalog
        .find_meals(&ids)
        .await?
        .into_iter()
        .map(|meal| (meal.id.clone(), meal))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| order.populate(&catalog))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(meal_id: Option<&str>, quantity: Option<u32>, price: Option<f64>) -> LineItemRequest {
        LineItemRequest {
            meal_id: meal_id.map(str::to_string),
            quantity,
            price,
        }
    }

    fn message(result: Result<Vec<Requested>, AppError>) -> String {
        match result {
            Err(AppError::Validation(message)) => message,
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected a validation failure"),
        }
    }

    #[test]
    fn empty_orders_are_rejected() {
        let result = validate(Vec::new(), PriceSource::Catalog);

        assert_eq!(message(result), "Order must contain at least one meal");
    }

    #[test]
    fn every_item_needs_a_meal_id() {
        let items = vec![
            item(Some("m1"), Some(1), Some(3000.0)),
            item(Some("  "), Some(1), Some(3000.0)),
        ];
        assert_eq!(message(validate(items, PriceSource::Client)), "Each meal must have a mealId");

        let items = vec![item(None, Some(1), Some(3000.0))];
        assert_eq!(message(validate(items, PriceSource::Catalog)), "Each meal must have a mealId");
    }

    #[test]
    fn quantity_must_be_positive() {
        let items = vec![item(Some("m1"), Some(0), Some(3000.0))];
        assert_eq!(
            message(validate(items, PriceSource::Catalog)),
            "Each meal must have a positive quantity"
        );

        let items = vec![item(Some("m1"), None, Some(3000.0))];
        assert_eq!(
            message(validate(items, PriceSource::Catalog)),
            "Each meal must have a positive quantity"
        );
    }

    #[test]
    fn client_pricing_needs_a_price() {
        let items = vec![item(Some("m1"), Some(1), None)];
        assert_eq!(
            message(validate(items, PriceSource::Client)),
            "Each meal must have a valid price"
        );

        let items = vec![item(Some("m1"), Some(1), Some(-5.0))];
        assert_eq!(
            message(validate(items, PriceSource::Client)),
            "Each meal must have a valid price"
        );

        // catalog pricing ignores what was sent
        let items = vec![item(Some("m1"), Some(1), None)];
        assert!(validate(items, PriceSource::Catalog).is_ok());
    }

    #[test]
    fn ids_are_deduplicated_in_order() {
        let ids = unique_ids(["b", "a", "b", "c", "a"].into_iter());

        assert_eq!(ids, ["b", "a", "c"]);
    }
}
