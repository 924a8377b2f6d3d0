//! # Catalog Seed
//!
//! Sample meals written on startup when the catalog is empty. Restarts never
//! duplicate them.
use tracing::info;
use uuid::Uuid;

use crate::{
    models::Meal,
    store::{CatalogStore, StoreError},
};

fn meal(
    name: &str,
    price: f64,
    category: &str,
    nutri_score: u32,
    rating: f64,
    reviews: u32,
    image: &str,
) -> Meal {
    Meal {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        price,
        image: Some(image.to_string()),
        category: Some(category.to_string()),
        nutri_score: Some(nutri_score),
        rating: Some(rating),
        reviews: Some(reviews),
        description: None,
    }
}

pub fn seed_meals() -> Vec<Meal> {
    vec![
        meal(
            "Sweet Potato Porridge",
            3000.0,
            "Vegetarian",
            84,
            4.9,
            537,
            "/public/img/Sweet-Potato-Porridge-recipe-photo-1.jpg",
        ),
        meal(
            "Jollof Rice & Chicken",
            4000.0,
            "Meatarian",
            72,
            5.0,
            987,
            "/public/img/nigerian-food-01-1024x640.jpg.webp",
        ),
        meal(
            "Semovita",
            3000.0,
            "Swallow",
            70,
            4.7,
            663,
            "/public/img/semolina.jpg",
        ),
    ]
}

/// Returns how many meals were inserted.
pub async fn seed_catalog(catalog: &dyn CatalogStore) -> Result<usize, StoreError> {
    if catalog.count_meals().await? > 0 {
        info!("Catalog already populated, skipping seed");
        return Ok(0);
    }

    let meals = seed_meals();
    let inserted = meals.len();
    catalog.insert_meals(meals).await?;
    info!("Sample meals initialized");

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();

        assert_eq!(seed_catalog(&store).await.unwrap(), 3);
        assert_eq!(seed_catalog(&store).await.unwrap(), 0);
        assert_eq!(store.count_meals().await.unwrap(), 3);
    }

    #[test]
    fn seed_prices_are_positive() {
        assert!(seed_meals().iter().all(|meal| meal.price > 0.0));
    }
}
