use std::sync::Arc;

use askama::Template;
use axum::{
    Extension, Json,
    extract::{FromRequest, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};

use crate::{
    accounts,
    error::AppError,
    models::{
        CreatedOrder, LoginRequest, Meal, MessageResponse, OrderRequest, OrderView,
        RegisterRequest, TokenResponse, User,
    },
    orders,
    state::AppState,
};

/// `Json` whose rejection is a 400 with a `{message}` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub meals: Vec<Meal>,
}

pub async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let meals = state.catalog.list_meals().await?;
    let page = IndexTemplate { meals }.render().map_err(AppError::internal)?;

    Ok(Html(page))
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    accounts::register(&state, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = accounts::login(&state, payload).await?;

    Ok(Json(TokenResponse { token }))
}

pub async fn meals_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Meal>>, AppError> {
    Ok(Json(state.catalog.list_meals().await?))
}

pub async fn create_order_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    AppJson(payload): AppJson<OrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    #[cfg(feature = "verbose")]
    tracing::info!("Order request from {}: {:?}", user.id, payload);

    let order = orders::place_order(&state, &user, payload).await?;

    Ok((StatusCode::CREATED, Json(CreatedOrder { order })))
}

pub async fn orders_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<OrderView>>, AppError> {
    Ok(Json(orders::list_orders(&state, &user).await?))
}
