use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{hash_password, verify_password},
    error::AppError,
    models::{LoginRequest, RegisterRequest, User},
    notifier::{WELCOME_SUBJECT, welcome_message},
    state::AppState,
    store::StoreError,
};

pub async fn register(state: &AppState, request: RegisterRequest) -> Result<User, AppError> {
    let name = request.name.trim().to_string();
    let email = request.email.trim().to_string();

    if name.is_empty() || email.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::EmailInUse);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        password_hash: hash_password(request.password).await?,
        created_at: Utc::now(),
    };

    // the unique index still catches a registration racing past the lookup
    state.users.insert_user(&user).await.map_err(|e| match e {
        StoreError::Duplicate => AppError::EmailInUse,
        other => other.into(),
    })?;
    info!("Registered user {}", user.id);

    state
        .notifier
        .notify(&user, WELCOME_SUBJECT, &welcome_message(&user.name))
        .await;

    Ok(user)
}

/// Returns a signed token for the account.
pub async fn login(state: &AppState, request: LoginRequest) -> Result<String, AppError> {
    let Some(user) = state.users.find_by_email(request.email.trim()).await? else {
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(request.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    state.tokens.issue(&user.id).map_err(AppError::internal)
}
