use axum::{
    extract::{FromRef, Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    AuthResponse, CreateUserRequest, LoginRequest, PublicUser, UpdateUserRequest,
};
use crate::auth::jwt::{AuthStaff, JwtKeys};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo;
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/:id", patch(update_user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = Vec::new();
    if payload.username.trim().is_empty() {
        errors.push("username is required".to_string());
    }
    if payload.password.trim().is_empty() {
        errors.push("password is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let user = repo::find_by_username(&state.db, payload.username.trim())
        .await?
        .ok_or_else(|| {
            warn!(username = %payload.username, "login unknown username");
            ApiError::InvalidCredentials
        })?;

    if !user.is_active {
        warn!(user_id = user.id, "login on disabled account");
        return Err(ApiError::AccountDisabled);
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state, staff, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    staff: AuthStaff,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    staff.require_admin()?;

    let username = payload.username.trim();
    let password = payload.password.trim();

    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push("username is required".to_string());
    } else if username.len() < 3 {
        errors.push("username must be at least 3 characters".to_string());
    }
    if password.is_empty() {
        errors.push("password is required".to_string());
    } else if password.len() < 4 {
        errors.push("password must be at least 4 characters".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if repo::find_by_username(&state.db, username).await?.is_some() {
        return Err(ApiError::Duplicate(format!(
            "username '{username}' already exists"
        )));
    }

    let hash = hash_password(password)?;
    let user = repo::create(&state.db, username, &hash, payload.role, payload.is_active).await?;

    info!(
        admin_id = staff.user_id,
        user_id = user.id,
        username = %user.username,
        role = ?user.role,
        "user created"
    );
    Ok(Json(user.into()))
}

#[instrument(skip(state, staff))]
pub async fn list_users(
    State(state): State<AppState>,
    staff: AuthStaff,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    staff.require_admin()?;
    let users = repo::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, staff, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    staff: AuthStaff,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    staff.require_admin()?;

    let user = repo::update_flags(&state.db, id, payload.role, payload.is_active)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    info!(
        admin_id = staff.user_id,
        user_id = user.id,
        role = ?user.role,
        is_active = user.is_active,
        "user updated"
    );
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::Role;
    use crate::db::test_util::test_state;
    use crate::state::AppState;

    async fn seed_user(state: &AppState, username: &str, password: &str, active: bool) -> i64 {
        let hash = hash_password(password).expect("hash");
        repo::create(&state.db, username, &hash, Role::Staff, active)
            .await
            .expect("seed user")
            .id
    }

    fn login_req(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.into(),
            password: password.into(),
        })
    }

    #[tokio::test]
    async fn login_collects_blank_field_errors() {
        let state = test_state().await;
        let err = login(State(state), login_req("  ", "")).await.unwrap_err();
        match err {
            ApiError::Validation(messages) => assert_eq!(messages.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_unknown_user_is_invalid_credentials() {
        let state = test_state().await;
        let err = login(State(state), login_req("nobody", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_disabled_account_is_account_disabled() {
        let state = test_state().await;
        seed_user(&state, "somchai", "s3cret", false).await;

        let err = login(State(state.clone()), login_req("somchai", "s3cret"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccountDisabled));

        // the account state is reported before the credential mismatch
        let err = login(State(state), login_req("somchai", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AccountDisabled));
    }

    #[tokio::test]
    async fn login_wrong_password_is_invalid_credentials() {
        let state = test_state().await;
        seed_user(&state, "somchai", "s3cret", true).await;
        let err = login(State(state), login_req("somchai", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_success_returns_token_and_public_user() {
        let state = test_state().await;
        seed_user(&state, "somchai", "s3cret", true).await;
        let Json(resp) = login(State(state), login_req("somchai", "s3cret"))
            .await
            .expect("login");
        assert!(!resp.token.is_empty());
        assert_eq!(resp.user.username, "somchai");
        assert_eq!(resp.user.role, Role::Staff);
    }
}
