use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument};

use crate::auth::jwt::AuthStaff;
use crate::error::ApiError;
use crate::members::dto::MemberUpsertRequest;
use crate::members::repo::{self, ActiveMember, Member};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route("/members/active", get(list_active))
        .route(
            "/members/:id",
            axum::routing::put(update_member).delete(delete_member),
        )
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_upsert(payload: &MemberUpsertRequest) -> Result<(String, String, String), ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();
    let phone = payload.phone.trim();

    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push("name is required".to_string());
    }
    if email.is_empty() {
        errors.push("email is required".to_string());
    } else if !is_valid_email(email) {
        errors.push("email is not valid".to_string());
    }
    if phone.is_empty() {
        errors.push("phone is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok((name.to_string(), email.to_string(), phone.to_string()))
}

#[instrument(skip(state, staff, payload))]
pub async fn create_member(
    State(state): State<AppState>,
    staff: AuthStaff,
    Json(payload): Json<MemberUpsertRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let (name, email, phone) = validate_upsert(&payload)?;
    let member = repo::insert(&state.db, &name, &email, &phone).await?;
    info!(
        staff_id = staff.user_id,
        member_id = member.id,
        member_code = %member.member_code,
        "member created"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

#[instrument(skip(state, _staff))]
pub async fn list_members(
    State(state): State<AppState>,
    _staff: AuthStaff,
) -> Result<Json<Vec<Member>>, ApiError> {
    Ok(Json(repo::list(&state.db).await?))
}

#[instrument(skip(state, _staff))]
pub async fn list_active(
    State(state): State<AppState>,
    _staff: AuthStaff,
) -> Result<Json<Vec<ActiveMember>>, ApiError> {
    Ok(Json(repo::list_active(&state.db).await?))
}

#[instrument(skip(state, staff, payload))]
pub async fn update_member(
    State(state): State<AppState>,
    staff: AuthStaff,
    Path(id): Path<i64>,
    Json(payload): Json<MemberUpsertRequest>,
) -> Result<Json<Member>, ApiError> {
    let (name, email, phone) = validate_upsert(&payload)?;
    let member = repo::update(&state.db, id, &name, &email, &phone)
        .await?
        .ok_or(ApiError::NotFound("member"))?;
    info!(staff_id = staff.user_id, member_id = member.id, "member updated");
    Ok(Json(member))
}

#[instrument(skip(state, staff))]
pub async fn delete_member(
    State(state): State<AppState>,
    staff: AuthStaff,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if repo::open_item_count(&state.db, id).await? > 0 {
        return Err(ApiError::Conflict(
            "member still has books on loan".to_string(),
        ));
    }
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("member"));
    }
    info!(staff_id = staff.user_id, member_id = id, "member deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{self as users, Role};
    use crate::books::repo as books;
    use crate::borrows::engine;
    use crate::db::test_util::test_state;
    use time::macros::date;

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("somchai@example.com"));
        assert!(!is_valid_email("somchai"));
        assert!(!is_valid_email("somchai@nodot"));
        assert!(!is_valid_email("with space@example.com"));
    }

    #[tokio::test]
    async fn delete_refused_while_member_has_open_items() {
        let state = test_state().await;
        let user = users::create(&state.db, "staff1", "x", Role::Staff, true)
            .await
            .expect("seed staff");
        let staff = AuthStaff {
            user_id: user.id,
            role: Role::Staff,
        };
        let member = repo::insert(&state.db, "Somchai", "a@example.com", "081")
            .await
            .expect("seed member");
        let book = books::insert(&state.db, "Dune", "Herbert")
            .await
            .expect("seed book");

        engine::create_transaction(
            &state.db,
            member.id,
            staff.user_id,
            date!(2025 - 01 - 10),
            &[book.id],
        )
        .await
        .expect("borrow");

        let err = delete_member(State(state.clone()), staff, Path(member.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(
            repo::is_active(&state.db, member.id).await.unwrap(),
            Some(true)
        );

        // once everything is returned the delete goes through
        let item: i64 = sqlx::query_scalar("SELECT MAX(id) FROM borrow_items")
            .fetch_one(&state.db)
            .await
            .expect("item id");
        engine::return_item(&state.db, item, staff.user_id)
            .await
            .expect("return");

        let status = delete_member(State(state.clone()), staff, Path(member.id))
            .await
            .expect("delete");
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(repo::is_active(&state.db, member.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_of_unknown_member_is_not_found() {
        let state = test_state().await;
        let user = users::create(&state.db, "staff1", "x", Role::Staff, true)
            .await
            .expect("seed staff");
        let staff = AuthStaff {
            user_id: user.id,
            role: Role::Staff,
        };
        let err = delete_member(State(state), staff, Path(999))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("member")));
    }
}
