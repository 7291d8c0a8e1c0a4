/// User account endpoints
///
/// # Endpoints
///
/// - `GET /v1/users?offset&limit` - List users
/// - `POST /v1/users` - Register a user
/// - `GET /v1/users/admins` - List administrators
/// - `GET /v1/users/email/:email` - Look up by email
/// - `GET /v1/users/username/:username` - Look up by username
/// - `GET|PUT|PATCH|DELETE /v1/users/:id`
/// - `GET /v1/users/:id/is-admin`
/// - `PATCH /v1/users/:id/deactivate`
/// - `POST /v1/users/:id/change-password`
///
/// Responses never contain the password hash.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AppJson, AppPath, AppQuery},
    routes::{MessageResponse, Pagination},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::json;
use storefront_shared::models::user::{NewUser, User, UserChanges};
use uuid::Uuid;
use validator::Validate;

/// Change password request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.users().list(page.offset, page.limit).await?;
    Ok(Json(users))
}

/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<User>> {
    state
        .users()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> ApiResult<Json<User>> {
    state
        .users()
        .get_by_email(&email)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> ApiResult<Json<User>> {
    state
        .users()
        .get_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn list_admins(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users().list_admins().await?))
}

/// Whether the user holds the admin flag
///
/// # Response
///
/// ```json
/// {
///   "message": "Admin status retrieved",
///   "success": true,
///   "data": { "user_id": "uuid", "is_admin": false }
/// }
/// ```
pub async fn is_admin(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let is_admin = state
        .users()
        .is_admin(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(MessageResponse::with_data(
        "Admin status retrieved",
        json!({ "user_id": id, "is_admin": is_admin }),
    )))
}

/// Register a user
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
/// Content-Type: application/json
///
/// {
///   "name": "Alice Smith",
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "Str0ng!Pass",
///   "phone": "+1 555 0100"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed field, weak password, or the username or
///   email is already taken
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(new_user): AppJson<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users().create(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Full or partial profile update (`PUT` and `PATCH` behave the same)
///
/// Only the fields present in the body change. An empty body returns the
/// user unchanged.
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(changes): AppJson<UserChanges>,
) -> ApiResult<Json<User>> {
    if state.users().get(id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    state
        .users()
        .update(id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

/// Delete a user and the products they own
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.users().delete(id).await? {
        return Err(ApiError::not_found("User"));
    }

    Ok(Json(MessageResponse::ok("User deleted")))
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<User>> {
    state
        .users()
        .deactivate(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User"))
}

/// Change the password after confirming the current one
///
/// # Errors
///
/// - `400 Bad Request`: Current password is wrong, or the new one is weak or
///   unchanged
/// - `404 Not Found`: No such user
pub async fn change_password(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate()?;

    state
        .users()
        .change_password(id, &req.current_password, &req.new_password)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(MessageResponse::ok("Password changed")))
}
