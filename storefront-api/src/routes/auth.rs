/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Exchange username/email and password for a token
/// - `POST /v1/auth/bootstrap-admin` - Create the default administrator
/// - `GET /v1/auth/verify/:id` - Check that a user exists and is active
/// - `GET /v1/auth/status` - Authentication system status

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AppJson, AppPath},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storefront_shared::{
    auth::jwt::{self, Claims},
    models::user::User,
    store::Store as _,
};
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub login: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// The authenticated user (never includes the password hash)
    pub user: User,

    /// Access token (24h)
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,

    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Login with username or email
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/login
/// Content-Type: application/json
///
/// {
///   "login": "alice",
///   "password": "Str0ng!Pass"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "user": { "id": "uuid", "username": "alice", ... },
///   "access_token": "eyJ...",
///   "token_type": "bearer",
///   "expires_in": 86400
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing login or password
/// - `401 Unauthorized`: Unknown user, wrong password or inactive account
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = state
        .users()
        .authenticate(&req.login, &req.password)
        .await
        .map_err(|e| {
            if matches!(e, storefront_shared::Error::InvalidCredentials) {
                tracing::info!("Failed login attempt");
            }
            ApiError::from(e)
        })?;

    let claims = Claims::new(user.id, user.is_admin);
    let access_token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user,
        access_token,
        token_type: jwt::TOKEN_TYPE.to_string(),
        expires_in: jwt::default_expiration().num_seconds(),
    }))
}

/// Create the default administrator
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/bootstrap-admin
/// ```
///
/// # Response
///
/// `201 Created` the first time, with the temporary password shown once:
///
/// ```json
/// {
///   "message": "Default administrator created",
///   "success": true,
///   "data": { "admin_id": "uuid", "temporary_password": "..." }
/// }
/// ```
///
/// `200 OK` with only `admin_id` when the administrator already exists.
///
/// # Errors
///
/// - `400 Bad Request`: The default email or username belongs to another account
pub async fn bootstrap_admin(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let bootstrap = state.users().ensure_default_admin().await?;

    let (status, body) = match bootstrap.temporary_password {
        Some(password) => (
            StatusCode::CREATED,
            MessageResponse::with_data(
                "Default administrator created",
                json!({
                    "admin_id": bootstrap.user.id,
                    "temporary_password": password,
                    "notice": "Change this password after the first login",
                }),
            ),
        ),
        None => (
            StatusCode::OK,
            MessageResponse::with_data(
                "Default administrator already exists",
                json!({ "admin_id": bootstrap.user.id }),
            ),
        ),
    };

    Ok((status, Json(body)))
}

/// Check that a user exists and report whether they are active
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn verify_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state
        .users()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(MessageResponse::with_data(
        "User verified",
        json!({
            "user_id": user.id,
            "name": user.name,
            "email": user.email,
            "is_active": user.is_active,
            "is_admin": user.is_admin,
        }),
    )))
}

/// Authentication system status
pub async fn auth_status(State(state): State<AppState>) -> Json<MessageResponse> {
    Json(MessageResponse::with_data(
        "Authentication system operational",
        json!({
            "system": jwt::ISSUER,
            "version": env!("CARGO_PKG_VERSION"),
            "authentication": "active",
            "token_type": jwt::TOKEN_TYPE,
            "backend": state.store.backend(),
        }),
    ))
}
