/// Category endpoints
///
/// Writes are attributed to the bearer-token user, or to the first
/// administrator when the request is anonymous.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AppJson, AppPath, AppQuery},
    middleware::auth::Actor,
    routes::{MessageResponse, Pagination},
};
use axum::{extract::State, http::StatusCode, Json};
use storefront_shared::models::category::{Category, CategoryChanges, NewCategory};
use uuid::Uuid;

pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<Category>>> {
    let categories = state.categories().list(page.offset, page.limit).await?;
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Category>> {
    state
        .categories()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

/// Case-insensitive lookup by exact name
pub async fn get_category_by_name(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> ApiResult<Json<Category>> {
    state
        .categories()
        .get_by_name(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

/// Create a category
///
/// # Endpoint
///
/// ```text
/// POST /v1/categories
/// Authorization: Bearer <token>   (optional)
///
/// { "name": "Electronics", "description": "Gadgets and devices" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Blank or too long name, duplicate name, or no
///   administrator exists to attribute an anonymous request to
/// - `401 Unauthorized`: Invalid bearer token
pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(new_category): AppJson<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state
        .categories()
        .create(new_category, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT` and `PATCH`; only the fields present change
pub async fn update_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    actor: Actor,
    AppJson(changes): AppJson<CategoryChanges>,
) -> ApiResult<Json<Category>> {
    if state.categories().get(id).await?.is_none() {
        return Err(ApiError::not_found("Category"));
    }

    state
        .categories()
        .update(id, changes, actor.user_id())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

/// # Errors
///
/// - `400 Bad Request`: The category still has products
/// - `404 Not Found`: No such category
pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.categories().delete(id).await? {
        return Err(ApiError::not_found("Category"));
    }

    Ok(Json(MessageResponse::ok("Category deleted")))
}
