/// Product endpoints
///
/// # Endpoints
///
/// - `GET /v1/products?offset&limit&category_id&owner_id&is_active`
/// - `POST /v1/products`
/// - `GET /v1/products/category/:id` - Products in a category
/// - `GET /v1/products/owner/:id` - Products owned by a user
/// - `GET /v1/products/search/:term` - Case-insensitive name search
/// - `GET /v1/products/price-range?min&max` - Inclusive price range
/// - `GET /v1/products/:id?include_relations=true`
/// - `PUT|PATCH|DELETE /v1/products/:id`
/// - `PATCH /v1/products/:id/stock`
///
/// Prices are JSON numbers with at most two decimal places.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, AppJson, AppPath, AppQuery},
    middleware::auth::Actor,
    routes::{MessageResponse, Pagination},
};
use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_shared::models::product::{
    NewProduct, Product, ProductChanges, ProductDetails, ProductFilter,
};
use uuid::Uuid;

/// Query for `GET /v1/products`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
    pub category_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ListProductsQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            category_id: self.category_id,
            owner_id: self.owner_id,
            is_active: self.is_active,
        }
    }
}

/// Query for `GET /v1/products/:id`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProductQuery {
    /// Adds `category_name` and `owner_username` to the body
    #[serde(default)]
    pub include_relations: bool,
}

/// Query for `GET /v1/products/price-range`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceRangeQuery {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Body for `PATCH /v1/products/:id/stock`
#[derive(Debug, Clone, Deserialize)]
pub struct StockUpdate {
    pub stock: i32,
}

/// A product, optionally with its related names
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProductView {
    Plain(Product),
    Detailed(ProductDetails),
}

pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListProductsQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state
        .products()
        .list(&query.filter(), query.offset, query.limit)
        .await?;
    Ok(Json(products))
}

/// # Errors
///
/// - `404 Not Found`: No such product
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<ProductQuery>,
) -> ApiResult<Json<ProductView>> {
    let view = if query.include_relations {
        state.products().get_details(id).await?.map(ProductView::Detailed)
    } else {
        state.products().get(id).await?.map(ProductView::Plain)
    };

    view.map(Json).ok_or_else(|| ApiError::not_found("Product"))
}

/// # Errors
///
/// - `404 Not Found`: No such category
pub async fn list_by_category(
    State(state): State<AppState>,
    AppPath(category_id): AppPath<Uuid>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<Product>>> {
    if state.categories().get(category_id).await?.is_none() {
        return Err(ApiError::not_found("Category"));
    }

    let filter = ProductFilter {
        category_id: Some(category_id),
        ..Default::default()
    };
    let products = state.products().list(&filter, page.offset, page.limit).await?;
    Ok(Json(products))
}

/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn list_by_owner(
    State(state): State<AppState>,
    AppPath(owner_id): AppPath<Uuid>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<Product>>> {
    if state.users().get(owner_id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let filter = ProductFilter {
        owner_id: Some(owner_id),
        ..Default::default()
    };
    let products = state.products().list(&filter, page.offset, page.limit).await?;
    Ok(Json(products))
}

/// Case-insensitive substring match on the product name
///
/// `%` and `_` in the term match themselves.
pub async fn search_products(
    State(state): State<AppState>,
    AppPath(term): AppPath<String>,
    AppQuery(page): AppQuery<Pagination>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state
        .products()
        .search_by_name(&term, page.offset, page.limit)
        .await?;
    Ok(Json(products))
}

/// Products priced within `[min, max]`, cheapest first
///
/// # Errors
///
/// - `400 Bad Request`: A negative bound, or `min` above `max`
pub async fn list_by_price_range(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PriceRangeQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state
        .products()
        .by_price_range(query.min, query.max, query.offset, query.limit)
        .await?;
    Ok(Json(products))
}

/// Create a product
///
/// # Endpoint
///
/// ```text
/// POST /v1/products
/// Authorization: Bearer <token>   (optional)
///
/// {
///   "name": "Laptop",
///   "description": "14 inch ultrabook",
///   "price": 999.99,
///   "stock": 5,
///   "category_id": "uuid",
///   "owner_id": "uuid"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid field, or unknown category or owner
pub async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    AppJson(new_product): AppJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state
        .products()
        .create(new_product, actor.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT` and `PATCH`; only the fields present change
pub async fn update_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    actor: Actor,
    AppJson(changes): AppJson<ProductChanges>,
) -> ApiResult<Json<Product>> {
    if state.products().get(id).await?.is_none() {
        return Err(ApiError::not_found("Product"));
    }

    state
        .products()
        .update(id, changes, actor.user_id())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn update_stock(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    actor: Actor,
    AppJson(body): AppJson<StockUpdate>,
) -> ApiResult<Json<Product>> {
    if state.products().get(id).await?.is_none() {
        return Err(ApiError::not_found("Product"));
    }

    state
        .products()
        .update_stock(id, body.stock, actor.user_id())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn delete_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.products().delete(id).await? {
        return Err(ApiError::not_found("Product"));
    }

    Ok(Json(MessageResponse::ok("Product deleted")))
}
