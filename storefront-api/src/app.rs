/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use storefront_api::{app::{build_router, AppState}, config::Config};
/// use storefront_shared::db::pool::{create_pool, DatabaseConfig};
/// use storefront_shared::store::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig::from_url(config.database.url.clone())).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use storefront_shared::repository::{CategoryRepository, ProductRepository, UserRepository};
use storefront_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Everything inside is reference counted, so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend shared by the repositories
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,

    users: UserRepository,
    categories: CategoryRepository,
    products: ProductRepository,
}

impl AppState {
    /// Creates new application state over any storage backend
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            users: UserRepository::new(store.clone()),
            categories: CategoryRepository::new(store.clone()),
            products: ProductRepository::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn categories(&self) -> &CategoryRepository {
        &self.categories
    }

    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check
/// └── /v1/
///     ├── /auth/
///     │   ├── POST /login
///     │   ├── POST /bootstrap-admin
///     │   ├── GET  /verify/:id
///     │   └── GET  /status
///     ├── /users/
///     │   ├── GET, POST  /
///     │   ├── GET        /admins
///     │   ├── GET        /email/:email
///     │   ├── GET        /username/:username
///     │   ├── GET, PUT, PATCH, DELETE /:id
///     │   ├── GET        /:id/is-admin
///     │   ├── PATCH      /:id/deactivate
///     │   └── POST       /:id/change-password
///     ├── /categories/
///     │   ├── GET, POST  /
///     │   ├── GET        /name/:name
///     │   └── GET, PUT, PATCH, DELETE /:id
///     └── /products/
///         ├── GET, POST  /
///         ├── GET        /category/:id
///         ├── GET        /owner/:id
///         ├── GET        /search/:term
///         ├── GET        /price-range
///         ├── GET, PUT, PATCH, DELETE /:id
///         └── PATCH      /:id/stock
/// ```
///
/// Write routes read an optional `Authorization: Bearer <token>` through the
/// [`Actor`](crate::middleware::auth::Actor) extractor.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, categories, health, products, users};

    let health_routes = Router::new().route("/health", get(health::health_check));

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/bootstrap-admin", post(auth::bootstrap_admin))
        .route("/verify/:id", get(auth::verify_user))
        .route("/status", get(auth::auth_status));

    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/admins", get(users::list_admins))
        .route("/email/:email", get(users::get_user_by_email))
        .route("/username/:username", get(users::get_user_by_username))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/:id/is-admin", get(users::is_admin))
        .route("/:id/deactivate", patch(users::deactivate_user))
        .route("/:id/change-password", post(users::change_password));

    let category_routes = Router::new()
        .route("/", get(categories::list_categories).post(categories::create_category))
        .route("/name/:name", get(categories::get_category_by_name))
        .route(
            "/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        );

    let product_routes = Router::new()
        .route("/", get(products::list_products).post(products::create_product))
        .route("/category/:id", get(products::list_by_category))
        .route("/owner/:id", get(products::list_by_owner))
        .route("/search/:term", get(products::search_products))
        .route("/price-range", get(products::list_by_price_range))
        .route(
            "/:id",
            get(products::get_product)
                .put(products::update_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/:id/stock", patch(products::update_stock));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/categories", category_routes)
        .nest("/products", product_routes);

    let cors = if state.config.allows_any_origin() {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
