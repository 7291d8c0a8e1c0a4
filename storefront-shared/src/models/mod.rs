/// Database models for the storefront catalog
///
/// Each model owns its SQL: the `impl` blocks take a `&PgPool` and return
/// raw `sqlx::Error`s. Validation and error mapping happen above this layer.
///
/// # Models
///
/// - `user`: accounts, credentials and the admin flag
/// - `category`: product categories with audit columns
/// - `product`: catalog entries tied to a category and an owning user
///
/// # Example
///
/// ```no_run
/// use storefront_shared::models::category::{Category, CreateCategory};
/// use storefront_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let category = Category::create(&pool, CreateCategory {
///     name: "Electronics".to_string(),
///     description: None,
///     created_by: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod category;
pub mod product;
pub mod user;
