/// Persistence interface
///
/// The repositories talk to storage only through these traits, so the same
/// business rules run over PostgreSQL ([`PgStore`]) in production and over
/// plain maps ([`MemoryStore`]) in tests.
///
/// Both backends enforce the same integrity rules (unique usernames, emails
/// and category names; existing category/owner references; cascade on user
/// delete; no delete of a category in use) and report violations as
/// [`crate::error::Error::Validation`] with the messages in
/// [`crate::error::messages`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use storefront_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> storefront_shared::error::Result<()> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// store.ping().await?;
/// assert_eq!(store.backend(), "memory");
/// # Ok(())
/// # }
/// ```

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, Product, ProductDetails, ProductFilter, UpdateProduct};
use crate::models::user::{CreateUser, UpdateUser, User};

/// User persistence
///
/// String lookups are case-insensitive.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, data: CreateUser) -> Result<User>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Matches either the username or the email
    async fn user_by_login(&self, login: &str) -> Result<Option<User>>;
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    async fn list_admins(&self) -> Result<Vec<User>>;
    /// Oldest active administrator
    async fn first_admin(&self) -> Result<Option<User>>;
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>>;
    /// Also deletes the user's products and clears audit references to them
    async fn delete_user(&self, id: Uuid) -> Result<bool>;
    async fn count_users(&self) -> Result<i64>;
}

/// Category persistence
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert_category(&self, data: CreateCategory) -> Result<Category>;
    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>>;
    async fn category_by_name(&self, name: &str) -> Result<Option<Category>>;
    async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>>;
    async fn update_category(&self, id: Uuid, data: UpdateCategory) -> Result<Option<Category>>;
    /// Fails with a validation error while products reference the category
    async fn delete_category(&self, id: Uuid) -> Result<bool>;
    async fn count_categories(&self) -> Result<i64>;
}

/// Product persistence
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, data: CreateProduct) -> Result<Product>;
    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>>;
    async fn product_details(&self, id: Uuid) -> Result<Option<ProductDetails>>;
    async fn list_products(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>>;
    async fn search_products(&self, term: &str, offset: i64, limit: i64) -> Result<Vec<Product>>;
    async fn products_by_price_range(
        &self,
        min: Option<Decimal>,
        max: Option<Decimal>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>>;
    async fn update_product(&self, id: Uuid, data: UpdateProduct) -> Result<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> Result<bool>;
    async fn count_products(&self) -> Result<i64>;
}

/// A complete storage backend
#[async_trait]
pub trait Store: UserStore + CategoryStore + ProductStore {
    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<()>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}
