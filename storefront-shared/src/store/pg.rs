/// PostgreSQL storage backend
///
/// Thin adapter from the store traits onto the model methods. Every call
/// borrows one pooled connection for a single statement and hands it back
/// when the call returns, whatever the outcome.
///
/// Integrity is left to the schema: unique indexes and foreign keys reject
/// bad writes and the resulting database errors are translated here into
/// the same validation messages the in-memory backend produces.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{CategoryStore, ProductStore, Store, UserStore};
use crate::db::pool::health_check;
use crate::error::{messages, Error, Result};
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, Product, ProductDetails, ProductFilter, UpdateProduct};
use crate::models::user::{CreateUser, UpdateUser, User};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Message for a constraint violation we know how to explain
fn constraint_message(code: &str, constraint: &str) -> Option<&'static str> {
    match (code, constraint) {
        (UNIQUE_VIOLATION, "users_username_key") => Some(messages::DUPLICATE_USERNAME),
        (UNIQUE_VIOLATION, "users_email_key") => Some(messages::DUPLICATE_EMAIL),
        (UNIQUE_VIOLATION, "categories_name_key") => Some(messages::DUPLICATE_CATEGORY),
        (FOREIGN_KEY_VIOLATION, "products_category_id_fkey") => Some(messages::UNKNOWN_CATEGORY),
        (FOREIGN_KEY_VIOLATION, _) => Some(messages::UNKNOWN_USER),
        (CHECK_VIOLATION, "products_price_check") => Some("Price must be greater than 0"),
        (CHECK_VIOLATION, "products_stock_check") => Some("Stock cannot be negative"),
        _ => None,
    }
}

/// Turns constraint violations into validation errors; anything else stays
/// a database error
fn map_db_error(err: sqlx::Error) -> Error {
    let message = err.as_database_error().and_then(|db_err| {
        let code = db_err.code()?;
        let constraint = db_err.constraint()?;
        constraint_message(&code, constraint)
    });

    match message {
        Some(message) => {
            debug!(error = %err, "Constraint violation mapped to validation error");
            Error::validation(message)
        }
        None => Error::Database(err),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User> {
        User::create(&self.pool, data).await.map_err(map_db_error)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn user_by_login(&self, login: &str) -> Result<Option<User>> {
        Ok(User::find_by_login(&self.pool, login).await?)
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        Ok(User::list(&self.pool, limit, offset).await?)
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        Ok(User::list_admins(&self.pool).await?)
    }

    async fn first_admin(&self) -> Result<Option<User>> {
        Ok(User::first_admin(&self.pool).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>> {
        User::update(&self.pool, id, data).await.map_err(map_db_error)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        Ok(User::delete(&self.pool, id).await?)
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(User::count(&self.pool).await?)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn insert_category(&self, data: CreateCategory) -> Result<Category> {
        Category::create(&self.pool, data).await.map_err(map_db_error)
    }

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(Category::find_by_id(&self.pool, id).await?)
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(Category::find_by_name(&self.pool, name).await?)
    }

    async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>> {
        Ok(Category::list(&self.pool, limit, offset).await?)
    }

    async fn update_category(&self, id: Uuid, data: UpdateCategory) -> Result<Option<Category>> {
        Category::update(&self.pool, id, data).await.map_err(map_db_error)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        Category::delete(&self.pool, id).await.map_err(|err| {
            // Here a foreign key violation comes from products still pointing at the row
            let in_use = err
                .as_database_error()
                .and_then(|db_err| db_err.code())
                .is_some_and(|code| code == FOREIGN_KEY_VIOLATION);

            if in_use {
                Error::validation(messages::CATEGORY_IN_USE)
            } else {
                Error::Database(err)
            }
        })
    }

    async fn count_categories(&self) -> Result<i64> {
        Ok(Category::count(&self.pool).await?)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn insert_product(&self, data: CreateProduct) -> Result<Product> {
        Product::create(&self.pool, data).await.map_err(map_db_error)
    }

    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(Product::find_by_id(&self.pool, id).await?)
    }

    async fn product_details(&self, id: Uuid) -> Result<Option<ProductDetails>> {
        Ok(Product::find_details(&self.pool, id).await?)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        Ok(Product::list(&self.pool, filter, limit, offset).await?)
    }

    async fn search_products(&self, term: &str, offset: i64, limit: i64) -> Result<Vec<Product>> {
        Ok(Product::search_by_name(&self.pool, term, limit, offset).await?)
    }

    async fn products_by_price_range(
        &self,
        min: Option<Decimal>,
        max: Option<Decimal>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        Ok(Product::by_price_range(&self.pool, min, max, limit, offset).await?)
    }

    async fn update_product(&self, id: Uuid, data: UpdateProduct) -> Result<Option<Product>> {
        Product::update(&self.pool, id, data).await.map_err(map_db_error)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(Product::delete(&self.pool, id).await?)
    }

    async fn count_products(&self) -> Result<i64> {
        Ok(Product::count(&self.pool).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_messages() {
        assert_eq!(
            constraint_message(UNIQUE_VIOLATION, "users_email_key"),
            Some(messages::DUPLICATE_EMAIL)
        );
        assert_eq!(
            constraint_message(UNIQUE_VIOLATION, "users_username_key"),
            Some(messages::DUPLICATE_USERNAME)
        );
        assert_eq!(
            constraint_message(UNIQUE_VIOLATION, "categories_name_key"),
            Some(messages::DUPLICATE_CATEGORY)
        );
        assert_eq!(
            constraint_message(FOREIGN_KEY_VIOLATION, "products_category_id_fkey"),
            Some(messages::UNKNOWN_CATEGORY)
        );
        assert_eq!(
            constraint_message(FOREIGN_KEY_VIOLATION, "products_owner_id_fkey"),
            Some(messages::UNKNOWN_USER)
        );
        assert_eq!(constraint_message("40001", "anything"), None);
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        assert!(matches!(
            map_db_error(sqlx::Error::RowNotFound),
            Error::Database(_)
        ));
    }
}
