/// In-memory storage backend
///
/// All three tables sit behind one `RwLock`, so every write sees and
/// changes a consistent snapshot. Integrity rules mirror the PostgreSQL
/// schema: case-insensitive unique keys, existing references, cascade on
/// user delete and restrict on category delete.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CategoryStore, ProductStore, Store, UserStore};
use crate::error::{messages, Error, Result};
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, Product, ProductDetails, ProductFilter, UpdateProduct};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    products: HashMap<Uuid, Product>,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.username.eq_ignore_ascii_case(username))
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        let email = email.to_lowercase();
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.to_lowercase() == email)
    }

    fn category_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        let name = name.to_lowercase();
        self.categories
            .values()
            .any(|c| Some(c.id) != except && c.name.to_lowercase() == name)
    }

    fn require_user(&self, id: Uuid) -> Result<()> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::validation(messages::UNKNOWN_USER))
        }
    }

    fn require_category(&self, id: Uuid) -> Result<()> {
        if self.categories.contains_key(&id) {
            Ok(())
        } else {
            Err(Error::validation(messages::UNKNOWN_CATEGORY))
        }
    }
}

/// Sorts by `key`, then applies offset/limit
fn page<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K, offset: i64, limit: i64) -> Vec<T> {
    rows.sort_by_key(key);
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.username_taken(&data.username, None) {
            return Err(Error::validation(messages::DUPLICATE_USERNAME));
        }
        if tables.email_taken(&data.email, None) {
            return Err(Error::validation(messages::DUPLICATE_EMAIL));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            phone: data.phone,
            is_active: true,
            is_admin: data.is_admin,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn user_by_login(&self, login: &str) -> Result<Option<User>> {
        let login = login.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username.to_lowercase() == login || u.email.to_lowercase() == login)
            .cloned())
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let users: Vec<User> = self.tables.read().await.users.values().cloned().collect();
        Ok(page(users, |u| (u.created_at, u.id), offset, limit))
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        let admins: Vec<User> = self
            .tables
            .read()
            .await
            .users
            .values()
            .filter(|u| u.is_admin)
            .cloned()
            .collect();
        Ok(page(admins, |u| (u.created_at, u.id), 0, i64::MAX))
    }

    async fn first_admin(&self) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.is_admin && u.is_active)
            .min_by_key(|u| (u.created_at, u.id))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(username) = &data.username {
            if tables.username_taken(username, Some(id)) {
                return Err(Error::validation(messages::DUPLICATE_USERNAME));
            }
        }
        if let Some(email) = &data.email {
            if tables.email_taken(email, Some(id)) {
                return Err(Error::validation(messages::DUPLICATE_EMAIL));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            user.name = name;
        }
        if let Some(username) = data.username {
            user.username = username;
        }
        if let Some(email) = data.email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(phone) = data.phone {
            user.phone = phone;
        }
        if let Some(is_active) = data.is_active {
            user.is_active = is_active;
        }
        if let Some(is_admin) = data.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = Some(Utc::now());

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        tables.products.retain(|_, p| p.owner_id != id);
        for product in tables.products.values_mut() {
            if product.created_by == Some(id) {
                product.created_by = None;
            }
            if product.updated_by == Some(id) {
                product.updated_by = None;
            }
        }
        for category in tables.categories.values_mut() {
            if category.created_by == Some(id) {
                category.created_by = None;
            }
            if category.updated_by == Some(id) {
                category.updated_by = None;
            }
        }

        Ok(true)
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn insert_category(&self, data: CreateCategory) -> Result<Category> {
        let mut tables = self.tables.write().await;

        if tables.category_name_taken(&data.name, None) {
            return Err(Error::validation(messages::DUPLICATE_CATEGORY));
        }
        if let Some(creator) = data.created_by {
            tables.require_user(creator)?;
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            created_by: data.created_by,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.categories.insert(category.id, category.clone());

        Ok(category)
    }

    async fn category_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let name = name.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .find(|c| c.name.to_lowercase() == name)
            .cloned())
    }

    async fn list_categories(&self, offset: i64, limit: i64) -> Result<Vec<Category>> {
        let categories: Vec<Category> = self.tables.read().await.categories.values().cloned().collect();
        Ok(page(categories, |c| (c.name.to_lowercase(), c.id), offset, limit))
    }

    async fn update_category(&self, id: Uuid, data: UpdateCategory) -> Result<Option<Category>> {
        let mut tables = self.tables.write().await;

        if !tables.categories.contains_key(&id) {
            return Ok(None);
        }
        if let Some(name) = &data.name {
            if tables.category_name_taken(name, Some(id)) {
                return Err(Error::validation(messages::DUPLICATE_CATEGORY));
            }
        }
        if let Some(editor) = data.updated_by {
            tables.require_user(editor)?;
        }

        let Some(category) = tables.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            category.name = name;
        }
        if let Some(description) = data.description {
            category.description = description;
        }
        if let Some(editor) = data.updated_by {
            category.updated_by = Some(editor);
        }
        category.updated_at = Some(Utc::now());

        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;

        if tables.products.values().any(|p| p.category_id == id) {
            return Err(Error::validation(messages::CATEGORY_IN_USE));
        }

        Ok(tables.categories.remove(&id).is_some())
    }

    async fn count_categories(&self) -> Result<i64> {
        Ok(self.tables.read().await.categories.len() as i64)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn insert_product(&self, data: CreateProduct) -> Result<Product> {
        let mut tables = self.tables.write().await;

        tables.require_category(data.category_id)?;
        tables.require_user(data.owner_id)?;
        if let Some(creator) = data.created_by {
            tables.require_user(creator)?;
        }

        let product = Product {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            price: data.price,
            stock: data.stock,
            category_id: data.category_id,
            owner_id: data.owner_id,
            created_by: data.created_by,
            updated_by: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.products.insert(product.id, product.clone());

        Ok(product)
    }

    async fn product_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn product_details(&self, id: Uuid) -> Result<Option<ProductDetails>> {
        let tables = self.tables.read().await;

        let Some(product) = tables.products.get(&id) else {
            return Ok(None);
        };
        let category = tables.categories.get(&product.category_id);
        let owner = tables.users.get(&product.owner_id);

        Ok(category.zip(owner).map(|(category, owner)| ProductDetails {
            product: product.clone(),
            category_name: category.name.clone(),
            owner_username: owner.username.clone(),
        }))
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        let products: Vec<Product> = self
            .tables
            .read()
            .await
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(page(products, |p| (p.created_at, p.id), offset, limit))
    }

    async fn search_products(&self, term: &str, offset: i64, limit: i64) -> Result<Vec<Product>> {
        let term = term.to_lowercase();
        let products: Vec<Product> = self
            .tables
            .read()
            .await
            .products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&term))
            .cloned()
            .collect();
        Ok(page(products, |p| (p.name.to_lowercase(), p.id), offset, limit))
    }

    async fn products_by_price_range(
        &self,
        min: Option<Decimal>,
        max: Option<Decimal>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        let products: Vec<Product> = self
            .tables
            .read()
            .await
            .products
            .values()
            .filter(|p| min.map_or(true, |m| p.price >= m) && max.map_or(true, |m| p.price <= m))
            .cloned()
            .collect();
        Ok(page(products, |p| (p.price, p.id), offset, limit))
    }

    async fn update_product(&self, id: Uuid, data: UpdateProduct) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;

        if !tables.products.contains_key(&id) {
            return Ok(None);
        }
        if let Some(category_id) = data.category_id {
            tables.require_category(category_id)?;
        }
        if let Some(owner_id) = data.owner_id {
            tables.require_user(owner_id)?;
        }
        if let Some(editor) = data.updated_by {
            tables.require_user(editor)?;
        }

        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            product.name = name;
        }
        if let Some(description) = data.description {
            product.description = description;
        }
        if let Some(price) = data.price {
            product.price = price;
        }
        if let Some(stock) = data.stock {
            product.stock = stock;
        }
        if let Some(category_id) = data.category_id {
            product.category_id = category_id;
        }
        if let Some(owner_id) = data.owner_id {
            product.owner_id = owner_id;
        }
        if let Some(is_active) = data.is_active {
            product.is_active = is_active;
        }
        if let Some(editor) = data.updated_by {
            product.updated_by = Some(editor);
        }
        product.updated_at = Some(Utc::now());

        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn count_products(&self) -> Result<i64> {
        Ok(self.tables.read().await.products.len() as i64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
