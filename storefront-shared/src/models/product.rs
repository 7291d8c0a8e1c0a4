/// Product model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY,
///     name VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     price NUMERIC(10, 2) NOT NULL CHECK (price > 0),
///     stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
///     category_id UUID NOT NULL REFERENCES categories (id) ON DELETE RESTRICT,
///     owner_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
///     created_by UUID REFERENCES users (id) ON DELETE SET NULL,
///     updated_by UUID REFERENCES users (id) ON DELETE SET NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use storefront_shared::models::product::{Product, ProductFilter};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, category_id: Uuid) -> Result<(), sqlx::Error> {
/// let filter = ProductFilter {
///     category_id: Some(category_id),
///     ..Default::default()
/// };
///
/// for product in Product::list(&pool, &filter, 20, 0).await? {
///     println!("{} {}", product.name, product.price);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, category_id, owner_id, \
                               created_by, updated_by, is_active, created_at, updated_at";

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,

    /// Two fractional digits, always positive
    pub price: Decimal,

    pub stock: i32,
    pub category_id: Uuid,

    /// Owning user; deleting the owner deletes the product
    pub owner_id: Uuid,

    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A product with its category name and owner username
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
    pub owner_username: String,
}

/// Validated input for inserting a product
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Uuid,
    pub owner_id: Uuid,
    pub created_by: Option<Uuid>,
}

/// Validated partial update
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub updated_by: Option<Uuid>,
}

/// Raw input for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub category_id: Uuid,
    pub owner_id: Uuid,
}

/// Raw partial update of a product
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category_id.is_none()
            && self.owner_id.is_none()
            && self.is_active.is_none()
    }
}

/// Optional list filters; `None` matches everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

impl ProductFilter {
    /// Whether a product passes every set filter
    pub fn matches(&self, product: &Product) -> bool {
        self.category_id.map_or(true, |id| product.category_id == id)
            && self.owner_id.map_or(true, |id| product.owner_id == id)
            && self.is_active.map_or(true, |active| product.is_active == active)
    }
}

/// Escapes `%`, `_` and `\` so a search term matches literally inside LIKE
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Product {
    /// Inserts a new product
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if the category, owner or creator
    /// does not exist.
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, description, price, stock, category_id, owner_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.description)
        .bind(data.price)
        .bind(data.stock)
        .bind(data.category_id)
        .bind(data.owner_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Loads a product joined with its category and owner
    pub async fn find_details(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<ProductDetails>, sqlx::Error> {
        sqlx::query_as::<_, ProductDetails>(
            r#"
            SELECT p.id, p.name, p.description, p.price, p.stock, p.category_id, p.owner_id,
                   p.created_by, p.updated_by, p.is_active, p.created_at, p.updated_at,
                   c.name AS category_name,
                   u.username AS owner_username
            FROM products p
            JOIN categories c ON c.id = p.category_id
            JOIN users u ON u.id = p.owner_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Lists products matching `filter`, oldest first
    pub async fn list(
        pool: &PgPool,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1::UUID IS NULL OR category_id = $1)
              AND ($2::UUID IS NULL OR owner_id = $2)
              AND ($3::BOOLEAN IS NULL OR is_active = $3)
            ORDER BY created_at, id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.category_id)
        .bind(filter.owner_id)
        .bind(filter.is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Case-insensitive substring search on the product name
    pub async fn search_by_name(
        pool: &PgPool,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY LOWER(name), id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(format!("%{}%", escape_like(term)))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Products priced within `[min, max]`; a missing bound is open
    pub async fn by_price_range(
        pool: &PgPool,
        min: Option<Decimal>,
        max: Option<Decimal>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1::NUMERIC IS NULL OR price >= $1)
              AND ($2::NUMERIC IS NULL OR price <= $2)
            ORDER BY price, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(min)
        .bind(max)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Updates an existing product and stamps `updated_at`
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 1;

        for (column, present) in [
            ("name", data.name.is_some()),
            ("description", data.description.is_some()),
            ("price", data.price.is_some()),
            ("stock", data.stock.is_some()),
            ("category_id", data.category_id.is_some()),
            ("owner_id", data.owner_id.is_some()),
            ("is_active", data.is_active.is_some()),
            ("updated_by", data.updated_by.is_some()),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Product>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(price) = data.price {
            q = q.bind(price);
        }
        if let Some(stock) = data.stock {
            q = q.bind(stock);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }
        if let Some(owner_id) = data.owner_id {
            q = q.bind(owner_id);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }
        if let Some(updated_by) = data.updated_by {
            q = q.bind(updated_by);
        }

        q.fetch_optional(pool).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
