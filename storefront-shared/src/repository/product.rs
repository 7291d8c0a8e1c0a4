/// Product operations

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use super::resolve_editor;
use crate::error::{messages, Error, Result};
use crate::models::product::{
    CreateProduct, NewProduct, Product, ProductChanges, ProductDetails, ProductFilter,
    UpdateProduct,
};
use crate::store::Store;
use crate::validation::{
    clamp_pagination, validate_price, validate_price_range, validate_product_description,
    validate_product_name, validate_stock,
};

#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn Store>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn require_category(&self, id: Uuid) -> Result<()> {
        match self.store.category_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(Error::validation(messages::UNKNOWN_CATEGORY)),
        }
    }

    async fn require_user(&self, id: Uuid) -> Result<()> {
        match self.store.user_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(Error::validation(messages::UNKNOWN_USER)),
        }
    }

    /// Creates a product
    ///
    /// `created_by` is the acting user when given and active, otherwise the
    /// owner.
    ///
    /// # Errors
    ///
    /// `Error::Validation` for a bad field or an unknown category or owner.
    pub async fn create(&self, new: NewProduct, actor: Option<Uuid>) -> Result<Product> {
        let name = validate_product_name(&new.name)?;
        let description = validate_product_description(&new.description)?;
        let price = validate_price(new.price)?;
        let stock = validate_stock(new.stock)?;

        self.require_category(new.category_id).await?;
        self.require_user(new.owner_id).await?;

        let mut created_by = new.owner_id;
        if let Some(actor_id) = actor {
            if let Some(actor) = self.store.user_by_id(actor_id).await? {
                if actor.is_active {
                    created_by = actor_id;
                }
            }
        }

        let product = self
            .store
            .insert_product(CreateProduct {
                name,
                description,
                price,
                stock,
                category_id: new.category_id,
                owner_id: new.owner_id,
                created_by: Some(created_by),
            })
            .await?;

        info!(
            product_id = %product.id,
            category_id = %product.category_id,
            owner_id = %product.owner_id,
            "Product created"
        );
        Ok(product)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Product>> {
        self.store.product_by_id(id).await
    }

    /// The product with its category name and owner username
    pub async fn get_details(&self, id: Uuid) -> Result<Option<ProductDetails>> {
        self.store.product_details(id).await
    }

    pub async fn list(
        &self,
        filter: &ProductFilter,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Product>> {
        let (offset, limit) = clamp_pagination(offset, limit);
        self.store.list_products(filter, offset, limit).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.store.count_products().await
    }

    /// Case-insensitive substring match on the name
    ///
    /// # Errors
    ///
    /// `Error::Validation` for a blank term.
    pub async fn search_by_name(
        &self,
        term: &str,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Product>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(Error::validation("Search term is required"));
        }

        let (offset, limit) = clamp_pagination(offset, limit);
        self.store.search_products(term, offset, limit).await
    }

    /// Products priced within `[min, max]`; either bound may be left open
    pub async fn by_price_range(
        &self,
        min: Option<Decimal>,
        max: Option<Decimal>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Product>> {
        let (min, max) = validate_price_range(min, max)?;
        let (offset, limit) = clamp_pagination(offset, limit);
        self.store
            .products_by_price_range(min, max, offset, limit)
            .await
    }

    /// Applies a partial update attributed to `actor`, or to the first admin
    ///
    /// An empty change set returns the product untouched.
    pub async fn update(
        &self,
        id: Uuid,
        changes: ProductChanges,
        actor: Option<Uuid>,
    ) -> Result<Option<Product>> {
        let Some(current) = self.store.product_by_id(id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(current));
        }

        let mut update = UpdateProduct {
            is_active: changes.is_active,
            ..Default::default()
        };

        if let Some(name) = &changes.name {
            update.name = Some(validate_product_name(name)?);
        }
        if let Some(description) = &changes.description {
            update.description = Some(validate_product_description(description)?);
        }
        if let Some(price) = changes.price {
            update.price = Some(validate_price(price)?);
        }
        if let Some(stock) = changes.stock {
            update.stock = Some(validate_stock(stock)?);
        }
        if let Some(category_id) = changes.category_id {
            self.require_category(category_id).await?;
            update.category_id = Some(category_id);
        }
        if let Some(owner_id) = changes.owner_id {
            self.require_user(owner_id).await?;
            update.owner_id = Some(owner_id);
        }

        update.updated_by = Some(resolve_editor(self.store.as_ref(), actor).await?);

        let updated = self.store.update_product(id, update).await?;
        debug!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Sets the stock level
    pub async fn update_stock(
        &self,
        id: Uuid,
        stock: i32,
        actor: Option<Uuid>,
    ) -> Result<Option<Product>> {
        let changes = ProductChanges {
            stock: Some(stock),
            ..Default::default()
        };
        self.update(id, changes, actor).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.store.delete_product(id).await?;
        if deleted {
            info!(product_id = %id, "Product deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::NewCategory;
    use crate::models::user::NewUser;
    use crate::repository::{CategoryRepository, UserRepository};
    use crate::store::MemoryStore;

    struct Fixture {
        users: UserRepository,
        categories: CategoryRepository,
        products: ProductRepository,
        admin_id: Uuid,
        owner_id: Uuid,
        category_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let users = UserRepository::new(store.clone());
        let categories = CategoryRepository::new(store.clone());
        let products = ProductRepository::new(store);

        let admin_id = users.ensure_default_admin().await.unwrap().user.id;
        let owner_id = users
            .create(NewUser {
                name: "Alice".to_string(),
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "Str0ng!Pass".to_string(),
                phone: None,
                is_admin: false,
            })
            .await
            .unwrap()
            .id;
        let category_id = categories
            .create(
                NewCategory {
                    name: "Electronics".to_string(),
                    description: None,
                },
                None,
            )
            .await
            .unwrap()
            .id;

        Fixture {
            users,
            categories,
            products,
            admin_id,
            owner_id,
            category_id,
        }
    }

    fn laptop(fx: &Fixture) -> NewProduct {
        NewProduct {
            name: "Laptop".to_string(),
            description: "14 inch ultrabook".to_string(),
            price: Decimal::new(99999, 2),
            stock: 5,
            category_id: fx.category_id,
            owner_id: fx.owner_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_details() {
        let fx = fixture().await;
        let product = fx.products.create(laptop(&fx), None).await.unwrap();

        assert_eq!(product.created_by, Some(fx.owner_id));
        assert!(product.is_active);

        let details = fx.products.get_details(product.id).await.unwrap().unwrap();
        assert_eq!(details.product.name, "Laptop");
        assert_eq!(details.product.price, Decimal::new(99999, 2));
        assert_eq!(details.product.stock, 5);
        assert_eq!(details.category_name, "Electronics");
        assert_eq!(details.owner_username, "alice");
    }

    #[tokio::test]
    async fn test_actor_becomes_creator() {
        let fx = fixture().await;
        let product = fx.products.create(laptop(&fx), Some(fx.admin_id)).await.unwrap();
        assert_eq!(product.created_by, Some(fx.admin_id));
    }

    #[tokio::test]
    async fn test_inactive_actor_is_not_recorded() {
        let fx = fixture().await;
        let bob = fx
            .users
            .create(NewUser {
                name: "Bob".to_string(),
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password: "Str0ng!Pass".to_string(),
                phone: None,
                is_admin: false,
            })
            .await
            .unwrap();
        fx.users.deactivate(bob.id).await.unwrap();

        let product = fx.products.create(laptop(&fx), Some(bob.id)).await.unwrap();
        assert_eq!(product.created_by, Some(fx.owner_id));

        let changes = ProductChanges {
            stock: Some(7),
            ..Default::default()
        };
        let updated = fx
            .products
            .update(product.id, changes, Some(bob.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.updated_by, Some(fx.admin_id));
    }

    #[tokio::test]
    async fn test_price_and_stock_boundaries() {
        let fx = fixture().await;

        let cheapest = NewProduct {
            price: Decimal::new(1, 2),
            stock: 0,
            ..laptop(&fx)
        };
        assert!(fx.products.create(cheapest, None).await.is_ok());

        let free = NewProduct {
            price: Decimal::ZERO,
            ..laptop(&fx)
        };
        assert!(fx.products.create(free, None).await.unwrap_err().is_validation());

        let sub_cent = NewProduct {
            price: Decimal::new(12345, 3),
            ..laptop(&fx)
        };
        let err = fx.products.create(sub_cent, None).await.unwrap_err();
        assert!(err.to_string().contains("at most 2 decimal places"));

        let negative_stock = NewProduct {
            stock: -1,
            ..laptop(&fx)
        };
        assert!(fx
            .products
            .create(negative_stock, None)
            .await
            .unwrap_err()
            .is_validation());
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let fx = fixture().await;

        let no_category = NewProduct {
            category_id: Uuid::new_v4(),
            ..laptop(&fx)
        };
        let err = fx.products.create(no_category, None).await.unwrap_err();
        assert_eq!(err.to_string(), messages::UNKNOWN_CATEGORY);

        let no_owner = NewProduct {
            owner_id: Uuid::new_v4(),
            ..laptop(&fx)
        };
        let err = fx.products.create(no_owner, None).await.unwrap_err();
        assert_eq!(err.to_string(), messages::UNKNOWN_USER);
    }

    #[tokio::test]
    async fn test_field_validation() {
        let fx = fixture().await;

        let long_name = NewProduct {
            name: "x".repeat(201),
            ..laptop(&fx)
        };
        assert!(fx.products.create(long_name, None).await.is_err());

        let no_description = NewProduct {
            description: "  ".to_string(),
            ..laptop(&fx)
        };
        assert!(fx.products.create(no_description, None).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_empty_update() {
        let fx = fixture().await;
        let product = fx.products.create(laptop(&fx), None).await.unwrap();

        let same = fx
            .products
            .update(product.id, ProductChanges::default(), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.updated_at, None);
        assert_eq!(same.price, product.price);

        let updated = fx
            .products
            .update(
                product.id,
                ProductChanges {
                    price: Some(Decimal::new(89900, 2)),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, Decimal::new(89900, 2));
        assert_eq!(updated.updated_by, Some(fx.admin_id));
        assert!(updated.updated_at.is_some());

        let err = fx
            .products
            .update(
                product.id,
                ProductChanges {
                    category_id: Some(Uuid::new_v4()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), messages::UNKNOWN_CATEGORY);
    }

    #[tokio::test]
    async fn test_update_stock() {
        let fx = fixture().await;
        let product = fx.products.create(laptop(&fx), None).await.unwrap();

        let updated = fx
            .products
            .update_stock(product.id, 42, Some(fx.owner_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.stock, 42);
        assert_eq!(updated.updated_by, Some(fx.owner_id));

        assert!(fx
            .products
            .update_stock(product.id, -3, None)
            .await
            .unwrap_err()
            .is_validation());
        assert!(fx
            .products
            .update_stock(Uuid::new_v4(), 1, None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_search_and_filters() {
        let fx = fixture().await;
        fx.products.create(laptop(&fx), None).await.unwrap();
        fx.products
            .create(
                NewProduct {
                    name: "Gaming LAPTOP stand".to_string(),
                    price: Decimal::new(2500, 2),
                    ..laptop(&fx)
                },
                None,
            )
            .await
            .unwrap();
        fx.products
            .create(
                NewProduct {
                    name: "Mouse".to_string(),
                    price: Decimal::new(1999, 2),
                    ..laptop(&fx)
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(fx.products.search_by_name("laptop", None, None).await.unwrap().len(), 2);
        assert!(fx.products.search_by_name("  ", None, None).await.is_err());

        let mid = fx
            .products
            .by_price_range(Some(Decimal::new(1999, 2)), Some(Decimal::new(2500, 2)), None, None)
            .await
            .unwrap();
        assert_eq!(mid.len(), 2);
        assert!(fx
            .products
            .by_price_range(Some(Decimal::TEN), Some(Decimal::ONE), None, None)
            .await
            .is_err());

        let by_owner = ProductFilter {
            owner_id: Some(fx.owner_id),
            ..Default::default()
        };
        assert_eq!(fx.products.list(&by_owner, None, None).await.unwrap().len(), 3);

        let inactive = ProductFilter {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(fx.products.list(&inactive, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let fx = fixture().await;
        let product = fx.products.create(laptop(&fx), None).await.unwrap();

        let err = fx.categories.delete(fx.category_id).await.unwrap_err();
        assert_eq!(err.to_string(), messages::CATEGORY_IN_USE);

        assert!(fx.users.delete(fx.owner_id).await.unwrap());
        assert!(fx.products.get(product.id).await.unwrap().is_none());
        assert!(fx.categories.delete(fx.category_id).await.unwrap());
    }
}
