/// Category operations

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::resolve_editor;
use crate::error::{messages, Error, Result};
use crate::models::category::{Category, CategoryChanges, CreateCategory, NewCategory, UpdateCategory};
use crate::store::Store;
use crate::validation::{clamp_pagination, normalize_description, validate_category_name};

#[derive(Clone)]
pub struct CategoryRepository {
    store: Arc<dyn Store>,
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a category attributed to `actor`, or to the first admin
    ///
    /// # Errors
    ///
    /// `Error::Validation` for a bad or duplicate name, or when there is
    /// neither an actor nor an administrator to attribute it to.
    pub async fn create(&self, new: NewCategory, actor: Option<Uuid>) -> Result<Category> {
        let name = validate_category_name(&new.name)?;
        let description = normalize_description(new.description.as_deref());

        if self.store.category_by_name(&name).await?.is_some() {
            return Err(Error::validation(messages::DUPLICATE_CATEGORY));
        }

        let created_by = resolve_editor(self.store.as_ref(), actor).await?;

        let category = self
            .store
            .insert_category(CreateCategory {
                name,
                description,
                created_by: Some(created_by),
            })
            .await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Category>> {
        self.store.category_by_id(id).await
    }

    /// Case-insensitive lookup by name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.store.category_by_name(name.trim()).await
    }

    pub async fn list(&self, offset: Option<i64>, limit: Option<i64>) -> Result<Vec<Category>> {
        let (offset, limit) = clamp_pagination(offset, limit);
        self.store.list_categories(offset, limit).await
    }

    pub async fn count(&self) -> Result<i64> {
        self.store.count_categories().await
    }

    /// Applies a partial update attributed to `actor`, or to the first admin
    pub async fn update(
        &self,
        id: Uuid,
        changes: CategoryChanges,
        actor: Option<Uuid>,
    ) -> Result<Option<Category>> {
        let Some(current) = self.store.category_by_id(id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(current));
        }

        let mut update = UpdateCategory::default();

        if let Some(name) = &changes.name {
            let name = validate_category_name(name)?;
            if let Some(other) = self.store.category_by_name(&name).await? {
                if other.id != id {
                    return Err(Error::validation(messages::DUPLICATE_CATEGORY));
                }
            }
            update.name = Some(name);
        }
        if let Some(description) = &changes.description {
            update.description = Some(normalize_description(Some(description)));
        }

        update.updated_by = Some(resolve_editor(self.store.as_ref(), actor).await?);

        let updated = self.store.update_category(id, update).await?;
        debug!(category_id = %id, "Category updated");
        Ok(updated)
    }

    /// Deletes a category that no product uses
    ///
    /// # Errors
    ///
    /// `Error::Validation` while products still belong to it.
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.store.delete_category(id).await?;
        if deleted {
            info!(category_id = %id, "Category deleted");
        }
        Ok(deleted)
    }
}
