/// Repositories: the business rules of the catalog
///
/// Each repository validates and normalizes caller input, checks the
/// cross-entity rules (uniqueness, references, who edited what) and then
/// calls the [`Store`]. Lookups that find nothing return `Ok(None)`;
/// rule violations return [`crate::error::Error::Validation`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use storefront_shared::models::category::NewCategory;
/// use storefront_shared::repository::{CategoryRepository, UserRepository};
/// use storefront_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> storefront_shared::error::Result<()> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
///
/// // Categories need an administrator to attribute the change to
/// UserRepository::new(store.clone()).ensure_default_admin().await?;
///
/// let category = CategoryRepository::new(store)
///     .create(NewCategory { name: "Electronics".into(), description: None }, None)
///     .await?;
/// assert_eq!(category.name, "Electronics");
/// # Ok(())
/// # }
/// ```

mod category;
mod product;
mod user;

pub use category::CategoryRepository;
pub use product::ProductRepository;
pub use user::{AdminBootstrap, UserRepository, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_USERNAME};

use tracing::warn;
use uuid::Uuid;

use crate::error::{messages, Error, Result};
use crate::store::Store;

/// Picks the user an audited change is attributed to
///
/// The acting user if one is given and is an active account, otherwise the oldest
/// active administrator.
async fn resolve_editor(store: &dyn Store, actor: Option<Uuid>) -> Result<Uuid> {
    if let Some(actor_id) = actor {
        match store.user_by_id(actor_id).await? {
            Some(user) if user.is_active => return Ok(actor_id),
            Some(_) => {
                warn!(actor_id = %actor_id, "Acting user is inactive, falling back to first admin")
            }
            None => {
                warn!(actor_id = %actor_id, "Acting user not found, falling back to first admin")
            }
        }
    }

    store
        .first_admin()
        .await?
        .map(|admin| admin.id)
        .ok_or_else(|| Error::validation(messages::NO_ADMIN))
}
