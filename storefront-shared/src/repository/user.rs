/// User accounts: registration, lookups, login and profile changes

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{
    generate_secure_password, hash_password, validate_password_strength, verify_password,
};
use crate::error::{messages, Error, Result};
use crate::models::user::{CreateUser, NewUser, UpdateUser, User, UserChanges};
use crate::store::Store;
use crate::validation::{
    clamp_pagination, normalize_email, validate_email, validate_person_name, validate_phone,
    validate_username,
};

/// Email of the bootstrap administrator
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@system.com";
/// Username of the bootstrap administrator
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_NAME: &str = "System Administrator";
const GENERATED_PASSWORD_LENGTH: usize = 12;

/// Outcome of [`UserRepository::ensure_default_admin`]
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub user: User,

    /// Plaintext password, present only on the call that created the admin
    pub temporary_password: Option<String>,
}

impl AdminBootstrap {
    /// Whether this call created the administrator
    pub fn created(&self) -> bool {
        self.temporary_password.is_some()
    }
}

/// User account operations
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn Store>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Registers a user
    ///
    /// # Errors
    ///
    /// `Error::Validation` for a malformed field, a weak password or a
    /// username/email that is already taken.
    pub async fn create(&self, new: NewUser) -> Result<User> {
        let name = validate_person_name(&new.name)?;
        let username = validate_username(&new.username)?;
        let email = validate_email(&new.email)?;
        let phone = validate_phone(new.phone.as_deref())?;
        validate_password_strength(&new.password).map_err(Error::Validation)?;

        if self.store.user_by_username(&username).await?.is_some() {
            return Err(Error::validation(messages::DUPLICATE_USERNAME));
        }
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(Error::validation(messages::DUPLICATE_EMAIL));
        }

        let password_hash = hash_password(&new.password)?;

        let user = self
            .store
            .insert_user(CreateUser {
                name,
                username,
                email,
                password_hash,
                phone,
                is_admin: new.is_admin,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, is_admin = user.is_admin, "User created");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.store.user_by_id(id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.store.user_by_email(&normalize_email(email)).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.store
            .user_by_username(&username.trim().to_ascii_lowercase())
            .await
    }

    /// Lists users; the limit is clamped to `1..=100`
    pub async fn list(&self, offset: Option<i64>, limit: Option<i64>) -> Result<Vec<User>> {
        let (offset, limit) = clamp_pagination(offset, limit);
        self.store.list_users(offset, limit).await
    }

    pub async fn list_admins(&self) -> Result<Vec<User>> {
        self.store.list_admins().await
    }

    /// The user's admin flag, or `None` if there is no such user
    pub async fn is_admin(&self, id: Uuid) -> Result<Option<bool>> {
        Ok(self.store.user_by_id(id).await?.map(|user| user.is_admin))
    }

    pub async fn count(&self) -> Result<i64> {
        self.store.count_users().await
    }

    /// Checks a login (username or email) and password
    ///
    /// # Errors
    ///
    /// `Error::InvalidCredentials` for an unknown login, a wrong password or
    /// an inactive account alike.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(Error::InvalidCredentials);
        }

        let Some(user) = self.store.user_by_login(login).await? else {
            debug!("Login rejected: unknown user");
            return Err(Error::InvalidCredentials);
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                debug!(user_id = %user.id, "Login rejected: wrong password");
                return Err(Error::InvalidCredentials);
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
                return Err(Error::InvalidCredentials);
            }
        }

        if !user.is_active {
            debug!(user_id = %user.id, "Login rejected: inactive account");
            return Err(Error::InvalidCredentials);
        }

        info!(user_id = %user.id, "User authenticated");
        Ok(user)
    }

    /// Replaces the password after checking the current one
    ///
    /// Returns `Ok(None)` if the user does not exist.
    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<Option<User>> {
        let Some(user) = self.store.user_by_id(id).await? else {
            return Ok(None);
        };

        let matches = verify_password(current_password, &user.password_hash).unwrap_or_else(|e| {
            warn!(user_id = %id, error = %e, "Stored password hash is unreadable");
            false
        });
        if !matches {
            return Err(Error::validation("Current password is incorrect"));
        }
        validate_password_strength(new_password).map_err(Error::Validation)?;
        if new_password == current_password {
            return Err(Error::validation(
                "New password must be different from the current password",
            ));
        }

        let password_hash = hash_password(new_password)?;
        let updated = self
            .store
            .update_user(
                id,
                UpdateUser {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        info!(user_id = %id, "Password changed");
        Ok(updated)
    }

    /// Applies a partial profile update
    ///
    /// An empty change set returns the user untouched, `updated_at` included.
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
        let Some(current) = self.store.user_by_id(id).await? else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(current));
        }

        let mut update = UpdateUser {
            is_active: changes.is_active,
            is_admin: changes.is_admin,
            ..Default::default()
        };

        if let Some(name) = &changes.name {
            update.name = Some(validate_person_name(name)?);
        }
        if let Some(username) = &changes.username {
            let username = validate_username(username)?;
            if let Some(other) = self.store.user_by_username(&username).await? {
                if other.id != id {
                    return Err(Error::validation(messages::DUPLICATE_USERNAME));
                }
            }
            update.username = Some(username);
        }
        if let Some(email) = &changes.email {
            let email = validate_email(email)?;
            if let Some(other) = self.store.user_by_email(&email).await? {
                if other.id != id {
                    return Err(Error::validation(messages::DUPLICATE_EMAIL));
                }
            }
            update.email = Some(email);
        }
        if let Some(phone) = &changes.phone {
            update.phone = Some(validate_phone(Some(phone))?);
        }

        let updated = self.store.update_user(id, update).await?;
        debug!(user_id = %id, "User updated");
        Ok(updated)
    }

    /// Marks the account inactive; it can no longer log in
    pub async fn deactivate(&self, id: Uuid) -> Result<Option<User>> {
        let updated = self
            .store
            .update_user(
                id,
                UpdateUser {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;

        if updated.is_some() {
            info!(user_id = %id, "User deactivated");
        }
        Ok(updated)
    }

    /// Deletes the user and every product they own
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.store.delete_user(id).await?;
        if deleted {
            info!(user_id = %id, "User deleted");
        }
        Ok(deleted)
    }

    /// Makes sure the bootstrap administrator exists
    ///
    /// Creates `admin` / `admin@system.com` with a generated password on the
    /// first call. Later calls return the existing account without a password.
    ///
    /// # Errors
    ///
    /// `Error::Validation` when the default email is held by a non-admin, or
    /// the default username by any account other than the default admin.
    pub async fn ensure_default_admin(&self) -> Result<AdminBootstrap> {
        if let Some(user) = self.store.user_by_email(DEFAULT_ADMIN_EMAIL).await? {
            if !user.is_admin {
                warn!(user_id = %user.id, "Default admin email is held by a non-admin");
                return Err(Error::validation(messages::DEFAULT_ADMIN_EMAIL_TAKEN));
            }
            debug!(user_id = %user.id, "Default admin already exists");
            return Ok(AdminBootstrap {
                user,
                temporary_password: None,
            });
        }

        if let Some(user) = self.store.user_by_username(DEFAULT_ADMIN_USERNAME).await? {
            warn!(user_id = %user.id, "Default admin username is held by another account");
            return Err(Error::validation(messages::DEFAULT_ADMIN_USERNAME_TAKEN));
        }

        let password = generate_secure_password(GENERATED_PASSWORD_LENGTH);
        let user = self
            .create(NewUser {
                name: DEFAULT_ADMIN_NAME.to_string(),
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                email: DEFAULT_ADMIN_EMAIL.to_string(),
                password: password.clone(),
                phone: None,
                is_admin: true,
            })
            .await?;

        warn!(user_id = %user.id, "Default admin created; change its password after first login");
        Ok(AdminBootstrap {
            user,
            temporary_password: Some(password),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, UserStore};

    const PASSWORD: &str = "Str0ng!Pass";

    fn repo() -> UserRepository {
        UserRepository::new(Arc::new(MemoryStore::new()))
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            name: "Alice Liddell".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            phone: None,
            is_admin: false,
        }
    }

    fn validation_message(err: Error) -> String {
        match err {
            Error::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password() {
        let repo = repo();
        let user = repo
            .create(new_user("Alice", "  Alice@Example.com "))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_active);
        assert_ne!(user.password_hash, PASSWORD);

        let found = repo.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(verify_password(PASSWORD, &found.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_after_normalization() {
        let repo = repo();
        repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let err = repo
            .create(new_user("alice2", " ALICE@example.com "))
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), messages::DUPLICATE_EMAIL);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = repo();
        repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let err = repo
            .create(new_user("ALICE", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), messages::DUPLICATE_USERNAME);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_fields() {
        let repo = repo();

        let mut weak = new_user("alice", "alice@example.com");
        weak.password = "password".to_string();
        assert!(repo.create(weak).await.unwrap_err().is_validation());

        assert!(repo
            .create(new_user("al", "alice@example.com"))
            .await
            .unwrap_err()
            .is_validation());
        assert!(repo
            .create(new_user("alice", "not-an-email"))
            .await
            .unwrap_err()
            .is_validation());

        let mut bad_phone = new_user("alice", "alice@example.com");
        bad_phone.phone = Some("12".to_string());
        assert!(repo.create(bad_phone).await.unwrap_err().is_validation());

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let repo = repo();
        let user = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let by_username = repo.authenticate("alice", PASSWORD).await.unwrap();
        assert_eq!(by_username.id, user.id);
        let by_email = repo.authenticate("Alice@Example.com", PASSWORD).await.unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(matches!(
            repo.authenticate("alice", "Wr0ng!Pass").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            repo.authenticate("nobody", PASSWORD).await,
            Err(Error::InvalidCredentials)
        ));

        repo.deactivate(user.id).await.unwrap();
        assert!(matches!(
            repo.authenticate("alice", PASSWORD).await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let repo = repo();
        let user = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let err = repo
            .change_password(user.id, "Wr0ng!Pass", "N3w!Password")
            .await
            .unwrap_err();
        assert!(validation_message(err).contains("incorrect"));

        let err = repo
            .change_password(user.id, PASSWORD, "weak")
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = repo
            .change_password(user.id, PASSWORD, PASSWORD)
            .await
            .unwrap_err();
        assert!(validation_message(err).contains("different"));

        repo.change_password(user.id, PASSWORD, "N3w!Password")
            .await
            .unwrap()
            .unwrap();
        assert!(repo.authenticate("alice", "N3w!Password").await.is_ok());
        assert!(repo.authenticate("alice", PASSWORD).await.is_err());

        assert!(repo
            .change_password(Uuid::new_v4(), PASSWORD, "N3w!Password")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_empty_update_returns_unchanged() {
        let repo = repo();
        let user = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let same = repo
            .update(user.id, UserChanges::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.name, user.name);
        assert_eq!(same.updated_at, None);
    }

    #[tokio::test]
    async fn test_update_fields() {
        let repo = repo();
        let user = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                UserChanges {
                    name: Some("Alice Cooper".to_string()),
                    phone: Some("+1 555 123 4567".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Alice Cooper");
        assert_eq!(updated.phone.as_deref(), Some("+1 555 123 4567"));
        assert!(updated.updated_at.is_some());

        let reread = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(reread.name, "Alice Cooper");

        let cleared = repo
            .update(
                user.id,
                UserChanges {
                    phone: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.phone, None);
    }

    #[tokio::test]
    async fn test_update_uniqueness_excludes_self() {
        let repo = repo();
        let alice = repo.create(new_user("alice", "alice@example.com")).await.unwrap();
        repo.create(new_user("bob", "bob@example.com")).await.unwrap();

        // Re-submitting your own email is fine
        assert!(repo
            .update(
                alice.id,
                UserChanges {
                    email: Some("ALICE@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .is_ok());

        let err = repo
            .update(
                alice.id,
                UserChanges {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), messages::DUPLICATE_USERNAME);
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let repo = repo();
        let user = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_ensure_default_admin() {
        let repo = repo();

        let first = repo.ensure_default_admin().await.unwrap();
        assert!(first.created());
        assert!(first.user.is_admin);
        assert_eq!(first.user.username, DEFAULT_ADMIN_USERNAME);

        let password = first.temporary_password.clone().unwrap();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(repo.authenticate(DEFAULT_ADMIN_EMAIL, &password).await.is_ok());

        let second = repo.ensure_default_admin().await.unwrap();
        assert!(!second.created());
        assert_eq!(second.user.id, first.user.id);

        assert_eq!(repo.list_admins().await.unwrap().len(), 1);
        assert_eq!(repo.is_admin(first.user.id).await.unwrap(), Some(true));
        assert_eq!(repo.is_admin(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_default_admin_email_held_by_non_admin() {
        let repo = repo();
        let squatter = repo
            .create(new_user("mallory", DEFAULT_ADMIN_EMAIL))
            .await
            .unwrap();

        let err = repo.ensure_default_admin().await.unwrap_err();
        assert_eq!(validation_message(err), messages::DEFAULT_ADMIN_EMAIL_TAKEN);

        assert!(repo.list_admins().await.unwrap().is_empty());
        assert_eq!(repo.is_admin(squatter.id).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_default_admin_username_held_by_non_admin() {
        let repo = repo();
        repo.create(new_user(DEFAULT_ADMIN_USERNAME, "someone@example.com"))
            .await
            .unwrap();

        let err = repo.ensure_default_admin().await.unwrap_err();
        assert_eq!(validation_message(err), messages::DEFAULT_ADMIN_USERNAME_TAKEN);
        assert!(repo.list_admins().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_change_password_with_unreadable_hash() {
        let store = Arc::new(MemoryStore::new());
        let repo = UserRepository::new(store.clone());
        let user = repo.create(new_user("alice", "alice@example.com")).await.unwrap();

        store
            .update_user(
                user.id,
                UpdateUser {
                    password_hash: Some("$argon2id$invalid".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = repo
            .change_password(user.id, PASSWORD, "N3w!Password")
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), "Current password is incorrect");
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let repo = repo();
        for i in 0..3 {
            repo.create(new_user(&format!("user{}", i), &format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        assert_eq!(repo.list(None, Some(0)).await.unwrap().len(), 1);
        assert_eq!(repo.list(Some(-5), None).await.unwrap().len(), 3);
        assert_eq!(repo.list(Some(2), Some(10)).await.unwrap().len(), 1);
    }
}
