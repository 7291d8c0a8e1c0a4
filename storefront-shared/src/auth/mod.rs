/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing, strength rules and generation
/// - [`jwt`]: HS256 access token issuing and validation
///
/// # Example
///
/// ```no_run
/// use storefront_shared::auth::password::{hash_password, verify_password};
/// use storefront_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("User_passw0rd")?;
/// assert!(verify_password("User_passw0rd", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4(), false), "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
