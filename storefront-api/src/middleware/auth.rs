/// Acting-user extraction from `Authorization: Bearer <token>`
///
/// Authentication is optional: a request without the header is anonymous and
/// the repositories attribute writes to the first administrator. A header
/// that is present but malformed, expired or badly signed is rejected with
/// `401 Unauthorized`.
///
/// # Example
///
/// ```no_run
/// use axum::Json;
/// use storefront_api::middleware::auth::Actor;
///
/// async fn whoami(actor: Actor) -> Json<Option<uuid::Uuid>> {
///     Json(actor.user_id())
/// }
/// ```

use crate::{app::AppState, error::ApiError};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use storefront_shared::auth::jwt::{self, Claims};
use uuid::Uuid;

/// The caller, if they presented a valid access token
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub claims: Option<Claims>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Id of the authenticated user, used for `created_by` / `updated_by`
    pub fn user_id(&self) -> Option<Uuid> {
        self.claims.as_ref().map(|claims| claims.sub)
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }
}

/// Pulls the token out of an `Authorization` header value
fn bearer_token(header: &str) -> Result<&str, ApiError> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    if token.is_empty() {
        return Err(ApiError::Unauthorized("Empty bearer token".to_string()));
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Actor::anonymous());
        };

        let header = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Malformed authorization header".to_string()))?;
        let token = bearer_token(header)?;

        let claims = jwt::validate_token(token, state.jwt_secret())?;
        tracing::debug!(user_id = %claims.sub, "Authenticated request");

        Ok(Actor {
            claims: Some(claims),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token("bearer abc").unwrap(), "abc");
        assert!(bearer_token("Basic dXNlcjpwYXNz").is_err());
        assert!(bearer_token("Bearer   ").is_err());
    }

    #[test]
    fn test_anonymous_actor() {
        let actor = Actor::anonymous();
        assert!(!actor.is_authenticated());
        assert_eq!(actor.user_id(), None);

        let id = Uuid::new_v4();
        let actor = Actor {
            claims: Some(Claims::new(id, false)),
        };
        assert_eq!(actor.user_id(), Some(id));
    }
}
