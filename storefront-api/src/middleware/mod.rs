/// Request-level concerns shared by the route handlers
///
/// - `auth`: optional bearer-token authentication (the acting user)

pub mod auth;
