/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, admin bootstrap, user verification and status
/// - `users`: User accounts
/// - `categories`: Product categories
/// - `products`: Products, including search and price-range queries

pub mod auth;
pub mod categories;
pub mod health;
pub mod products;
pub mod users;

use serde::{Deserialize, Serialize};

/// `?offset=&limit=` query parameters
///
/// Missing values fall back to offset 0 and limit 100; the repositories clamp
/// out-of-range values.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Generic acknowledgement body
///
/// ```json
/// { "message": "Product deleted", "success": true }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,

    /// Extra payload for endpoints that report more than a message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }
}
