//! # Storefront Shared Library
//!
//! Data layer of the storefront catalog, used by the API server.
//!
//! ## Module Organization
//!
//! - `models`: database models for users, categories and products
//! - `validation`: one function per field-format rule
//! - `store`: persistence traits with PostgreSQL and in-memory backends
//! - `repository`: business rules on top of a store
//! - `auth`: password hashing and access tokens
//! - `db`: connection pool and migrations
//! - `error`: shared error type

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod validation;

pub use error::{Error, Result};

/// Current version of the storefront shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
