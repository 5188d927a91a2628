//! Configuration constants and connection settings for the report
//!
//! This module centralizes the tunable parameters used throughout the
//! application, along with the resolution of the connection target from CLI
//! flags, environment variables and defaults.

use std::time::Duration;

// ============================================================================
// Connection Configuration
// ============================================================================

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

pub const DEFAULT_DATABASE: &str = "plp_bookstore";

pub const DEFAULT_COLLECTION: &str = "books";

pub const URI_ENV: &str = "MONGODB_URI";

pub const DATABASE_ENV: &str = "MONGODB_DB";

pub const COLLECTION_ENV: &str = "MONGODB_COLLECTION";

/// Timeout for establishing a TCP connection to a server
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the driver waits for a suitable server before failing an operation
///
/// Kept short so that an unreachable server surfaces as a connection failure
/// within seconds instead of the driver's 30 second default.
pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Application name reported to the server in the connection handshake
pub const APP_NAME: &str = "bookstore-report";

// ============================================================================
// Report Parameters
// ============================================================================

pub const GENRE: &str = "Fiction";

pub const PUBLISHED_AFTER: i32 = 2000;

pub const AUTHOR: &str = "George Orwell";

pub const UPDATE_TITLE: &str = "1984";

pub const UPDATED_PRICE: f64 = 12.99;

pub const DELETE_TITLE: &str = "Moby Dick";

pub const IN_STOCK_PUBLISHED_AFTER: i32 = 2010;

pub const PROJECTED_FIELDS: [&str; 3] = ["title", "author", "price"];

pub const PAGE_SIZE: u64 = 5;

/// Where the report connects to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl ConnectionSettings {
    /// Resolve settings from CLI overrides, then the process environment
    /// (including a `.env` file if present), then defaults.
    pub fn resolve(
        uri: Option<String>,
        database: Option<String>,
        collection: Option<String>,
    ) -> Self {
        dotenvy::dotenv().ok();
        Self::resolve_with(uri, database, collection, |key| std::env::var(key).ok())
    }

    pub fn resolve_with(
        uri: Option<String>,
        database: Option<String>,
        collection: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let pick = |flag: Option<String>, key: &str, default: &str| {
            flag.or_else(|| lookup(key).filter(|v| !v.trim().is_empty()))
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            uri: pick(uri, URI_ENV, DEFAULT_URI),
            database: pick(database, DATABASE_ENV, DEFAULT_DATABASE),
            collection: pick(collection, COLLECTION_ENV, DEFAULT_COLLECTION),
        }
    }
}
