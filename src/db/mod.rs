//! Database layer - the store seam, typed queries, and the MongoDB driver

pub mod mongo;
pub mod query;
pub mod store;

pub use store::BookStore;
