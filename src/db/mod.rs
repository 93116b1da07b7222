//! SQLite store: handle, schema, bulk insertion, lookups.

mod bulk;
mod client;
mod queries;

pub use bulk::BulkInserter;
pub use client::Store;
