//! SQLite backend for the Taller studio and directory stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One database holds every workshop; the
//! studio tables carry a `sede_id` column and [`SedeStore`] scopes every query
//! to a single workshop.

mod encode;
mod schema;
mod sede;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use sede::SedeStore;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
