//! Core types and trait definitions for the Taller studio backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; the [`studio`] service
//! runs the multi-step reconciliation sequences on top of them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod directory;
pub mod error;
pub mod gift_card;
pub mod inventory;
pub mod piece;
pub mod report;
pub mod session;
pub mod store;
pub mod student;
pub mod studio;
pub mod teacher;
pub mod time;

pub use error::{Error, Result};
