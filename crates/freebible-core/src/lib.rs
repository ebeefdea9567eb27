//! Core types and trait definitions for the FreeBible store.
//!
//! No HTTP or database dependencies; every other crate builds on it.

pub mod bible;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod search;
pub mod store;
pub mod user;

pub use error::{Error, Result};
