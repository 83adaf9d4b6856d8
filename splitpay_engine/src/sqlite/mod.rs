//! SQLite backend for the split payment engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::{SqliteDatabase, CONFIRMATION_MESSAGE};
