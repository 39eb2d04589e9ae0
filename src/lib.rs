//! Agent Discoveries: a SQLite-backed store for agents, locations and their
//! status reports, with report search composed from independent criteria.

pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod search;

pub use error::{Error, Result};
