//! A small relay which searches GitHub for repositories, keeps the most
//! recent results in a SQLite database, and serves them back a page at a
//! time.
//!
//! The two operations live on [`Relay`]:
//!
//! - [`Relay::search_and_store`] asks a [`Provider`] for up to 20
//!   repositories matching a keyword and replaces everything in the [`Store`]
//!   with them
//! - [`Relay::page`] reads back 10 records at a time, in the order they were
//!   stored
//!
//! The [`server`] module exposes both over HTTP.

#[macro_use]
extern crate log;

pub mod config;
pub mod errors;
pub mod providers;
pub mod relay;
pub mod repo;
pub mod server;
pub mod store;

pub use crate::config::Config;
pub use crate::errors::RelayError;
pub use crate::providers::{GitHub, Provider};
pub use crate::relay::{PageQuery, Relay, SearchRequest, SearchResponse};
pub use crate::repo::RepositoryRecord;
pub use crate::store::{SqliteStore, Store};
