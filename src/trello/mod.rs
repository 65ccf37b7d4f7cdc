//! Trello REST API integration.
//!
//! [`TrelloClient`] implements both [`crate::catalog::Catalog`] and
//! [`crate::catalog::Mutations`] with key/token query authentication.

mod client;

pub use client::TrelloClient;
