//! Camellia Core - Shared domain types.
//!
//! Domain vocabulary used by every Camellia component: the `api` server
//! and the `camellia-cli` management tool both build on these types.
//!
//! The crate is deliberately inert. It defines ids, emails, phone numbers,
//! prices, and order statuses, and nothing that talks to a database or the
//! network, so it can sit at the bottom of the dependency graph.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
