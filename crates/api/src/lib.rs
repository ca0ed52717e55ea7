//! Camellia API library.
//!
//! Backend for the Camellia clothing store: a public catalog, per-user
//! carts, orders with atomic stock control, and an OTP-gated signup flow.
//! The binary in `main.rs` wires this together; integration tests mount
//! [`routes::app`] directly on an ephemeral port.
//!
//! # Architecture
//!
//! - Axum handlers in [`routes`], returning JSON
//! - `SQLite` via sqlx repositories in [`db`]
//! - Business rules (auth, OTP gate, delivery) in [`services`]
//! - Request authentication through extractors in [`middleware`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
