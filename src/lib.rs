//! Multi-tenant paper-trading competition server.
//!
//! Exposes every module so both the `arena` binary and the integration
//! tests can assemble an `AppState` and a router without duplicating the
//! wiring in `main.rs`.

pub mod api;
pub mod auth;
pub mod balance;
pub mod chain;
pub mod competition;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod middleware;
pub mod price;
pub mod rate_limit;
pub mod snapshot;
pub mod state;
pub mod team;
pub mod trade;
