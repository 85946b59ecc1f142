//! The `taskvault` library crate.
//!
//! Contains the domain models, the token/revocation authentication core,
//! routing configuration, and error handling for the TaskVault API.
//! The binary (`main.rs`) assembles these into a running server.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
