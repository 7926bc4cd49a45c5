//! # Template Market server
//! This module hosts the HTTP surface of the template marketplace settlement engine. It is responsible for:
//! * Authenticating requests via the identity headers forwarded by the upstream identity service.
//! * Verifying and parsing incoming payment-gateway webhooks.
//! * Translating engine results and errors into HTTP responses.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the order lifecycle and settlement routes under `/api`, the gateway webhook under
//! `/gateway/webhook`, and a `/health` liveness probe.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
