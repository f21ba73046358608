//! Shopify MCP Server implementation in Rust
//!
//! This crate exposes the Shopify Admin GraphQL API to agents as Model
//! Context Protocol tools.
//!
//! # Features
//!
//! - 12 MCP tools for shop, product, order, customer, discount and webhook data
//! - Retry with exponential backoff for transient Shopify failures
//! - Expiring in-memory cache for read queries
//! - Uniform success/failure envelopes with correlation ids
//! - Newline-delimited JSON-RPC over stdio

// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod error_recovery;
pub mod logging;
pub mod server;
pub mod tools;
pub mod utils;

// Test support modules - available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export main types for convenience
pub use client::{ShopifyApi, ShopifyClient};
pub use config::ServerConfig;
pub use error::{Result, ShopifyError};
pub use error_recovery::{with_retry, RetryPolicy};
pub use server::{ExpiringCache, McpServer};
pub use tools::{format_success, handle_error, CallToolResult};
