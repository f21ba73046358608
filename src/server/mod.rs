//! MCP server components
//!
//! The JSON-RPC service and the expiring response cache shared with the client.

pub mod response_cache;
pub mod service;

pub use response_cache::{
    create_cache_key, start_cleanup_task, CacheConfig, CacheStats, Clock, ExpiringCache,
    MockClock, ResponseCache, SystemClock,
};
pub use service::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer};
