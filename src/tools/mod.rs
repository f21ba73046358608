//! MCP tools over the Shopify Admin API
//!
//! Each submodule registers its tools on a [`ToolRegistry`]. Arguments are
//! deserialized into typed parameter structs whose JSON Schema is advertised
//! through `tools/list`; every handler answers with a [`CallToolResult`].

pub mod customers;
pub mod discounts;
pub mod draft_orders;
pub mod formatters;
pub mod orders;
pub mod products;
pub mod response;
pub mod shop;
pub mod webhooks;

use crate::client::ShopifyApi;
use crate::error::ShopifyError;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

pub use response::{format_success, handle_error, CallToolResult, Content};

/// Default page size for list tools
pub const DEFAULT_LIMIT: u32 = 10;

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Shared state handed to every tool handler
#[derive(Clone)]
pub struct ToolContext {
    pub client: Arc<dyn ShopifyApi>,
}

impl ToolContext {
    pub fn new(client: Arc<dyn ShopifyApi>) -> Self {
        Self { client }
    }
}

/// Tool metadata as advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

type Handler = Arc<dyn Fn(ToolContext, Value) -> BoxFuture<'static, CallToolResult> + Send + Sync>;

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Handler,
}

/// Name-indexed set of tools, listed in registration order
pub struct ToolRegistry {
    context: ToolContext,
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new(context: ToolContext) -> Self {
        Self {
            context,
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registry with every Shopify tool registered
    pub fn with_all_tools(context: ToolContext) -> Self {
        let mut registry = Self::new(context);
        shop::register(&mut registry);
        products::register(&mut registry);
        orders::register(&mut registry);
        draft_orders::register(&mut registry);
        customers::register(&mut registry);
        discounts::register(&mut registry);
        webhooks::register(&mut registry);
        registry
    }

    /// Register a tool taking arguments of type `P`.
    ///
    /// Registering a name twice replaces the earlier handler.
    pub fn register<P, F, Fut>(&mut self, name: &str, description: &str, run: F)
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(ToolContext, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallToolResult> + Send + 'static,
    {
        let input_schema = serde_json::to_value(schemars::schema_for!(P))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));

        let tool_name = name.to_string();
        let handler: Handler = Arc::new(
            move |context: ToolContext, arguments: Value| -> BoxFuture<'static, CallToolResult> {
                match serde_json::from_value::<P>(arguments) {
                    Ok(params) => Box::pin(run(context, params)),
                    Err(e) => {
                        let failure = ShopifyError::invalid_input(format!(
                            "Invalid arguments for {tool_name}: {e}"
                        ));
                        Box::pin(std::future::ready(handle_error(
                            "Invalid tool arguments",
                            &failure,
                        )))
                    }
                }
            },
        );

        let tool = RegisteredTool {
            definition: ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            },
            handler,
        };

        match self.index.get(name) {
            Some(&slot) => self.tools[slot] = tool,
            None => {
                self.index.insert(name.to_string(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool. Missing arguments are treated as an empty object.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> CallToolResult {
        let Some(&slot) = self.index.get(name) else {
            return handle_error(
                "Tool execution failed",
                &ShopifyError::not_found(format!("Unknown tool: {name}")),
            );
        };

        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(arguments) => arguments,
        };

        debug!("Dispatching tool {}", name);
        (self.tools[slot].handler)(self.context.clone(), arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockShopify;

    fn registry() -> ToolRegistry {
        ToolRegistry::with_all_tools(ToolContext::new(Arc::new(MockShopify::with_fixtures())))
    }

    #[test]
    fn test_all_tools_registered_with_object_schemas() {
        let registry = registry();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();

        assert_eq!(
            names,
            vec![
                "get-shop",
                "get-products",
                "get-product-details",
                "get-products-by-collection",
                "get-variants",
                "get-collections",
                "search-products",
                "get-inventory-status",
                "get-orders",
                "get-order",
                "create-draft-order",
                "complete-draft-order",
                "get-customers",
                "tag-customer",
                "create-discount",
                "get-price-rule",
                "manage-webhook",
            ]
        );
        for definition in registry.definitions() {
            assert_eq!(definition.input_schema["type"], "object", "{}", definition.name);
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_failure_envelope() {
        let result = registry().call("delete-everything", None).await;
        assert!(result.is_error());
        assert!(result.text().unwrap().contains("Unknown tool: delete-everything"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_name_the_problem() {
        let result = registry()
            .call("get-order", Some(serde_json::json!({ "orderId": 42 })))
            .await;
        assert!(result.is_error());
        let text = result.text().unwrap();
        assert!(text.contains("Invalid arguments for get-order"), "{text}");
    }
}
