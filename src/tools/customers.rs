//! Customer tools

use super::formatters::format_customer;
use super::{default_limit, format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use crate::client::models::to_gid;
use crate::error::ShopifyError;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCustomersParams {
    /// Shopify customer search syntax, e.g. `email:ada@example.com`
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor returned as `nextCursor` by a previous call
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagCustomerParams {
    /// Customer id, numeric or `gid://shopify/Customer/...`
    pub customer_id: String,
    pub tags: Vec<String>,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "get-customers",
        "Get customers, optionally filtered by a search query",
        get_customers,
    );
    registry.register("tag-customer", "Add tags to a customer", tag_customer);
}

pub async fn get_customers(context: ToolContext, params: GetCustomersParams) -> CallToolResult {
    let query = params
        .search_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    match context
        .client
        .load_customers(query, params.limit, params.next.as_deref())
        .await
    {
        Ok(page) => format_success(&json!({
            "customers": page.customers,
            "summaries": page.customers.iter().map(format_customer).collect::<Vec<_>>(),
            "nextCursor": page.next_cursor,
        })),
        Err(e) => handle_error("Failed to fetch customers", &e),
    }
}

pub async fn tag_customer(context: ToolContext, params: TagCustomerParams) -> CallToolResult {
    let tags: Vec<String> = params
        .tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    if params.customer_id.trim().is_empty() || tags.is_empty() {
        return handle_error(
            "Failed to tag customer",
            &ShopifyError::invalid_input("customerId and at least one non-empty tag are required"),
        );
    }
    let customer_id = to_gid("Customer", params.customer_id.trim());

    match context.client.tag_customer(&customer_id, &tags).await {
        Ok(()) => format_success(&json!({
            "success": true,
            "customerId": customer_id,
            "tags": tags,
        })),
        Err(e) => handle_error("Failed to tag customer", &e),
    }
}
