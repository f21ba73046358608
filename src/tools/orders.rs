//! Order tools

use super::formatters::format_order;
use super::{default_limit, format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use crate::client::models::to_gid;
use crate::error::ShopifyError;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Closed,
    Cancelled,
    Any,
}

impl OrderStatus {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            OrderStatus::Open => Some("status:open"),
            OrderStatus::Closed => Some("status:closed"),
            OrderStatus::Cancelled => Some("status:cancelled"),
            OrderStatus::Any => None,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetOrdersParams {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Additional Shopify search syntax, e.g. `financial_status:paid`
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor returned as `nextCursor` by a previous call
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetOrderParams {
    /// Order id, numeric or `gid://shopify/Order/...`
    pub order_id: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "get-orders",
        "Get recent orders, optionally filtered by status or search query",
        get_orders,
    );
    registry.register("get-order", "Get a single order by id", get_order);
}

/// Combine the status filter and free-form query into one search string
fn order_query(status: Option<OrderStatus>, query: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = status
        .and_then(OrderStatus::as_filter)
        .into_iter()
        .chain(query.map(str::trim).filter(|q| !q.is_empty()))
        .collect();

    (!parts.is_empty()).then(|| parts.join(" AND "))
}

pub async fn get_orders(context: ToolContext, params: GetOrdersParams) -> CallToolResult {
    let query = order_query(params.status, params.query.as_deref());

    match context
        .client
        .load_orders(query.as_deref(), params.limit, params.after.as_deref())
        .await
    {
        Ok(page) => format_success(&page),
        Err(e) => handle_error("Failed to fetch orders", &e),
    }
}

pub async fn get_order(context: ToolContext, params: GetOrderParams) -> CallToolResult {
    if params.order_id.trim().is_empty() {
        return handle_error(
            "Failed to fetch order",
            &ShopifyError::invalid_input("orderId must not be empty"),
        );
    }
    let order_id = to_gid("Order", params.order_id.trim());

    match context.client.load_order(&order_id).await {
        Ok(order) => format_success(&json!({
            "order": order,
            "summary": format_order(&order),
        })),
        Err(e) => handle_error("Failed to fetch order", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_query_combines_filters() {
        assert_eq!(order_query(None, None), None);
        assert_eq!(order_query(Some(OrderStatus::Any), Some("  ")), None);
        assert_eq!(
            order_query(Some(OrderStatus::Open), None).as_deref(),
            Some("status:open")
        );
        assert_eq!(
            order_query(Some(OrderStatus::Closed), Some("financial_status:paid")).as_deref(),
            Some("status:closed AND financial_status:paid")
        );
    }
}
