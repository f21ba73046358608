//! Store information tool

use super::{format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetShopParams {}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "get-shop",
        "Get shop details: name, domain, currency and plan",
        get_shop,
    );
}

pub async fn get_shop(context: ToolContext, _params: GetShopParams) -> CallToolResult {
    match context.client.load_shop().await {
        Ok(shop) => format_success(&shop),
        Err(e) => handle_error("Failed to fetch shop details", &e),
    }
}
