//! Draft order tools

use super::{format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use crate::client::models::{to_gid, CreateDraftOrderInput};
use crate::error::{Result, ShopifyError};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteDraftOrderParams {
    /// Draft order id, numeric or `gid://shopify/DraftOrder/...`
    pub draft_order_id: String,
    /// Leave payment pending instead of marking the order paid
    #[serde(default)]
    pub payment_pending: bool,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "create-draft-order",
        "Create a draft order from variant ids and quantities",
        create_draft_order,
    );
    registry.register(
        "complete-draft-order",
        "Complete a draft order, turning it into an order",
        complete_draft_order,
    );
}

fn validate(input: &CreateDraftOrderInput) -> Result<()> {
    if input.line_items.is_empty() {
        return Err(ShopifyError::invalid_input("At least one line item is required"));
    }
    for item in &input.line_items {
        if item.variant_id.trim().is_empty() {
            return Err(ShopifyError::invalid_input("Line item variantId must not be empty"));
        }
        if item.quantity == 0 {
            return Err(ShopifyError::invalid_input(format!(
                "Quantity for {} must be at least 1",
                item.variant_id
            )));
        }
    }
    Ok(())
}

pub async fn create_draft_order(
    context: ToolContext,
    mut input: CreateDraftOrderInput,
) -> CallToolResult {
    if let Err(e) = validate(&input) {
        return handle_error("Failed to create draft order", &e);
    }
    for item in &mut input.line_items {
        item.variant_id = to_gid("ProductVariant", item.variant_id.trim());
    }
    input.customer_id = input
        .customer_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| to_gid("Customer", id));

    match context.client.create_draft_order(&input).await {
        Ok(draft) => format_success(&draft),
        Err(e) => handle_error("Failed to create draft order", &e),
    }
}

pub async fn complete_draft_order(
    context: ToolContext,
    params: CompleteDraftOrderParams,
) -> CallToolResult {
    let id = params.draft_order_id.trim();
    if id.is_empty() {
        return handle_error(
            "Failed to complete draft order",
            &ShopifyError::invalid_input("draftOrderId must not be empty"),
        );
    }

    match context
        .client
        .complete_draft_order(&to_gid("DraftOrder", id), params.payment_pending)
        .await
    {
        Ok(draft) => format_success(&draft),
        Err(e) => handle_error("Failed to complete draft order", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::DraftOrderLineItemInput;
    use crate::mock::MockShopify;
    use std::sync::Arc;

    fn input(items: &[(&str, u32)]) -> CreateDraftOrderInput {
        CreateDraftOrderInput {
            line_items: items
                .iter()
                .map(|(variant_id, quantity)| DraftOrderLineItemInput {
                    variant_id: variant_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            email: None,
            note: None,
            tags: vec![],
            customer_id: Some("1".to_string()),
        }
    }

    #[test]
    fn test_validate_line_items() {
        assert!(validate(&input(&[("1", 2)])).is_ok());
        assert!(validate(&input(&[])).is_err());
        assert!(validate(&input(&[("1", 0)])).is_err());
        assert!(validate(&input(&[(" ", 1)])).is_err());
    }

    #[tokio::test]
    async fn test_create_draft_order_expands_ids() {
        let mock = Arc::new(MockShopify::with_fixtures());
        let result = create_draft_order(ToolContext::new(mock.clone()), input(&[("1", 2), ("2", 1)])).await;

        let text = result.text().unwrap();
        assert!(!result.is_error(), "{text}");
        assert!(text.contains("88.98"));

        let drafts = mock.draft_orders();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].status, "OPEN");
    }

    #[tokio::test]
    async fn test_create_draft_order_rejects_zero_quantity() {
        let mock = Arc::new(MockShopify::with_fixtures());
        let result = create_draft_order(ToolContext::new(mock.clone()), input(&[("1", 0)])).await;

        assert!(result.is_error());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_complete_draft_order_twice_fails() {
        let mock = Arc::new(MockShopify::with_fixtures());
        create_draft_order(ToolContext::new(mock.clone()), input(&[("1", 1)])).await;
        let draft_id = mock.draft_orders()[0].id.clone();
        let params = || CompleteDraftOrderParams {
            draft_order_id: draft_id.clone(),
            payment_pending: false,
        };

        let first = complete_draft_order(ToolContext::new(mock.clone()), params()).await;
        assert!(!first.is_error());
        assert!(first.text().unwrap().contains("COMPLETED"));

        let second = complete_draft_order(ToolContext::new(mock.clone()), params()).await;
        assert!(second.is_error());
        assert!(second.text().unwrap().contains("already been completed"));
    }
}
