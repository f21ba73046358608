//! Discount code and price rule tools

use super::{format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use crate::client::models::{
    to_gid, CreateBasicDiscountCodeInput, DiscountValueType, PriceRuleValue,
};
use crate::error::{Result, ShopifyError};
use chrono::DateTime;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetPriceRuleParams {
    /// Price rule id, numeric or `gid://shopify/PriceRule/...`
    pub price_rule_id: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "create-discount",
        "Create a basic discount code (percentage or fixed amount)",
        create_discount,
    );
    registry.register(
        "get-price-rule",
        "Get a price rule with its value, schedule and usage limits",
        get_price_rule,
    );
}

/// "10% off" or "5.00 USD off"; rule values are stored as negative adjustments
fn describe_value(value: &PriceRuleValue) -> String {
    match value {
        PriceRuleValue::Percentage { percentage } => format!("{}% off", percentage.abs()),
        PriceRuleValue::Amount(money) => {
            format!("{} {} off", money.amount.trim_start_matches('-'), money.currency_code)
        }
    }
}

fn validate(input: &CreateBasicDiscountCodeInput) -> Result<()> {
    if input.title.trim().is_empty() || input.code.trim().is_empty() {
        return Err(ShopifyError::invalid_input("title and code must not be empty"));
    }

    match input.value_type {
        DiscountValueType::Percentage if !(input.value > 0.0 && input.value <= 1.0) => {
            return Err(ShopifyError::invalid_input(format!(
                "percentage value must be within (0, 1], got {}",
                input.value
            )));
        }
        DiscountValueType::FixedAmount if !(input.value > 0.0 && input.value.is_finite()) => {
            return Err(ShopifyError::invalid_input(format!(
                "fixed amount must be positive, got {}",
                input.value
            )));
        }
        _ => {}
    }

    let starts_at = DateTime::parse_from_rfc3339(&input.starts_at)
        .map_err(|e| ShopifyError::invalid_input(format!("startsAt is not RFC 3339: {e}")))?;
    if let Some(ends_at) = &input.ends_at {
        let ends_at = DateTime::parse_from_rfc3339(ends_at)
            .map_err(|e| ShopifyError::invalid_input(format!("endsAt is not RFC 3339: {e}")))?;
        if ends_at <= starts_at {
            return Err(ShopifyError::invalid_input("endsAt must be after startsAt"));
        }
    }

    Ok(())
}

pub async fn create_discount(
    context: ToolContext,
    mut input: CreateBasicDiscountCodeInput,
) -> CallToolResult {
    if let Err(e) = validate(&input) {
        return handle_error("Failed to create discount", &e);
    }
    input.include_collection_ids = input
        .include_collection_ids
        .iter()
        .map(|id| to_gid("Collection", id.trim()))
        .collect();

    match context.client.create_basic_discount_code(&input).await {
        Ok(discount) => format_success(&discount),
        Err(e) => handle_error("Failed to create discount", &e),
    }
}

pub async fn get_price_rule(context: ToolContext, params: GetPriceRuleParams) -> CallToolResult {
    let id = params.price_rule_id.trim();
    if id.is_empty() {
        return handle_error(
            "Failed to fetch price rule",
            &ShopifyError::invalid_input("priceRuleId must not be empty"),
        );
    }

    match context.client.get_price_rule(&to_gid("PriceRule", id)).await {
        Ok(rule) => format_success(&json!({
            "summary": describe_value(&rule.value),
            "priceRule": rule,
        })),
        Err(e) => handle_error("Failed to fetch price rule", &e),
    }
}
