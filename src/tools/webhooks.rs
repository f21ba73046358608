//! Webhook subscription tool

use super::{format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use crate::client::models::to_gid;
use crate::error::{Result, ShopifyError};
use crate::utils::parse_url_safe;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WebhookAction {
    /// Create a subscription, reusing a matching one
    Subscribe,
    /// Look up a subscription by topic and callback URL
    Find,
    /// Delete a subscription by id
    Unsubscribe,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManageWebhookParams {
    pub action: WebhookAction,
    /// HTTPS endpoint receiving the webhook payloads
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Webhook topic, e.g. `ORDERS_UPDATED`
    #[serde(default)]
    pub topic: Option<String>,
    /// Required for `unsubscribe`
    #[serde(default)]
    pub webhook_id: Option<String>,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "manage-webhook",
        "Subscribe, find or unsubscribe a webhook",
        manage_webhook,
    );
}

fn topic_and_url(params: &ManageWebhookParams) -> Result<(String, String)> {
    let topic = params
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ShopifyError::invalid_input("topic is required"))?;
    if !topic.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return Err(ShopifyError::invalid_input(format!(
            "topic must be an upper-case Shopify topic such as ORDERS_UPDATED, got {topic}"
        )));
    }

    let url = params
        .callback_url
        .as_deref()
        .ok_or_else(|| ShopifyError::invalid_input("callbackUrl is required"))?;
    let url = parse_url_safe(url, "callbackUrl")?;

    Ok((topic.to_string(), url.to_string()))
}

async fn run(context: &ToolContext, params: &ManageWebhookParams) -> Result<serde_json::Value> {
    match params.action {
        WebhookAction::Subscribe => {
            let (topic, url) = topic_and_url(params)?;
            if let Some(existing) = context.client.find_webhook(&topic, &url).await? {
                info!("Reusing webhook {} for {}", existing.id, topic);
                return Ok(json!({ "created": false, "webhook": existing }));
            }
            let webhook = context.client.subscribe_webhook(&topic, &url).await?;
            Ok(json!({ "created": true, "webhook": webhook }))
        }
        WebhookAction::Find => {
            let (topic, url) = topic_and_url(params)?;
            let webhook = context.client.find_webhook(&topic, &url).await?;
            Ok(json!({ "found": webhook.is_some(), "webhook": webhook }))
        }
        WebhookAction::Unsubscribe => {
            let id = params
                .webhook_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ShopifyError::invalid_input("webhookId is required to unsubscribe"))?;
            let deleted = context
                .client
                .unsubscribe_webhook(&to_gid("WebhookSubscription", id))
                .await?;
            Ok(json!({ "deletedWebhookId": deleted }))
        }
    }
}

pub async fn manage_webhook(context: ToolContext, params: ManageWebhookParams) -> CallToolResult {
    match run(&context, &params).await {
        Ok(result) => format_success(&result),
        Err(e) => handle_error("Failed to manage webhook", &e),
    }
}
