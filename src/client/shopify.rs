//! Production [`ShopifyApi`] implementation

use super::graphql::{check_user_errors, GraphQlTransport};
use super::models::*;
use super::queries;
use super::ShopifyApi;
use crate::config::ServerConfig;
use crate::error::{Result, ShopifyError};
use crate::error_recovery::{RetryExecutor, RetryStats};
use crate::server::response_cache::{create_cache_key, ResponseCache};
use crate::utils::extract_json_value;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Admin API page size limit
const MAX_PAGE_SIZE: u32 = 250;

/// Shopify client with retries and a read cache.
///
/// Reads are cached per operation and variables. Any successful mutation
/// clears the cache and bumps the write epoch; a read whose request was in
/// flight across a mutation returns its result but does not cache it.
pub struct ShopifyClient {
    transport: GraphQlTransport,
    retry: RetryExecutor,
    cache: Arc<ResponseCache>,
    cache_enabled: bool,
    write_epoch: AtomicU64,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("endpoint", &self.transport.endpoint().as_str())
            .field("cache_enabled", &self.cache_enabled)
            .finish()
    }
}

impl ShopifyClient {
    /// Create a client from configuration, sharing `cache` with its owner
    pub fn new(config: &ServerConfig, cache: Arc<ResponseCache>) -> Result<Self> {
        let transport = GraphQlTransport::new(&config.shopify)?;
        info!("Shopify client targeting {}", transport.endpoint());

        Ok(Self {
            transport,
            retry: RetryExecutor::new(config.retry.clone()),
            cache,
            cache_enabled: config.cache.enabled,
            write_epoch: AtomicU64::new(0),
        })
    }

    /// Replace the retry executor
    pub fn with_retry_executor(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub async fn retry_stats(&self) -> RetryStats {
        self.retry.get_stats().await
    }

    async fn send(&self, operation: &str, query: &str, variables: &Value) -> Result<Value> {
        self.retry
            .execute(|| self.transport.execute(operation, query, variables))
            .await
    }

    async fn read(&self, operation: &str, query: &str, variables: Value) -> Result<Value> {
        if !self.cache_enabled {
            return self.send(operation, query, &variables).await;
        }

        let key = create_cache_key(operation, &variables);
        if let Some(data) = self.cache.get(&key) {
            return Ok(data);
        }

        let epoch = self.write_epoch.load(Ordering::SeqCst);
        let data = self.send(operation, query, &variables).await?;
        let stored = self.cache.set_if(key, data.clone(), || {
            self.write_epoch.load(Ordering::SeqCst) == epoch
        });
        if !stored {
            debug!("{} overlapped a mutation, result not cached", operation);
        }
        Ok(data)
    }

    async fn write(&self, operation: &str, query: &str, variables: Value) -> Result<Value> {
        let data = self.send(operation, query, &variables).await?;
        if self.cache_enabled {
            debug!("{} succeeded, invalidating read cache", operation);
            self.write_epoch.fetch_add(1, Ordering::SeqCst);
            self.cache.clear();
        }
        Ok(data)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

/// Keep only nodes of the requested type from a `nodes(ids:)` lookup
fn decode_nodes<T: DeserializeOwned>(data: Value) -> Result<Vec<T>> {
    #[derive(Deserialize)]
    struct Nodes {
        nodes: Vec<Value>,
    }

    let Nodes { nodes } = decode(data)?;
    nodes
        .into_iter()
        .filter(|node| node.get("id").is_some())
        .map(decode)
        .collect()
}

fn mutation_payload(operation: &str, mut data: Value) -> Result<Value> {
    let payload = data
        .get_mut(operation)
        .map(Value::take)
        .filter(|payload| !payload.is_null())
        .ok_or_else(|| ShopifyError::platform(format!("{operation} returned no payload"), "GRAPHQL_ERROR"))?;
    check_user_errors(operation, &payload)?;
    Ok(payload)
}

fn page_size(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

/// Product search syntax for a variant price range
fn price_range_query(min_price: Option<f64>, max_price: Option<f64>) -> Option<String> {
    let bounds: Vec<String> = [
        min_price.map(|min| format!("variants.price:>={min}")),
        max_price.map(|max| format!("variants.price:<={max}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    (!bounds.is_empty()).then(|| bounds.join(" AND "))
}

#[derive(Deserialize)]
struct ShopData {
    shop: Shop,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyOnly {
    currency_code: String,
}

#[derive(Deserialize)]
struct ProductsData {
    products: Connection<Product>,
    shop: CurrencyOnly,
}

#[derive(Deserialize)]
struct CollectionProducts {
    products: Connection<Product>,
}

#[derive(Deserialize)]
struct CollectionData {
    collection: Option<CollectionProducts>,
}

#[derive(Deserialize)]
struct CollectionsData {
    collections: Connection<Collection>,
}

#[derive(Deserialize)]
struct OrdersData {
    orders: Connection<Order>,
}

#[derive(Deserialize)]
struct OrderData {
    order: Option<Order>,
}

#[derive(Deserialize)]
struct CustomersData {
    customers: Connection<Customer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRuleData {
    price_rule: Option<PriceRule>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftOrderPayload {
    draft_order: DraftOrder,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhooksData {
    webhook_subscriptions: Connection<WebhookSubscription>,
}

#[async_trait]
impl ShopifyApi for ShopifyClient {
    async fn load_shop(&self) -> Result<Shop> {
        let data = self.read("shop", queries::LOAD_SHOP, json!({})).await?;
        Ok(decode::<ShopData>(data)?.shop)
    }

    async fn load_products(&self, search_title: Option<&str>, limit: u32) -> Result<ProductList> {
        let variables = json!({
            "first": page_size(limit),
            "query": search_title.map(|title| format!("title:*{title}*")),
        });
        let data: ProductsData = decode(
            self.read("products", queries::LOAD_PRODUCTS, variables)
                .await?,
        )?;

        Ok(ProductList {
            products: data.products.into_nodes(),
            currency_code: data.shop.currency_code,
        })
    }

    async fn search_products_by_price_range(
        &self,
        min_price: Option<f64>,
        max_price: Option<f64>,
        limit: u32,
    ) -> Result<ProductList> {
        let variables = json!({
            "first": page_size(limit),
            "query": price_range_query(min_price, max_price),
        });
        let data: ProductsData = decode(
            self.read("productsByPrice", queries::LOAD_PRODUCTS, variables)
                .await?,
        )?;

        Ok(ProductList {
            products: data.products.into_nodes(),
            currency_code: data.shop.currency_code,
        })
    }

    async fn load_products_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .read(
                "productsByIds",
                queries::LOAD_PRODUCTS_BY_IDS,
                json!({ "ids": ids }),
            )
            .await?;
        decode_nodes(data)
    }

    async fn load_products_by_collection_id(
        &self,
        collection_id: &str,
        limit: u32,
    ) -> Result<Vec<Product>> {
        let variables = json!({ "id": collection_id, "first": page_size(limit) });
        let data: CollectionData = decode(
            self.read(
                "productsByCollection",
                queries::LOAD_PRODUCTS_BY_COLLECTION,
                variables,
            )
            .await?,
        )?;

        data.collection
            .map(|collection| collection.products.into_nodes())
            .ok_or_else(|| ShopifyError::not_found(format!("Collection {collection_id}")))
    }

    async fn load_variants_by_ids(&self, ids: &[String]) -> Result<Vec<ProductVariant>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .read(
                "variantsByIds",
                queries::LOAD_VARIANTS_BY_IDS,
                json!({ "ids": ids }),
            )
            .await?;
        decode_nodes(data)
    }

    async fn load_collections(&self, name: Option<&str>, limit: u32) -> Result<Vec<Collection>> {
        let variables = json!({
            "first": page_size(limit),
            "query": name.map(|name| format!("title:{name}")),
        });
        let data: CollectionsData = decode(
            self.read("collections", queries::LOAD_COLLECTIONS, variables)
                .await?,
        )?;
        Ok(data.collections.into_nodes())
    }

    async fn load_orders(
        &self,
        query: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<OrderPage> {
        let variables = json!({ "first": page_size(limit), "after": after, "query": query });
        let data: OrdersData =
            decode(self.read("orders", queries::LOAD_ORDERS, variables).await?)?;

        let next_cursor = data.orders.next_cursor();
        Ok(OrderPage {
            orders: data.orders.into_nodes(),
            next_cursor,
        })
    }

    async fn load_order(&self, order_id: &str) -> Result<Order> {
        let data: OrderData = decode(
            self.read("order", queries::LOAD_ORDER, json!({ "id": order_id }))
                .await?,
        )?;
        data.order
            .ok_or_else(|| ShopifyError::not_found(format!("Order {order_id}")))
    }

    async fn load_customers(
        &self,
        query: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<CustomerPage> {
        let variables = json!({ "first": page_size(limit), "after": after, "query": query });
        let data: CustomersData =
            decode(self.read("customers", queries::LOAD_CUSTOMERS, variables).await?)?;

        let next_cursor = data.customers.next_cursor();
        Ok(CustomerPage {
            customers: data.customers.into_nodes(),
            next_cursor,
        })
    }

    async fn tag_customer(&self, customer_id: &str, tags: &[String]) -> Result<()> {
        if tags.is_empty() {
            return Err(ShopifyError::invalid_input("At least one tag is required"));
        }
        let data = self
            .write(
                "tagsAdd",
                queries::TAG_CUSTOMER,
                json!({ "id": customer_id, "tags": tags }),
            )
            .await?;
        mutation_payload("tagsAdd", data)?;
        Ok(())
    }

    async fn create_basic_discount_code(
        &self,
        input: &CreateBasicDiscountCodeInput,
    ) -> Result<DiscountCode> {
        let value = match input.value_type {
            DiscountValueType::Percentage => json!({ "percentage": input.value }),
            DiscountValueType::FixedAmount => json!({
                "discountAmount": { "amount": input.value, "appliesOnEachItem": false }
            }),
        };
        let items = if input.include_collection_ids.is_empty() {
            json!({ "all": true })
        } else {
            json!({ "collections": { "add": input.include_collection_ids } })
        };

        let variables = json!({
            "basicCodeDiscount": {
                "title": input.title,
                "code": input.code,
                "startsAt": input.starts_at,
                "endsAt": input.ends_at,
                "customerSelection": { "all": true },
                "customerGets": { "value": value, "items": items },
                "appliesOncePerCustomer": input.applies_once_per_customer,
                "combinesWith": input.combines_with,
            }
        });

        let data = self
            .write(
                "discountCodeBasicCreate",
                queries::CREATE_BASIC_DISCOUNT_CODE,
                variables,
            )
            .await?;
        let payload = mutation_payload("discountCodeBasicCreate", data)?;
        let id = extract_json_value(&payload["codeDiscountNode"], "id", |v| {
            v.as_str().map(str::to_string)
        })?;

        Ok(DiscountCode {
            id,
            code: input.code.clone(),
        })
    }

    async fn get_price_rule(&self, price_rule_id: &str) -> Result<PriceRule> {
        let data: PriceRuleData = decode(
            self.read(
                "priceRule",
                queries::GET_PRICE_RULE,
                json!({ "id": price_rule_id }),
            )
            .await?,
        )?;
        data.price_rule
            .ok_or_else(|| ShopifyError::not_found(format!("Price rule {price_rule_id}")))
    }

    async fn create_draft_order(&self, input: &CreateDraftOrderInput) -> Result<DraftOrder> {
        if input.line_items.is_empty() {
            return Err(ShopifyError::invalid_input("At least one line item is required"));
        }
        let line_items: Vec<Value> = input
            .line_items
            .iter()
            .map(|item| json!({ "variantId": item.variant_id, "quantity": item.quantity }))
            .collect();

        let variables = json!({
            "input": {
                "lineItems": line_items,
                "email": input.email,
                "note": input.note,
                "tags": input.tags,
                "purchasingEntity": input
                    .customer_id
                    .as_ref()
                    .map(|id| json!({ "customerId": id })),
            }
        });

        let data = self
            .write("draftOrderCreate", queries::CREATE_DRAFT_ORDER, variables)
            .await?;
        let payload = mutation_payload("draftOrderCreate", data)?;
        Ok(decode::<DraftOrderPayload>(payload)?.draft_order)
    }

    async fn complete_draft_order(
        &self,
        draft_order_id: &str,
        payment_pending: bool,
    ) -> Result<DraftOrder> {
        let data = self
            .write(
                "draftOrderComplete",
                queries::COMPLETE_DRAFT_ORDER,
                json!({ "id": draft_order_id, "paymentPending": payment_pending }),
            )
            .await?;
        let payload = mutation_payload("draftOrderComplete", data)?;
        Ok(decode::<DraftOrderPayload>(payload)?.draft_order)
    }

    async fn subscribe_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<WebhookSubscription> {
        let variables = json!({
            "topic": topic,
            "webhookSubscription": { "callbackUrl": callback_url, "format": "JSON" },
        });
        let data = self
            .write(
                "webhookSubscriptionCreate",
                queries::SUBSCRIBE_WEBHOOK,
                variables,
            )
            .await?;
        let mut payload = mutation_payload("webhookSubscriptionCreate", data)?;
        decode(payload["webhookSubscription"].take())
    }

    async fn find_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<Option<WebhookSubscription>> {
        let variables = json!({ "topics": [topic], "callbackUrl": callback_url });
        let data: WebhooksData =
            decode(self.read("webhooks", queries::FIND_WEBHOOKS, variables).await?)?;

        Ok(data
            .webhook_subscriptions
            .into_nodes()
            .into_iter()
            .find(|hook| hook.topic == topic && hook.callback_url() == Some(callback_url)))
    }

    async fn unsubscribe_webhook(&self, webhook_id: &str) -> Result<String> {
        let data = self
            .write(
                "webhookSubscriptionDelete",
                queries::UNSUBSCRIBE_WEBHOOK,
                json!({ "id": webhook_id }),
            )
            .await?;
        let payload = mutation_payload("webhookSubscriptionDelete", data)?;
        extract_json_value(&payload, "deletedWebhookSubscriptionId", |v| {
            v.as_str().map(str::to_string)
        })
    }
}
