//! In-memory Shopify store for tests
//!
//! [`MockShopify`] implements [`ShopifyApi`] over fixture data, records every
//! call and can be told to fail the next one.

use crate::client::models::*;
use crate::client::ShopifyApi;
use crate::error::{Result, ShopifyError};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct StoreState {
    shop: Option<Shop>,
    currency_code: String,
    products: Vec<Product>,
    /// (collection, product ids)
    collections: Vec<(Collection, Vec<String>)>,
    orders: Vec<Order>,
    customers: Vec<Customer>,
    webhooks: Vec<WebhookSubscription>,
    discounts: Vec<CreateBasicDiscountCodeInput>,
    price_rules: Vec<PriceRule>,
    draft_orders: Vec<DraftOrder>,
    next_id: u64,
    calls: Vec<String>,
    next_failure: Option<ShopifyError>,
}

/// Fake Shopify store
#[derive(Default)]
pub struct MockShopify {
    state: Mutex<StoreState>,
}

impl MockShopify {
    /// Empty store without a shop record
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a shop, two products, a collection, two orders,
    /// a customer and a price rule
    pub fn with_fixtures() -> Self {
        let mock = Self::new();
        {
            let mut state = mock.lock();
            state.shop = Some(fixtures::shop());
            state.currency_code = "USD".to_string();
            state.products = vec![
                fixtures::product(1, "Test Product"),
                fixtures::product_with_price(2, "Other Item", "49.00"),
            ];
            state.collections = vec![(
                fixtures::collection(1, "Featured"),
                vec!["gid://shopify/Product/1".to_string()],
            )];
            state.orders = vec![fixtures::order(1, "#1001", true), fixtures::order(2, "#1002", false)];
            state.customers = vec![fixtures::customer(1)];
            state.price_rules = vec![fixtures::price_rule(1)];
            state.next_id = 100;
        }
        mock
    }

    /// Fail the next call with `error`
    pub fn fail_next(&self, error: ShopifyError) {
        self.lock().next_failure = Some(error);
    }

    /// Calls received so far, rendered as `method(args)`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn webhooks(&self) -> Vec<WebhookSubscription> {
        self.lock().webhooks.clone()
    }

    pub fn discounts(&self) -> Vec<CreateBasicDiscountCodeInput> {
        self.lock().discounts.clone()
    }

    pub fn draft_orders(&self) -> Vec<DraftOrder> {
        self.lock().draft_orders.clone()
    }

    pub fn customer(&self, id: &str) -> Option<Customer> {
        self.lock().customers.iter().find(|c| c.id == id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a call and surface any queued failure
    fn begin(&self, call: String) -> Result<MutexGuard<'_, StoreState>> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.next_failure.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn take(limit: u32) -> usize {
    limit.max(1) as usize
}

fn variant_price(variant: &ProductVariant) -> f64 {
    variant.price.parse().unwrap_or(0.0)
}

#[async_trait]
impl ShopifyApi for MockShopify {
    async fn load_shop(&self) -> Result<Shop> {
        let state = self.begin("load_shop()".to_string())?;
        state
            .shop
            .clone()
            .ok_or_else(|| ShopifyError::not_found("Shop"))
    }

    async fn load_products(&self, search_title: Option<&str>, limit: u32) -> Result<ProductList> {
        let state = self.begin(format!("load_products({search_title:?}, {limit})"))?;
        let needle = search_title.map(str::to_lowercase);
        let products = state
            .products
            .iter()
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.title.to_lowercase().contains(n))
            })
            .take(take(limit))
            .cloned()
            .collect();

        Ok(ProductList {
            products,
            currency_code: state.currency_code.clone(),
        })
    }

    async fn search_products_by_price_range(
        &self,
        min_price: Option<f64>,
        max_price: Option<f64>,
        limit: u32,
    ) -> Result<ProductList> {
        let state = self.begin(format!(
            "search_products_by_price_range({min_price:?}, {max_price:?}, {limit})"
        ))?;
        let in_range = |price: f64| {
            min_price.map_or(true, |min| price >= min) && max_price.map_or(true, |max| price <= max)
        };
        let products = state
            .products
            .iter()
            .filter(|p| p.variants.nodes().any(|v| in_range(variant_price(v))))
            .take(take(limit))
            .cloned()
            .collect();

        Ok(ProductList {
            products,
            currency_code: state.currency_code.clone(),
        })
    }

    async fn load_products_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        let state = self.begin(format!("load_products_by_ids({ids:?})"))?;
        Ok(ids
            .iter()
            .filter_map(|id| state.products.iter().find(|p| &p.id == id).cloned())
            .collect())
    }

    async fn load_products_by_collection_id(
        &self,
        collection_id: &str,
        limit: u32,
    ) -> Result<Vec<Product>> {
        let state = self.begin(format!(
            "load_products_by_collection_id({collection_id:?}, {limit})"
        ))?;
        let (_, product_ids) = state
            .collections
            .iter()
            .find(|(c, _)| c.id == collection_id)
            .ok_or_else(|| ShopifyError::not_found(format!("Collection {collection_id}")))?;

        Ok(state
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .take(take(limit))
            .cloned()
            .collect())
    }

    async fn load_variants_by_ids(&self, ids: &[String]) -> Result<Vec<ProductVariant>> {
        let state = self.begin(format!("load_variants_by_ids({ids:?})"))?;
        let mut variants = Vec::new();
        for id in ids {
            for product in &state.products {
                if let Some(variant) = product.variants.nodes().find(|v| &v.id == id) {
                    let mut variant = variant.clone();
                    variant.product = Some(VariantProduct {
                        id: product.id.clone(),
                        title: product.title.clone(),
                        description: product.description.clone(),
                    });
                    variants.push(variant);
                }
            }
        }
        Ok(variants)
    }

    async fn load_collections(&self, name: Option<&str>, limit: u32) -> Result<Vec<Collection>> {
        let state = self.begin(format!("load_collections({name:?}, {limit})"))?;
        Ok(state
            .collections
            .iter()
            .map(|(c, _)| c)
            .filter(|c| name.map_or(true, |n| c.title.eq_ignore_ascii_case(n)))
            .take(take(limit))
            .cloned()
            .collect())
    }

    async fn load_orders(
        &self,
        query: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<OrderPage> {
        let state = self.begin(format!("load_orders({query:?}, {limit}, {after:?})"))?;
        let start = after
            .and_then(|cursor| cursor.parse::<usize>().ok())
            .unwrap_or(0);
        let orders: Vec<Order> = state
            .orders
            .iter()
            .skip(start)
            .take(take(limit))
            .cloned()
            .collect();
        let end = start + orders.len();

        Ok(OrderPage {
            orders,
            next_cursor: (end < state.orders.len()).then(|| end.to_string()),
        })
    }

    async fn load_order(&self, order_id: &str) -> Result<Order> {
        let state = self.begin(format!("load_order({order_id:?})"))?;
        state
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .cloned()
            .ok_or_else(|| ShopifyError::not_found(format!("Order {order_id}")))
    }

    async fn load_customers(
        &self,
        query: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<CustomerPage> {
        let state = self.begin(format!("load_customers({query:?}, {limit}, {after:?})"))?;
        Ok(CustomerPage {
            customers: state.customers.iter().take(take(limit)).cloned().collect(),
            next_cursor: None,
        })
    }

    async fn tag_customer(&self, customer_id: &str, tags: &[String]) -> Result<()> {
        let mut state = self.begin(format!("tag_customer({customer_id:?}, {tags:?})"))?;
        let customer = state
            .customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| ShopifyError::not_found(format!("Customer {customer_id}")))?;
        for tag in tags {
            if !customer.tags.contains(tag) {
                customer.tags.push(tag.clone());
            }
        }
        Ok(())
    }

    async fn create_basic_discount_code(
        &self,
        input: &CreateBasicDiscountCodeInput,
    ) -> Result<DiscountCode> {
        let mut state = self.begin(format!("create_basic_discount_code({:?})", input.code))?;
        if state.discounts.iter().any(|d| d.code == input.code) {
            return Err(crate::error::PlatformError::new(
                "discountCodeBasicCreate was rejected: Code must be unique",
                "USER_ERROR",
            )
            .with_custom_code("basicCodeDiscount.code")
            .into());
        }
        state.next_id += 1;
        let id = format!("gid://shopify/DiscountCodeNode/{}", state.next_id);
        state.discounts.push(input.clone());
        Ok(DiscountCode {
            id,
            code: input.code.clone(),
        })
    }

    async fn get_price_rule(&self, price_rule_id: &str) -> Result<PriceRule> {
        let state = self.begin(format!("get_price_rule({price_rule_id:?})"))?;
        state
            .price_rules
            .iter()
            .find(|r| r.id == price_rule_id)
            .cloned()
            .ok_or_else(|| ShopifyError::not_found(format!("Price rule {price_rule_id}")))
    }

    async fn create_draft_order(&self, input: &CreateDraftOrderInput) -> Result<DraftOrder> {
        let mut state = self.begin(format!("create_draft_order({:?})", input.line_items))?;
        let mut total = 0.0;
        for item in &input.line_items {
            let variant = state
                .products
                .iter()
                .flat_map(|p| p.variants.nodes())
                .find(|v| v.id == item.variant_id)
                .ok_or_else(|| {
                    crate::error::PlatformError::new(
                        format!("draftOrderCreate was rejected: Variant {} does not exist", item.variant_id),
                        "USER_ERROR",
                    )
                })?;
            total += variant_price(variant) * f64::from(item.quantity);
        }

        state.next_id += 1;
        let n = state.next_id;
        let draft = DraftOrder {
            id: format!("gid://shopify/DraftOrder/{n}"),
            name: format!("#D{n}"),
            status: "OPEN".to_string(),
            invoice_url: Some(format!("https://mock-store.myshopify.com/invoices/{n}")),
            total_price_set: Some(MoneyBag {
                shop_money: Money {
                    amount: format!("{total:.2}"),
                    currency_code: state.currency_code.clone(),
                },
                presentment_money: None,
            }),
            order: None,
        };
        state.draft_orders.push(draft.clone());
        Ok(draft)
    }

    async fn complete_draft_order(
        &self,
        draft_order_id: &str,
        payment_pending: bool,
    ) -> Result<DraftOrder> {
        let mut state = self.begin(format!(
            "complete_draft_order({draft_order_id:?}, {payment_pending})"
        ))?;
        state.next_id += 1;
        let n = state.next_id;
        let draft = state
            .draft_orders
            .iter_mut()
            .find(|d| d.id == draft_order_id)
            .ok_or_else(|| ShopifyError::not_found(format!("Draft order {draft_order_id}")))?;
        if draft.order.is_some() {
            return Err(crate::error::PlatformError::new(
                "draftOrderComplete was rejected: Draft order has already been completed",
                "USER_ERROR",
            )
            .into());
        }

        draft.status = "COMPLETED".to_string();
        draft.order = Some(OrderRef {
            id: format!("gid://shopify/Order/{n}"),
            name: format!("#{n}"),
        });
        Ok(draft.clone())
    }

    async fn subscribe_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<WebhookSubscription> {
        let mut state = self.begin(format!("subscribe_webhook({topic:?}, {callback_url:?})"))?;
        state.next_id += 1;
        let webhook: WebhookSubscription = serde_json::from_value(json!({
            "id": format!("gid://shopify/WebhookSubscription/{}", state.next_id),
            "topic": topic,
            "endpoint": { "callbackUrl": callback_url },
        }))?;
        state.webhooks.push(webhook.clone());
        Ok(webhook)
    }

    async fn find_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<Option<WebhookSubscription>> {
        let state = self.begin(format!("find_webhook({topic:?}, {callback_url:?})"))?;
        Ok(state
            .webhooks
            .iter()
            .find(|w| w.topic == topic && w.callback_url() == Some(callback_url))
            .cloned())
    }

    async fn unsubscribe_webhook(&self, webhook_id: &str) -> Result<String> {
        let mut state = self.begin(format!("unsubscribe_webhook({webhook_id:?})"))?;
        let before = state.webhooks.len();
        state.webhooks.retain(|w| w.id != webhook_id);
        if state.webhooks.len() == before {
            return Err(ShopifyError::not_found(format!("Webhook {webhook_id}")));
        }
        Ok(webhook_id.to_string())
    }
}

/// Fixture builders shared by unit and integration tests
pub mod fixtures {
    use super::*;

    pub fn shop() -> Shop {
        Shop {
            id: "gid://shopify/Shop/1".to_string(),
            name: "Mock Store".to_string(),
            email: Some("owner@example.com".to_string()),
            myshopify_domain: "mock-store.myshopify.com".to_string(),
            currency_code: "USD".to_string(),
            primary_domain: None,
            plan: Some(ShopPlan {
                display_name: "Basic".to_string(),
            }),
        }
    }

    pub fn product(n: u32, title: &str) -> Product {
        product_with_price(n, title, "19.99")
    }

    /// Single-variant product priced at `price`
    pub fn product_with_price(n: u32, title: &str, price: &str) -> Product {
        let handle = title.to_lowercase().replace(' ', "-");
        let value = json!({
            "id": format!("gid://shopify/Product/{n}"),
            "title": title,
            "description": format!("Description for {title}"),
            "handle": handle,
            "publishedAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
            "options": [],
            "images": {"edges": [{"node": {
                "src": format!("https://example.com/image{n}.jpg"),
                "height": 800,
                "width": 600
            }}]},
            "variants": {"edges": [{"node": {
                "id": format!("gid://shopify/ProductVariant/{n}"),
                "title": "Default",
                "price": price,
                "sku": format!("TEST-{n}"),
                "availableForSale": true,
                "inventoryPolicy": "DENY",
                "selectedOptions": []
            }}]}
        });
        serde_json::from_value(value).unwrap_or_else(|e| panic!("product fixture: {e}"))
    }

    /// Active 10% price rule
    pub fn price_rule(n: u32) -> PriceRule {
        PriceRule {
            id: format!("gid://shopify/PriceRule/{n}"),
            title: "Spring sale".to_string(),
            status: "ACTIVE".to_string(),
            target: Some("LINE_ITEM".to_string()),
            starts_at: "2025-03-01T00:00:00Z".to_string(),
            ends_at: None,
            allocation_method: Some("ACROSS".to_string()),
            once_per_customer: true,
            value: PriceRuleValue::Percentage { percentage: -10.0 },
        }
    }

    pub fn collection(n: u32, title: &str) -> Collection {
        Collection {
            id: format!("gid://shopify/Collection/{n}"),
            title: title.to_string(),
            description: String::new(),
            handle: title.to_lowercase(),
            updated_at: None,
        }
    }

    pub fn order(n: u32, name: &str, with_customer: bool) -> Order {
        let customer = with_customer.then(|| {
            json!({
                "id": "gid://shopify/Customer/1",
                "email": "customer@example.com",
                "firstName": "Test",
                "lastName": "Customer"
            })
        });
        let value = json!({
            "id": format!("gid://shopify/Order/{n}"),
            "name": name,
            "createdAt": "2025-01-15T10:30:00Z",
            "displayFinancialStatus": "PAID",
            "displayFulfillmentStatus": "UNFULFILLED",
            "email": with_customer.then_some("customer@example.com"),
            "totalPriceSet": {"shopMoney": {"amount": "49.99", "currencyCode": "USD"}},
            "customer": customer,
            "shippingAddress": {"provinceCode": "CA", "countryCode": "US"},
            "lineItems": {"nodes": [{
                "id": format!("gid://shopify/LineItem/{n}"),
                "title": "Test Product - Medium",
                "quantity": 2,
                "originalTotalSet": {"shopMoney": {"amount": "49.98", "currencyCode": "USD"}},
                "variant": null
            }]}
        });
        serde_json::from_value(value).unwrap_or_else(|e| panic!("order fixture: {e}"))
    }

    pub fn customer(n: u32) -> Customer {
        Customer {
            id: format!("gid://shopify/Customer/{n}"),
            email: Some("customer@example.com".to_string()),
            first_name: Some("Test".to_string()),
            last_name: Some("Customer".to_string()),
            phone: None,
            tags: vec!["newsletter".to_string()],
            number_of_orders: Some("1".to_string()),
            amount_spent: Some(Money {
                amount: "49.99".to_string(),
                currency_code: "USD".to_string(),
            }),
            created_at: Some("2025-01-01T00:00:00Z".to_string()),
        }
    }
}
