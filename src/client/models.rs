//! Shopify Admin GraphQL data shapes
//!
//! Field names follow the GraphQL schema (`camelCase`). Only the fields the
//! queries in [`super::queries`] select are modelled.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Relay-style connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            edges: Vec::new(),
            page_info: None,
        }
    }
}

impl<T> Connection<T> {
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }

    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }

    /// Cursor for the next page, if there is one
    pub fn next_cursor(&self) -> Option<String> {
        self.page_info
            .as_ref()
            .filter(|info| info.has_next_page)
            .and_then(|info| info.end_cursor.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Plain `nodes` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeList<T> {
    pub nodes: Vec<T>,
}

impl<T> Default for NodeList<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub myshopify_domain: String,
    pub currency_code: String,
    pub primary_domain: Option<ShopDomain>,
    pub plan: Option<ShopPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopDomain {
    pub url: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopPlan {
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub handle: String,
    pub published_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub images: Connection<ProductImage>,
    #[serde(default)]
    pub variants: Connection<ProductVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: String,
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub src: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    pub price: String,
    pub sku: Option<String>,
    pub available_for_sale: bool,
    pub inventory_policy: String,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<VariantProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// Parent product summary attached to a variant lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Product search result with the shop currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub products: Vec<Product>,
    pub currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub handle: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub amount: String,
    pub currency_code: String,
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBag {
    pub shop_money: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentment_money: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub display_financial_status: Option<String>,
    pub display_fulfillment_status: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_price_set: MoneyBag,
    pub customer: Option<OrderCustomer>,
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub line_items: NodeList<LineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub province_code: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    pub original_total_set: Option<MoneyBag>,
    pub variant: Option<LineItemVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemVariant {
    pub id: String,
    pub title: String,
    pub price: Option<String>,
    pub sku: Option<String>,
}

/// One page of orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unsigned 64-bit count, transported as a string
    pub number_of_orders: Option<String>,
    pub amount_spent: Option<Money>,
    pub created_at: Option<String>,
}

/// One page of customers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiscountValueType {
    /// Fraction between 0 and 1
    Percentage,
    /// Amount in shop currency
    FixedAmount,
}

/// Discount stacking rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CombinesWith {
    pub product_discounts: bool,
    pub order_discounts: bool,
    pub shipping_discounts: bool,
}

/// Input for a basic code discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBasicDiscountCodeInput {
    /// Internal discount title
    pub title: String,
    /// Code customers enter at checkout
    pub code: String,
    /// ISO 8601 start time
    pub starts_at: String,
    /// ISO 8601 end time
    #[serde(default)]
    pub ends_at: Option<String>,
    pub value_type: DiscountValueType,
    /// Fraction for percentages (0.1 = 10%), amount for fixed discounts
    pub value: f64,
    /// Restrict to these collections; empty applies to all items
    #[serde(default)]
    pub include_collection_ids: Vec<String>,
    #[serde(default)]
    pub applies_once_per_customer: bool,
    #[serde(default)]
    pub combines_with: CombinesWith,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub id: String,
    pub code: String,
}

/// Legacy price rule behind a discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRule {
    pub id: String,
    pub title: String,
    pub status: String,
    pub target: Option<String>,
    pub starts_at: String,
    pub ends_at: Option<String>,
    pub allocation_method: Option<String>,
    #[serde(default)]
    pub once_per_customer: bool,
    #[serde(alias = "valueV2")]
    pub value: PriceRuleValue,
}

/// `PricingValue` union: a percentage or a money amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceRuleValue {
    Percentage { percentage: f64 },
    Amount(Money),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderLineItemInput {
    /// Variant id, numeric or `gid://shopify/ProductVariant/...`
    pub variant_id: String,
    pub quantity: u32,
}

/// Input for a draft order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftOrderInput {
    pub line_items: Vec<DraftOrderLineItemInput>,
    /// Customer email for the invoice
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Customer id, numeric or `gid://shopify/Customer/...`
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrder {
    pub id: String,
    pub name: String,
    /// `OPEN`, `INVOICE_SENT` or `COMPLETED`
    pub status: String,
    pub invoice_url: Option<String>,
    pub total_price_set: Option<MoneyBag>,
    /// Order created when the draft was completed
    pub order: Option<OrderRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub endpoint: Option<WebhookEndpoint>,
}

impl WebhookSubscription {
    pub fn callback_url(&self) -> Option<&str> {
        self.endpoint.as_ref()?.callback_url.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEndpoint {
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Numeric part of a Shopify global id (`gid://shopify/Product/123` -> `123`)
pub fn get_id_from_gid(gid: &str) -> &str {
    let tail = gid.rsplit('/').next().unwrap_or(gid);
    tail.split('?').next().unwrap_or(tail)
}

/// Expand a bare numeric id into a global id; global ids pass through
pub fn to_gid(resource: &str, id: &str) -> String {
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/{resource}/{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_id_from_gid() {
        assert_eq!(get_id_from_gid("gid://shopify/Product/12345678"), "12345678");
        assert_eq!(get_id_from_gid("gid://shopify/Customer/7?x=1"), "7");
        assert_eq!(get_id_from_gid("42"), "42");
    }

    #[test]
    fn test_to_gid() {
        assert_eq!(to_gid("Order", "1001"), "gid://shopify/Order/1001");
        assert_eq!(to_gid("Order", "gid://shopify/Order/1"), "gid://shopify/Order/1");
    }

    #[test]
    fn test_product_deserializes_from_graphql_shape() {
        let product: Product = serde_json::from_value(json!({
            "id": "gid://shopify/Product/1",
            "title": "Test Product 1",
            "description": "Description for test product 1",
            "handle": "test-product-1",
            "publishedAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z",
            "options": [{"id": "gid://shopify/ProductOption/1", "name": "Size", "values": ["S", "M"]}],
            "variants": {"edges": [{"node": {
                "id": "gid://shopify/ProductVariant/1",
                "title": "Small",
                "price": "19.99",
                "sku": "TEST-1-S",
                "availableForSale": true,
                "inventoryPolicy": "DENY",
                "selectedOptions": [{"name": "Size", "value": "S"}]
            }}]},
            "images": {"edges": [{"node": {"src": "https://example.com/image1.jpg", "height": 800, "width": 600}}]}
        }))
        .unwrap();

        assert_eq!(product.variants.nodes().count(), 1);
        assert_eq!(product.images.into_nodes()[0].width, Some(600));
    }

    #[test]
    fn test_connection_next_cursor() {
        let page: Connection<Collection> = serde_json::from_value(json!({
            "edges": [],
            "pageInfo": {"hasNextPage": false, "endCursor": "end123"}
        }))
        .unwrap();
        assert_eq!(page.next_cursor(), None);

        let page: Connection<Collection> = serde_json::from_value(json!({
            "edges": [],
            "pageInfo": {"hasNextPage": true, "endCursor": "end123"}
        }))
        .unwrap();
        assert_eq!(page.next_cursor().as_deref(), Some("end123"));
    }

    #[test]
    fn test_price_rule_value_union() {
        let rule: PriceRule = serde_json::from_value(json!({
            "id": "gid://shopify/PriceRule/1",
            "title": "Spring sale",
            "status": "ACTIVE",
            "target": "LINE_ITEM",
            "startsAt": "2025-03-01T00:00:00Z",
            "endsAt": null,
            "allocationMethod": "ACROSS",
            "oncePerCustomer": true,
            "valueV2": { "percentage": -10.0 }
        }))
        .unwrap();
        assert_eq!(rule.value, PriceRuleValue::Percentage { percentage: -10.0 });

        let value: PriceRuleValue =
            serde_json::from_value(json!({ "amount": "5.0", "currencyCode": "USD" })).unwrap();
        assert!(matches!(value, PriceRuleValue::Amount(money) if money.amount == "5.0"));
    }

    #[test]
    fn test_discount_input_accepts_snake_case_value_type() {
        let input: CreateBasicDiscountCodeInput = serde_json::from_value(json!({
            "title": "Test Discount",
            "code": "TEST123",
            "startsAt": "2025-01-01T00:00:00Z",
            "valueType": "percentage",
            "value": 0.1,
            "appliesOncePerCustomer": true
        }))
        .unwrap();

        assert_eq!(input.value_type, DiscountValueType::Percentage);
        assert!(input.include_collection_ids.is_empty());
        assert_eq!(input.combines_with, CombinesWith::default());
    }
}
