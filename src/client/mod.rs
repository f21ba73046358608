//! Shopify Admin API client
//!
//! [`ShopifyApi`] is the seam tool handlers depend on. [`ShopifyClient`] is the
//! production implementation over [`GraphQlTransport`], with every request run
//! through the retry executor and reads served through the expiring cache.

pub mod graphql;
pub mod models;
pub mod queries;
pub mod shopify;

use crate::error::Result;
use async_trait::async_trait;

pub use graphql::{check_user_errors, GraphQlTransport, ACCESS_TOKEN_HEADER};
pub use models::*;
pub use shopify::ShopifyClient;

/// Operations exposed to tool handlers
#[async_trait]
pub trait ShopifyApi: Send + Sync {
    /// Store details
    async fn load_shop(&self) -> Result<Shop>;

    /// Products, optionally filtered by title
    async fn load_products(&self, search_title: Option<&str>, limit: u32) -> Result<ProductList>;

    /// Products with at least one variant priced within `[min_price, max_price]`
    async fn search_products_by_price_range(
        &self,
        min_price: Option<f64>,
        max_price: Option<f64>,
        limit: u32,
    ) -> Result<ProductList>;

    /// Products by global id; unknown ids are skipped
    async fn load_products_by_ids(&self, ids: &[String]) -> Result<Vec<Product>>;

    /// Products in one collection
    async fn load_products_by_collection_id(
        &self,
        collection_id: &str,
        limit: u32,
    ) -> Result<Vec<Product>>;

    /// Variants by global id, each with its parent product summary
    async fn load_variants_by_ids(&self, ids: &[String]) -> Result<Vec<ProductVariant>>;

    /// Collections, optionally filtered by title
    async fn load_collections(&self, name: Option<&str>, limit: u32) -> Result<Vec<Collection>>;

    /// Newest orders first
    async fn load_orders(
        &self,
        query: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<OrderPage>;

    /// Single order by global id
    async fn load_order(&self, order_id: &str) -> Result<Order>;

    async fn load_customers(
        &self,
        query: Option<&str>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<CustomerPage>;

    /// Add tags to a customer
    async fn tag_customer(&self, customer_id: &str, tags: &[String]) -> Result<()>;

    async fn create_basic_discount_code(
        &self,
        input: &CreateBasicDiscountCodeInput,
    ) -> Result<DiscountCode>;

    async fn get_price_rule(&self, price_rule_id: &str) -> Result<PriceRule>;

    async fn create_draft_order(&self, input: &CreateDraftOrderInput) -> Result<DraftOrder>;

    /// Turn a draft into an order, marking payment pending or paid
    async fn complete_draft_order(
        &self,
        draft_order_id: &str,
        payment_pending: bool,
    ) -> Result<DraftOrder>;

    async fn subscribe_webhook(&self, topic: &str, callback_url: &str)
        -> Result<WebhookSubscription>;

    async fn find_webhook(
        &self,
        topic: &str,
        callback_url: &str,
    ) -> Result<Option<WebhookSubscription>>;

    /// Delete a subscription, returning the deleted id
    async fn unsubscribe_webhook(&self, webhook_id: &str) -> Result<String>;
}
