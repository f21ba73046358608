//! WireMock-based Shopify Admin API mocking infrastructure
//!
//! Simulates the GraphQL endpoint of a store. Requests are routed by a
//! fragment of the GraphQL document, e.g. `"query LoadShop"`.

use super::{test_server_config, TEST_TOKEN};
use serde_json::{json, Value};
use shopify_mcp_rust::client::{GraphQlTransport, ShopifyClient, ACCESS_TOKEN_HEADER};
use shopify_mcp_rust::config::ServerConfig;
use shopify_mcp_rust::error_recovery::{RecordingSleeper, RetryExecutor};
use shopify_mcp_rust::server::ResponseCache;
use std::sync::Arc;
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const GRAPHQL_PATH: &str = "/admin/api/2024-10/graphql.json";

/// Mock Shopify store for testing
pub struct MockShopifyServer {
    pub server: MockServer,
}

impl MockShopifyServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn graphql_url(&self) -> String {
        format!("{}{}", self.server.uri(), GRAPHQL_PATH)
    }

    /// Test configuration pointing at this server
    pub fn config(&self) -> ServerConfig {
        let mut config = test_server_config();
        config.shopify.endpoint = Some(self.graphql_url().parse().expect("mock url"));
        config
    }

    pub fn transport(&self) -> GraphQlTransport {
        GraphQlTransport::new(&self.config().shopify).expect("transport")
    }

    /// Client with an instant sleeper; returns the sleeper to inspect delays
    pub fn client_with_cache(&self, cache: Arc<ResponseCache>) -> (ShopifyClient, RecordingSleeper) {
        let config = self.config();
        let sleeper = RecordingSleeper::new();
        let client = ShopifyClient::new(&config, cache)
            .expect("client")
            .with_retry_executor(RetryExecutor::with_sleeper(
                config.retry.clone(),
                Arc::new(sleeper.clone()),
            ));
        (client, sleeper)
    }

    pub fn client(&self) -> (ShopifyClient, RecordingSleeper) {
        self.client_with_cache(Arc::new(ResponseCache::new()))
    }

    fn graphql(&self, document_fragment: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(header(ACCESS_TOKEN_HEADER, TEST_TOKEN))
            .and(body_string_contains(document_fragment))
    }

    /// Answer matching requests with `{"data": data}`
    pub async fn respond_with_data(&self, document_fragment: &str, data: Value) {
        self.graphql(document_fragment)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .with_priority(5)
            .mount(&self.server)
            .await;
    }

    /// Answer the first `times` matching requests with `response`, ahead of other mocks
    pub async fn respond_first(&self, document_fragment: &str, times: u64, response: ResponseTemplate) {
        self.graphql(document_fragment)
            .respond_with(response)
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answer every matching request with `response`
    pub async fn respond_always(&self, document_fragment: &str, response: ResponseTemplate) {
        self.graphql(document_fragment)
            .respond_with(response)
            .with_priority(5)
            .mount(&self.server)
            .await;
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Bodies of all received requests, parsed as JSON
    pub async fn request_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }
}

pub fn throttled() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "errors": [{
            "message": "Throttled",
            "extensions": { "code": "THROTTLED" }
        }]
    }))
}

pub fn shop_data() -> Value {
    json!({
        "shop": {
            "id": "gid://shopify/Shop/1",
            "name": "Test Store",
            "email": "owner@example.com",
            "myshopifyDomain": "test-store.myshopify.com",
            "currencyCode": "USD",
            "primaryDomain": { "url": "https://test-store.com", "host": "test-store.com" },
            "plan": { "displayName": "Basic" }
        }
    })
}

pub fn product_node(n: u32) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{n}"),
        "title": format!("Test Product {n}"),
        "description": format!("Description for test product {n}"),
        "handle": format!("test-product-{n}"),
        "publishedAt": "2025-01-01T00:00:00Z",
        "updatedAt": "2025-01-01T00:00:00Z",
        "options": [],
        "images": { "edges": [] },
        "variants": { "edges": [{ "node": {
            "id": format!("gid://shopify/ProductVariant/{n}"),
            "title": "Default",
            "price": "19.99",
            "sku": format!("TEST-{n}"),
            "availableForSale": true,
            "inventoryPolicy": "DENY",
            "selectedOptions": []
        }}]}
    })
}

pub fn order_node(n: u32) -> Value {
    json!({
        "id": format!("gid://shopify/Order/{n}"),
        "name": format!("#100{n}"),
        "createdAt": "2025-01-15T10:30:00Z",
        "displayFinancialStatus": "PAID",
        "displayFulfillmentStatus": "FULFILLED",
        "email": "customer@example.com",
        "phone": null,
        "totalPriceSet": { "shopMoney": { "amount": "49.99", "currencyCode": "USD" } },
        "customer": {
            "id": "gid://shopify/Customer/1",
            "email": "customer@example.com",
            "firstName": "Test",
            "lastName": "Customer"
        },
        "shippingAddress": { "provinceCode": "CA", "countryCode": "US" },
        "lineItems": { "nodes": [] }
    })
}
