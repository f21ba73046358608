//! Product, variant and collection tools

use super::formatters::{format_product, format_variant};
use super::{default_limit, format_success, handle_error, CallToolResult, ToolContext, ToolRegistry};
use crate::client::models::{to_gid, ProductVariant};
use crate::error::ShopifyError;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetProductsParams {
    /// Match products whose title contains this text
    #[serde(default)]
    pub search_title: Option<String>,
    /// Maximum number of products to return
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetProductDetailsParams {
    /// Product ids, numeric or `gid://shopify/Product/...`
    pub product_ids: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetProductsByCollectionParams {
    pub collection_id: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetVariantsParams {
    /// Variant ids, numeric or `gid://shopify/ProductVariant/...`
    pub variant_ids: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetCollectionsParams {
    /// Match collections by title
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsParams {
    /// Match products whose title contains this text
    #[serde(default)]
    pub title: Option<String>,
    /// Lowest variant price, inclusive
    #[serde(default)]
    pub min_price: Option<f64>,
    /// Highest variant price, inclusive
    #[serde(default)]
    pub max_price: Option<f64>,
    /// Search one collection; takes precedence over price and title
    #[serde(default)]
    pub collection_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetInventoryStatusParams {
    /// Variant ids, numeric or `gid://shopify/ProductVariant/...`
    pub variant_ids: Vec<String>,
}

pub fn register(registry: &mut ToolRegistry) {
    registry.register(
        "get-products",
        "Get products, optionally searching by title",
        get_products,
    );
    registry.register(
        "get-product-details",
        "Get full details, variants and images for specific products",
        get_product_details,
    );
    registry.register(
        "get-products-by-collection",
        "Get the products in a collection",
        get_products_by_collection,
    );
    registry.register(
        "get-variants",
        "Get product variants by id, with their parent product",
        get_variants,
    );
    registry.register(
        "get-collections",
        "Get collections, optionally filtered by title",
        get_collections,
    );
    registry.register(
        "search-products",
        "Search products by collection, variant price range or title",
        search_products,
    );
    registry.register(
        "get-inventory-status",
        "Get price and stock status for product variants",
        get_inventory_status,
    );
}

fn require_ids(ids: &[String], what: &str) -> Result<(), ShopifyError> {
    if ids.is_empty() || ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ShopifyError::invalid_input(format!(
            "At least one non-empty {what} id is required"
        )));
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn validate_price_range(min_price: Option<f64>, max_price: Option<f64>) -> Result<(), ShopifyError> {
    if [min_price, max_price]
        .into_iter()
        .flatten()
        .any(|price| !(price.is_finite() && price >= 0.0))
    {
        return Err(ShopifyError::invalid_input("Prices must be non-negative numbers"));
    }
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Err(ShopifyError::invalid_input(format!(
                "minPrice {min} is greater than maxPrice {max}"
            )));
        }
    }
    Ok(())
}

/// Stock and price view of a variant
pub fn inventory_status(variant: &ProductVariant) -> Value {
    json!({
        "variantId": variant.id,
        "variantTitle": variant.title,
        "productTitle": variant.product.as_ref().map(|p| p.title.as_str()),
        "sku": variant.sku,
        "price": variant.price,
        "isAvailable": variant.available_for_sale,
        "inventoryPolicy": variant.inventory_policy,
        "sellsWhenOutOfStock": variant.inventory_policy == "CONTINUE",
    })
}

pub async fn get_products(context: ToolContext, params: GetProductsParams) -> CallToolResult {
    let search = params
        .search_title
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match context.client.load_products(search, params.limit).await {
        Ok(list) => format_success(&list),
        Err(e) => handle_error("Failed to fetch products", &e),
    }
}

pub async fn get_product_details(
    context: ToolContext,
    params: GetProductDetailsParams,
) -> CallToolResult {
    if let Err(e) = require_ids(&params.product_ids, "product") {
        return handle_error("Failed to fetch product details", &e);
    }
    let ids: Vec<String> = params
        .product_ids
        .iter()
        .map(|id| to_gid("Product", id.trim()))
        .collect();

    match context.client.load_products_by_ids(&ids).await {
        Ok(products) => format_success(&json!({
            "products": products,
            "summaries": products.iter().map(format_product).collect::<Vec<_>>(),
        })),
        Err(e) => handle_error("Failed to fetch product details", &e),
    }
}

pub async fn get_products_by_collection(
    context: ToolContext,
    params: GetProductsByCollectionParams,
) -> CallToolResult {
    if params.collection_id.trim().is_empty() {
        return handle_error(
            "Failed to fetch collection products",
            &ShopifyError::invalid_input("collectionId must not be empty"),
        );
    }
    let collection_id = to_gid("Collection", params.collection_id.trim());

    match context
        .client
        .load_products_by_collection_id(&collection_id, params.limit)
        .await
    {
        Ok(products) => format_success(&json!({
            "collectionId": collection_id,
            "products": products,
        })),
        Err(e) => handle_error("Failed to fetch collection products", &e),
    }
}

pub async fn get_variants(context: ToolContext, params: GetVariantsParams) -> CallToolResult {
    if let Err(e) = require_ids(&params.variant_ids, "variant") {
        return handle_error("Failed to fetch variants", &e);
    }
    let ids: Vec<String> = params
        .variant_ids
        .iter()
        .map(|id| to_gid("ProductVariant", id.trim()))
        .collect();

    match context.client.load_variants_by_ids(&ids).await {
        Ok(variants) => format_success(&json!({
            "variants": variants,
            "summaries": variants.iter().map(format_variant).collect::<Vec<_>>(),
        })),
        Err(e) => handle_error("Failed to fetch variants", &e),
    }
}

pub async fn get_collections(context: ToolContext, params: GetCollectionsParams) -> CallToolResult {
    let name = params.name.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match context.client.load_collections(name, params.limit).await {
        Ok(collections) => format_success(&collections),
        Err(e) => handle_error("Failed to fetch collections", &e),
    }
}

pub async fn search_products(context: ToolContext, params: SearchProductsParams) -> CallToolResult {
    const FAILURE: &str = "Failed to search products";

    if let Some(collection_id) = non_empty(params.collection_id.as_deref()) {
        let collection_id = to_gid("Collection", collection_id);
        return match context
            .client
            .load_products_by_collection_id(&collection_id, params.limit)
            .await
        {
            Ok(products) => format_success(&json!({
                "searchedBy": "collection",
                "collectionId": collection_id,
                "products": products,
            })),
            Err(e) => handle_error(FAILURE, &e),
        };
    }

    let list = if params.min_price.is_some() || params.max_price.is_some() {
        if let Err(e) = validate_price_range(params.min_price, params.max_price) {
            return handle_error(FAILURE, &e);
        }
        context
            .client
            .search_products_by_price_range(params.min_price, params.max_price, params.limit)
            .await
            .map(|list| ("price", list))
    } else {
        context
            .client
            .load_products(non_empty(params.title.as_deref()), params.limit)
            .await
            .map(|list| ("title", list))
    };

    match list {
        Ok((searched_by, list)) => format_success(&json!({
            "searchedBy": searched_by,
            "currencyCode": list.currency_code,
            "products": list.products,
        })),
        Err(e) => handle_error(FAILURE, &e),
    }
}

pub async fn get_inventory_status(
    context: ToolContext,
    params: GetInventoryStatusParams,
) -> CallToolResult {
    if let Err(e) = require_ids(&params.variant_ids, "variant") {
        return handle_error("Failed to fetch inventory status", &e);
    }
    let ids: Vec<String> = params
        .variant_ids
        .iter()
        .map(|id| to_gid("ProductVariant", id.trim()))
        .collect();

    match context.client.load_variants_by_ids(&ids).await {
        Ok(variants) => {
            let missing: Vec<&String> = ids
                .iter()
                .filter(|id| !variants.iter().any(|v| &v.id == *id))
                .collect();
            format_success(&json!({
                "variants": variants.iter().map(inventory_status).collect::<Vec<_>>(),
                "missing": missing,
            }))
        }
        Err(e) => handle_error("Failed to fetch inventory status", &e),
    }
}
