//! Operator-readable text renderings of Shopify entities

use crate::client::models::{Customer, Order, Product, ProductVariant};
use std::fmt::Write;

const NOT_AVAILABLE: &str = "N/A";

fn or_na(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(NOT_AVAILABLE)
}

/// Render a product with all of its variants
pub fn format_product(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Product: {}", product.title);
    let _ = writeln!(out, "ID: {}", product.id);
    let _ = writeln!(out, "Handle: {}", product.handle);
    let _ = writeln!(out, "Description: {}", or_na(Some(&product.description)));

    if !product.options.is_empty() {
        let _ = writeln!(out, "Options:");
        for option in &product.options {
            let _ = writeln!(out, "  {}: {}", option.name, option.values.join(", "));
        }
    }

    let _ = writeln!(out, "Variants:");
    for variant in product.variants.nodes() {
        for line in format_variant(variant).lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    if let Some(image) = product.images.nodes().next() {
        let _ = writeln!(out, "Image: {}", image.src);
    }

    out.trim_end().to_string()
}

pub fn format_variant(variant: &ProductVariant) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "- {} ({})", variant.title, variant.id);
    let _ = writeln!(out, "  Price: {}", variant.price);
    let _ = writeln!(out, "  SKU: {}", or_na(variant.sku.as_deref()));
    let _ = writeln!(out, "  Available for sale: {}", variant.available_for_sale);
    let _ = write!(out, "  Inventory policy: {}", variant.inventory_policy);

    if !variant.selected_options.is_empty() {
        let options = variant
            .selected_options
            .iter()
            .map(|o| format!("{}={}", o.name, o.value))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "\n  Options: {options}");
    }
    out
}

/// Render an order summary with its line items
pub fn format_order(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Order: {} ({})", order.name, order.id);
    let _ = writeln!(out, "Created: {}", order.created_at);
    let _ = writeln!(
        out,
        "Financial status: {}",
        or_na(order.display_financial_status.as_deref())
    );
    if let Some(status) = order.display_fulfillment_status.as_deref() {
        let _ = writeln!(out, "Fulfillment status: {status}");
    }
    let _ = writeln!(out, "Email: {}", or_na(order.email.as_deref()));
    let _ = writeln!(out, "Total: {}", order.total_price_set.shop_money);

    match &order.customer {
        Some(customer) => {
            let name = [customer.first_name.as_deref(), customer.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            let _ = writeln!(
                out,
                "Customer: {} <{}> ({})",
                or_na(Some(&name)),
                or_na(customer.email.as_deref()),
                customer.id
            );
        }
        None => {
            let _ = writeln!(out, "Customer: Guest checkout");
        }
    }

    if let Some(address) = &order.shipping_address {
        let _ = writeln!(
            out,
            "Ships to: {}, {}",
            or_na(address.province_code.as_deref()),
            or_na(address.country_code.as_deref())
        );
    }

    let _ = writeln!(out, "Line items:");
    for item in &order.line_items.nodes {
        let total = item
            .original_total_set
            .as_ref()
            .map(|set| set.shop_money.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let _ = writeln!(out, "  - {} x{} ({})", item.title, item.quantity, total);
    }

    out.trim_end().to_string()
}

pub fn format_customer(customer: &Customer) -> String {
    let name = [customer.first_name.as_deref(), customer.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::new();
    let _ = writeln!(out, "Customer: {} ({})", or_na(Some(&name)), customer.id);
    let _ = writeln!(out, "Email: {}", or_na(customer.email.as_deref()));
    let _ = writeln!(out, "Orders: {}", or_na(customer.number_of_orders.as_deref()));
    if let Some(spent) = &customer.amount_spent {
        let _ = writeln!(out, "Amount spent: {spent}");
    }
    let tags = if customer.tags.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        customer.tags.join(", ")
    };
    let _ = write!(out, "Tags: {tags}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(value: serde_json::Value) -> Order {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_format_product_lists_variants() {
        let product: Product = serde_json::from_value(json!({
            "id": "gid://shopify/Product/123",
            "title": "Test Product",
            "description": "A product for testing",
            "handle": "test-product",
            "options": [],
            "images": {"edges": []},
            "variants": {"edges": [{"node": {
                "id": "gid://shopify/ProductVariant/456",
                "title": "Small",
                "price": "19.99",
                "sku": "TEST-S",
                "availableForSale": true,
                "inventoryPolicy": "DENY",
                "selectedOptions": [{"name": "Size", "value": "Small"}]
            }}]}
        }))
        .unwrap();

        let text = format_product(&product);
        for expected in [
            "Test Product",
            "A product for testing",
            "test-product",
            "Small",
            "19.99",
            "TEST-S",
            "DENY",
        ] {
            assert!(text.contains(expected), "missing {expected} in {text}");
        }
    }

    #[test]
    fn test_format_variant_without_sku() {
        let variant: ProductVariant = serde_json::from_value(json!({
            "id": "gid://shopify/ProductVariant/789",
            "title": "Medium",
            "price": "24.99",
            "sku": "",
            "availableForSale": true,
            "inventoryPolicy": "CONTINUE"
        }))
        .unwrap();

        let text = format_variant(&variant);
        assert!(text.contains("SKU: N/A"));
        assert!(text.contains("CONTINUE"));
        assert!(text.contains("true"));
    }

    #[test]
    fn test_format_order() {
        let text = format_order(&order(json!({
            "id": "gid://shopify/Order/12345",
            "name": "#1001",
            "createdAt": "2025-01-15T10:30:00Z",
            "displayFinancialStatus": "PAID",
            "email": "customer@example.com",
            "totalPriceSet": {"shopMoney": {"amount": "49.99", "currencyCode": "USD"}},
            "customer": {"id": "gid://shopify/Customer/789", "email": "customer@example.com"},
            "shippingAddress": {"provinceCode": "CA", "countryCode": "US"},
            "lineItems": {"nodes": [{
                "id": "gid://shopify/LineItem/111",
                "title": "Test Product - Medium",
                "quantity": 2,
                "originalTotalSet": {"shopMoney": {"amount": "49.98", "currencyCode": "USD"}},
                "variant": null
            }]}
        })));

        for expected in [
            "#1001",
            "gid://shopify/Order/12345",
            "2025-01-15T10:30:00Z",
            "PAID",
            "customer@example.com",
            "49.99 USD",
            "Test Product - Medium x2",
        ] {
            assert!(text.contains(expected), "missing {expected} in {text}");
        }
    }

    #[test]
    fn test_format_guest_order() {
        let text = format_order(&order(json!({
            "id": "gid://shopify/Order/12346",
            "name": "#1002",
            "createdAt": "2025-01-16T12:30:00Z",
            "displayFinancialStatus": "PENDING",
            "email": null,
            "totalPriceSet": {"shopMoney": {"amount": "29.99", "currencyCode": "USD"}},
            "customer": null,
            "shippingAddress": null,
            "lineItems": {"nodes": []}
        })));

        assert!(text.contains("#1002"));
        assert!(text.contains("Guest checkout"));
        assert!(text.contains("Email: N/A"));
    }

    #[test]
    fn test_format_customer_tags() {
        let customer: Customer = serde_json::from_value(json!({
            "id": "gid://shopify/Customer/1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "tags": ["vip", "wholesale"],
            "numberOfOrders": "3"
        }))
        .unwrap();

        let text = format_customer(&customer);
        assert!(text.contains("Ada Lovelace"));
        assert!(text.contains("vip, wholesale"));
        assert!(text.contains("Email: N/A"));
    }
}
