//! GraphQL documents sent to the Admin API

macro_rules! product_fields {
    () => {
        "id title description handle publishedAt updatedAt \
         options { id name values } \
         images(first: 5) { edges { node { src: url height width altText } } } \
         variants(first: 50) { edges { node { \
           id title price sku availableForSale inventoryPolicy \
           selectedOptions { name value } } } }"
    };
}

macro_rules! order_fields {
    () => {
        "id name createdAt displayFinancialStatus displayFulfillmentStatus email phone \
         totalPriceSet { shopMoney { amount currencyCode } presentmentMoney { amount currencyCode } } \
         customer { id email firstName lastName } \
         shippingAddress { provinceCode countryCode } \
         lineItems(first: 50) { nodes { id title quantity \
           originalTotalSet { shopMoney { amount currencyCode } } \
           variant { id title price sku } } }"
    };
}

macro_rules! draft_order_fields {
    () => {
        "id name status invoiceUrl \
         totalPriceSet { shopMoney { amount currencyCode } } \
         order { id name }"
    };
}

macro_rules! webhook_fields {
    () => {
        "id topic endpoint { __typename ... on WebhookHttpEndpoint { callbackUrl } }"
    };
}

pub const LOAD_SHOP: &str = "query LoadShop { shop { \
    id name email myshopifyDomain currencyCode \
    primaryDomain { url host } plan { displayName } } }";

pub const LOAD_PRODUCTS: &str = concat!(
    "query LoadProducts($first: Int!, $query: String) { ",
    "products(first: $first, query: $query) { edges { node { ",
    product_fields!(),
    " } } pageInfo { hasNextPage endCursor } } ",
    "shop { currencyCode } }"
);

pub const LOAD_PRODUCTS_BY_IDS: &str = concat!(
    "query LoadProductsByIds($ids: [ID!]!) { nodes(ids: $ids) { ... on Product { ",
    product_fields!(),
    " } } }"
);

pub const LOAD_PRODUCTS_BY_COLLECTION: &str = concat!(
    "query LoadProductsByCollection($id: ID!, $first: Int!) { collection(id: $id) { ",
    "id title products(first: $first) { edges { node { ",
    product_fields!(),
    " } } pageInfo { hasNextPage endCursor } } } }"
);

pub const LOAD_VARIANTS_BY_IDS: &str = "query LoadVariantsByIds($ids: [ID!]!) { \
    nodes(ids: $ids) { ... on ProductVariant { \
    id title price sku availableForSale inventoryPolicy \
    selectedOptions { name value } \
    product { id title description } } } }";

pub const LOAD_COLLECTIONS: &str = "query LoadCollections($first: Int!, $query: String) { \
    collections(first: $first, query: $query) { \
    edges { node { id title description handle updatedAt } } \
    pageInfo { hasNextPage endCursor } } }";

pub const LOAD_ORDERS: &str = concat!(
    "query LoadOrders($first: Int!, $after: String, $query: String) { ",
    "orders(first: $first, after: $after, query: $query, reverse: true) { edges { node { ",
    order_fields!(),
    " } } pageInfo { hasNextPage endCursor } } }"
);

pub const LOAD_ORDER: &str = concat!(
    "query LoadOrder($id: ID!) { order(id: $id) { ",
    order_fields!(),
    " } }"
);

pub const LOAD_CUSTOMERS: &str = "query LoadCustomers($first: Int!, $after: String, $query: String) { \
    customers(first: $first, after: $after, query: $query) { \
    edges { node { id email firstName lastName phone tags numberOfOrders createdAt \
    amountSpent { amount currencyCode } } } \
    pageInfo { hasNextPage endCursor } } }";

pub const TAG_CUSTOMER: &str = "mutation TagCustomer($id: ID!, $tags: [String!]!) { \
    tagsAdd(id: $id, tags: $tags) { node { id } userErrors { field message } } }";

pub const CREATE_BASIC_DISCOUNT_CODE: &str =
    "mutation CreateBasicDiscountCode($basicCodeDiscount: DiscountCodeBasicInput!) { \
    discountCodeBasicCreate(basicCodeDiscount: $basicCodeDiscount) { \
    codeDiscountNode { id } userErrors { field code message } } }";

pub const GET_PRICE_RULE: &str = "query GetPriceRule($id: ID!) { priceRule(id: $id) { \
    id title status target startsAt endsAt allocationMethod oncePerCustomer \
    valueV2 { ... on MoneyV2 { amount currencyCode } \
    ... on PricingPercentageValue { percentage } } } }";

pub const CREATE_DRAFT_ORDER: &str = concat!(
    "mutation CreateDraftOrder($input: DraftOrderInput!) { ",
    "draftOrderCreate(input: $input) { draftOrder { ",
    draft_order_fields!(),
    " } userErrors { field message } } }"
);

pub const COMPLETE_DRAFT_ORDER: &str = concat!(
    "mutation CompleteDraftOrder($id: ID!, $paymentPending: Boolean) { ",
    "draftOrderComplete(id: $id, paymentPending: $paymentPending) { draftOrder { ",
    draft_order_fields!(),
    " } userErrors { field message } } }"
);

pub const SUBSCRIBE_WEBHOOK: &str = concat!(
    "mutation SubscribeWebhook($topic: WebhookSubscriptionTopic!, ",
    "$webhookSubscription: WebhookSubscriptionInput!) { ",
    "webhookSubscriptionCreate(topic: $topic, webhookSubscription: $webhookSubscription) { ",
    "webhookSubscription { ",
    webhook_fields!(),
    " } userErrors { field message } } }"
);

pub const FIND_WEBHOOKS: &str = concat!(
    "query FindWebhooks($topics: [WebhookSubscriptionTopic!], $callbackUrl: URL) { ",
    "webhookSubscriptions(first: 10, topics: $topics, callbackUrl: $callbackUrl) { ",
    "edges { node { ",
    webhook_fields!(),
    " } } } }"
);

pub const UNSUBSCRIBE_WEBHOOK: &str = "mutation UnsubscribeWebhook($id: ID!) { \
    webhookSubscriptionDelete(id: $id) { \
    deletedWebhookSubscriptionId userErrors { field message } } }";
