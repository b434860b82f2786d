pub const DEFAULT_PRODUCTS_COLLECTION: &str = "products";

pub const DEFAULT_ORDERS_COLLECTION: &str = "orders";

pub const DEFAULT_CART_COLLECTION: &str = "cart";
