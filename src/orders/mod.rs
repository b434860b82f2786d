//! Orders: paged reads of the orders collection with every order's cart
//! attached, plus deletion.

pub mod error;
mod model;
mod pager;

pub use error::{OrderError, OrderErrorCode, OrderResult};
pub use model::{CartItem, CartItemConverter, Order, OrderConverter};
pub use pager::{
    CartLookup, OrderCursor, OrderPage, OrderPager, OrderPagerConfig, DEFAULT_ORDER_PAGE_SIZE,
};
