//! Domain models shared between the server and its frontends

mod order;
mod store_info;

pub use order::{Order, OrderFeedback, OrderItem, OrderStatus, ShippingMethod};
pub use store_info::StoreInfo;
