//! Domain models shared across repositories, services, and routes.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{NewOrder, Order, OrderItem, OrderLine};
pub use product::{NewProduct, Product, ProductPatch};
pub use user::{CurrentUser, User};

/// Default size variant when a request leaves it out.
pub(crate) fn default_size() -> String {
    "M".to_owned()
}
