//! Integer row-id newtypes.
//!
//! Every entity key in the schema is a `SQLite` rowid (`i64`). Giving each
//! entity its own wrapper keeps a `UserId` from being passed where a
//! `ProductId` belongs: the mistake becomes a type error instead of a
//! wrong-row query.

/// Define an `i64` row-id newtype for a table.
///
/// The generated type is `Copy`, ordered, hashable, and serializes as a
/// bare JSON number (`#[serde(transparent)]`). `new` and `as_i64` convert
/// at the database boundary; `Display` prints the raw integer for logs.
///
/// ```rust
/// # use camellia_core::define_id;
/// define_id!(WishlistId, "wishlists");
///
/// let id = WishlistId::new(7);
/// assert_eq!(id.as_i64(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $table:literal) => {
        #[doc = concat!("Row id in the `", $table, "` table.")]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[doc = concat!("Wrap a raw rowid as a `", stringify!($name), "`.")]
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// The raw rowid, for binding into queries.
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::convert::From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl ::core::convert::From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.as_i64()
            }
        }
    };
}

define_id!(UserId, "users");
define_id!(ProductId, "products");
define_id!(CartId, "carts");
define_id!(CartItemId, "cart_items");
define_id!(OrderId, "orders");
define_id!(OrderItemId, "order_items");
