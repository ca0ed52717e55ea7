//! Order status lifecycle.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// Orders are created as [`Pending`](Self::Pending) and move forward through
/// the lifecycle. Skipping ahead (e.g. `Pending` straight to `Delivered`) is
/// allowed; moving backward is not. The string forms round-trip through
/// `Display`/`FromStr` and match the serialized JSON values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, not yet shipped.
    #[default]
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
}

impl OrderStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Shipped => 1,
            Self::Delivered => 2,
        }
    }

    /// Whether an order in this status may be set to `next`.
    ///
    /// Forward moves and same-status writes are allowed; backward moves are
    /// refused.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        next.rank() >= self.rank()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
