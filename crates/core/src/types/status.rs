//! Status enums for orders.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
///
/// `Delivered` is terminal for cost purposes: the first transition into it
/// freezes the order's recorded cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order received, not yet handed to the carrier.
    #[default]
    Pending,
    /// Parcel handed to the carrier.
    Shipped,
    /// Carrier reported delivery. Terminal for cost finalization.
    Delivered,
}

impl OrderStatus {
    /// Whether this status finalizes the order's recorded cost.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_order_status_display_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let parsed = OrderStatus::from_str(&status.to_string()).expect("roundtrip");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_order_status_from_str_invalid() {
        assert!(OrderStatus::from_str("returned").is_err());
    }

    #[test]
    fn test_order_status_serde_snake_case() {
        let json = serde_json::to_string(&OrderStatus::Shipped).expect("serialize");
        assert_eq!(json, "\"shipped\"");
    }
}
