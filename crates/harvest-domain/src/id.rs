//! Newtype wrappers for domain identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identifies a user account.
    UserId
);
uuid_id!(
    /// Identifies a warehouse.
    WarehouseId
);
uuid_id!(
    /// Identifies a product category.
    CategoryId
);
uuid_id!(
    /// Identifies a product.
    ProductId
);
uuid_id!(
    /// Identifies a piece of equipment.
    EquipmentId
);
uuid_id!(
    /// Identifies a shopping cart.
    CartId
);
uuid_id!(
    /// Identifies a cart line item.
    CartItemId
);
uuid_id!(
    /// Identifies an order.
    OrderId
);
