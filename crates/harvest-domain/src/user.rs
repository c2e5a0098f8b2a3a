//! User role hierarchy.

use serde::{Deserialize, Serialize};

/// User permission level.
///
/// Wire format: `u8` (0 = user, 1 = warehouseAdmin, 2 = superAdmin).
/// JSON names match the legacy API (`"user"`, `"warehouseAdmin"`, `"superAdmin"`).
///
/// Ordering reflects dashboard visibility only; mutation rights are decided
/// per action by the authorization policy, not by rank comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRole {
    User = 0,
    WarehouseAdmin = 1,
    SuperAdmin = 2,
}

impl UserRole {
    /// Convert from `u8` wire value. Returns `None` for unknown values.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::User),
            1 => Some(Self::WarehouseAdmin),
            2 => Some(Self::SuperAdmin),
            _ => None,
        }
    }

    /// Convert to `u8` wire value.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl PartialOrd for UserRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_u8().cmp(&other.as_u8())
    }
}
