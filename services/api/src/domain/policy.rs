//! Role/ownership authorization for catalog mutations.
//!
//! Pure function so every role × action × ownership combination is testable
//! without a store. Authentication (401) happens before this runs; a denial
//! here maps to 403.

use uuid::Uuid;

use harvest_domain::user::UserRole;

/// A guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MutateCategory,
    CreateWarehouse,
    MutateWarehouse,
    MutateProduct,
    MutateEquipment,
    ViewDashboard,
    ManageUsers,
}

/// Ownership requirement for warehouse-scoped actions.
#[derive(Debug, Clone, Copy)]
pub enum Ownership {
    NotRequired,
    /// The target belongs to the warehouse managed by `admin_id`.
    Warehouse { admin_id: Uuid, actor_id: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    RoleNotAllowed,
    NotOwner,
}

/// Decide whether `role` may perform `action`.
///
/// superAdmin may do everything, ownership included. warehouseAdmin may mutate
/// warehouses/products/equipment inside the warehouse it manages and see the
/// dashboard scoped to it. User management is superAdmin-only. Plain users may
/// never touch any of this.
pub fn authorize(role: UserRole, action: Action, ownership: Ownership) -> Result<(), Denial> {
    if role == UserRole::SuperAdmin {
        return Ok(());
    }

    let role_allowed = match action {
        Action::MutateCategory | Action::CreateWarehouse | Action::ManageUsers => false,
        Action::MutateWarehouse
        | Action::MutateProduct
        | Action::MutateEquipment
        | Action::ViewDashboard => role == UserRole::WarehouseAdmin,
    };
    if !role_allowed {
        return Err(Denial::RoleNotAllowed);
    }

    match ownership {
        Ownership::NotRequired => Ok(()),
        Ownership::Warehouse { admin_id, actor_id } if admin_id == actor_id => Ok(()),
        Ownership::Warehouse { .. } => Err(Denial::NotOwner),
    }
}
