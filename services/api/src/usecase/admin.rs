use harvest_domain::id::{UserId, WarehouseId};
use harvest_domain::user::UserRole;

use crate::domain::policy::{Action, Ownership, authorize};
use crate::domain::repository::{EquipmentRepository, UserRepository, WarehouseRepository};
use crate::domain::types::User;
use crate::error::ApiError;

// ── DashboardStats ───────────────────────────────────────────────────────────

/// Dashboard counters, scoped by the caller's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardStats {
    /// Platform-wide counts (superAdmin).
    Global {
        users: u64,
        warehouses: u64,
        equipments: u64,
    },
    /// Counts for the one warehouse the caller manages (warehouseAdmin).
    Warehouse {
        warehouse_id: WarehouseId,
        warehouse_name: String,
        equipments: u64,
    },
}

pub struct DashboardStatsUseCase<U, W, E>
where
    U: UserRepository,
    W: WarehouseRepository,
    E: EquipmentRepository,
{
    pub users: U,
    pub warehouses: W,
    pub equipments: E,
}

impl<U, W, E> DashboardStatsUseCase<U, W, E>
where
    U: UserRepository,
    W: WarehouseRepository,
    E: EquipmentRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
    ) -> Result<DashboardStats, ApiError> {
        authorize(role, Action::ViewDashboard, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;

        if role == UserRole::SuperAdmin {
            return Ok(DashboardStats::Global {
                users: self.users.count().await?,
                warehouses: self.warehouses.count().await?,
                equipments: self.equipments.count().await?,
            });
        }

        let warehouse = self
            .warehouses
            .find_by_admin(actor_id)
            .await?
            .ok_or(ApiError::WarehouseNotFound)?;
        Ok(DashboardStats::Warehouse {
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name,
            equipments: self.equipments.count_by_warehouse(warehouse.id).await?,
        })
    }
}

// ── ListUsers / GetUser ──────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self, role: UserRole) -> Result<Vec<User>, ApiError> {
        authorize(role, Action::ManageUsers, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;
        self.users.list().await
    }
}

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, role: UserRole, id: UserId) -> Result<User, ApiError> {
        authorize(role, Action::ManageUsers, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── UpdateUserRole ───────────────────────────────────────────────────────────

pub struct UpdateUserRoleUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UpdateUserRoleUseCase<U> {
    /// The only way an account acquires warehouseAdmin or superAdmin; signup
    /// always produces a plain user.
    pub async fn execute(
        &self,
        actor_role: UserRole,
        id: UserId,
        new_role: UserRole,
    ) -> Result<User, ApiError> {
        authorize(actor_role, Action::ManageUsers, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        self.users.update_role(user.id, new_role).await?;
        self.users
            .find_by_id(user.id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use harvest_domain::id::EquipmentId;
    use harvest_domain::pagination::PageRequest;

    use crate::domain::types::{
        Equipment, EquipmentFilter, EquipmentPatch, EquipmentSortBy, UserProfilePatch, Warehouse,
        WarehousePatch,
    };
    use crate::usecase::auth::hash_password;
    use crate::usecase::warehouse::{CreateWarehouseInput, CreateWarehouseUseCase};

    #[derive(Clone, Default)]
    struct MockUserRepo {
        users: Arc<Mutex<Vec<User>>>,
    }

    impl UserRepository for MockUserRepo {
        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<User>, ApiError> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.users.lock().unwrap().len() as u64)
        }

        async fn create(&self, user: &User) -> Result<(), ApiError> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }

        async fn update_role(&self, id: UserId, role: UserRole) -> Result<(), ApiError> {
            let mut users = self.users.lock().unwrap();
            let user = users.iter_mut().find(|u| u.id == id).unwrap();
            user.role = role;
            Ok(())
        }

        async fn update_profile(
            &self,
            _id: UserId,
            _patch: &UserProfilePatch,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn set_otp(
            &self,
            _id: UserId,
            _otp: Option<i32>,
            _expires_at: Option<DateTime<Utc>>,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn mark_verified(&self, _id: UserId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn update_password(&self, _id: UserId, _hash: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MockWarehouseRepo {
        warehouses: Arc<Mutex<Vec<Warehouse>>>,
    }

    impl WarehouseRepository for MockWarehouseRepo {
        async fn list_active(&self) -> Result<Vec<Warehouse>, ApiError> {
            Ok(self.warehouses.lock().unwrap().clone())
        }

        async fn find_by_id(&self, id: WarehouseId) -> Result<Option<Warehouse>, ApiError> {
            Ok(self
                .warehouses
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.id == id)
                .cloned())
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<Warehouse>, ApiError> {
            Ok(self
                .warehouses
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.name == name)
                .cloned())
        }

        async fn find_by_admin(&self, admin_id: UserId) -> Result<Option<Warehouse>, ApiError> {
            Ok(self
                .warehouses
                .lock()
                .unwrap()
                .iter()
                .find(|w| w.admin_id == admin_id)
                .cloned())
        }

        async fn create(&self, warehouse: &Warehouse) -> Result<(), ApiError> {
            self.warehouses.lock().unwrap().push(warehouse.clone());
            Ok(())
        }

        async fn update(&self, _id: WarehouseId, _patch: &WarehousePatch) -> Result<(), ApiError> {
            Ok(())
        }

        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.warehouses.lock().unwrap().len() as u64)
        }
    }

    #[derive(Clone, Default)]
    struct MockEquipmentRepo {
        equipments: Arc<Mutex<Vec<Equipment>>>,
    }

    impl EquipmentRepository for MockEquipmentRepo {
        async fn list(
            &self,
            _filter: &EquipmentFilter,
            _sort_by: EquipmentSortBy,
            _page: PageRequest,
        ) -> Result<Vec<Equipment>, ApiError> {
            Ok(vec![])
        }

        async fn search(
            &self,
            _query: &str,
            _page: PageRequest,
        ) -> Result<Vec<Equipment>, ApiError> {
            Ok(vec![])
        }

        async fn find_by_id(&self, _id: EquipmentId) -> Result<Option<Equipment>, ApiError> {
            Ok(None)
        }

        async fn create(&self, equipment: &Equipment) -> Result<(), ApiError> {
            self.equipments.lock().unwrap().push(equipment.clone());
            Ok(())
        }

        async fn update(&self, _id: EquipmentId, _patch: &EquipmentPatch) -> Result<(), ApiError> {
            Ok(())
        }

        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.equipments.lock().unwrap().len() as u64)
        }

        async fn count_by_warehouse(&self, warehouse_id: WarehouseId) -> Result<u64, ApiError> {
            Ok(self
                .equipments
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.warehouse_id == warehouse_id)
                .count() as u64)
        }
    }

    fn test_user(role: UserRole) -> User {
        let now = Utc::now();
        let id = Uuid::now_v7();
        User {
            id: UserId(id),
            first_name: "Alice".into(),
            last_name: "Farmer".into(),
            email: format!("{id}@example.com"),
            phone: "+31600000000".into(),
            country: "NL".into(),
            password_hash: hash_password("pw").unwrap(),
            profile_image: None,
            role,
            is_verified: true,
            otp: None,
            otp_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_warehouse(admin_id: UserId) -> Warehouse {
        let now = Utc::now();
        Warehouse {
            id: WarehouseId(Uuid::now_v7()),
            name: "North Depot".into(),
            location: "Groningen".into(),
            capacity: 500,
            admin_id,
            image: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_equipment(warehouse_id: WarehouseId) -> Equipment {
        let now = Utc::now();
        Equipment {
            id: EquipmentId(Uuid::now_v7()),
            name: "Seed drill".into(),
            description: "3m seed drill".into(),
            price_cents: 1_200_000,
            category: "sowing".into(),
            manufacturer: "Agrico".into(),
            warehouse_id,
            in_stock: 2,
            images: vec![],
            specifications: serde_json::json!({}),
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn should_deny_dashboard_to_plain_users() {
        let usecase = DashboardStatsUseCase {
            users: MockUserRepo::default(),
            warehouses: MockWarehouseRepo::default(),
            equipments: MockEquipmentRepo::default(),
        };
        let result = usecase
            .execute(UserId(Uuid::now_v7()), UserRole::User)
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn should_report_global_counts_to_super_admin() {
        let users = MockUserRepo::default();
        users.users.lock().unwrap().push(test_user(UserRole::User));
        users
            .users
            .lock()
            .unwrap()
            .push(test_user(UserRole::SuperAdmin));
        let warehouses = MockWarehouseRepo::default();
        let admin_id = UserId(Uuid::now_v7());
        let warehouse = test_warehouse(admin_id);
        let equipments = MockEquipmentRepo::default();
        equipments
            .equipments
            .lock()
            .unwrap()
            .push(test_equipment(warehouse.id));
        warehouses.warehouses.lock().unwrap().push(warehouse);

        let usecase = DashboardStatsUseCase {
            users,
            warehouses,
            equipments,
        };
        let stats = usecase
            .execute(UserId(Uuid::now_v7()), UserRole::SuperAdmin)
            .await
            .unwrap();

        assert_eq!(
            stats,
            DashboardStats::Global {
                users: 2,
                warehouses: 1,
                equipments: 1,
            }
        );
    }

    #[tokio::test]
    async fn should_scope_dashboard_to_managed_warehouse() {
        let admin_id = UserId(Uuid::now_v7());
        let warehouses = MockWarehouseRepo::default();
        let mine = test_warehouse(admin_id);
        let mine_id = mine.id;
        let mut other = test_warehouse(UserId(Uuid::now_v7()));
        other.name = "South Depot".into();

        let equipments = MockEquipmentRepo::default();
        {
            let mut guard = equipments.equipments.lock().unwrap();
            guard.push(test_equipment(mine_id));
            guard.push(test_equipment(mine_id));
            guard.push(test_equipment(other.id));
        }
        {
            let mut guard = warehouses.warehouses.lock().unwrap();
            guard.push(mine);
            guard.push(other);
        }

        let usecase = DashboardStatsUseCase {
            users: MockUserRepo::default(),
            warehouses,
            equipments,
        };
        let stats = usecase
            .execute(admin_id, UserRole::WarehouseAdmin)
            .await
            .unwrap();

        assert_eq!(
            stats,
            DashboardStats::Warehouse {
                warehouse_id: mine_id,
                warehouse_name: "North Depot".into(),
                equipments: 2,
            }
        );
    }

    #[tokio::test]
    async fn should_404_dashboard_for_admin_without_warehouse() {
        let usecase = DashboardStatsUseCase {
            users: MockUserRepo::default(),
            warehouses: MockWarehouseRepo::default(),
            equipments: MockEquipmentRepo::default(),
        };
        let result = usecase
            .execute(UserId(Uuid::now_v7()), UserRole::WarehouseAdmin)
            .await;
        assert!(matches!(result, Err(ApiError::WarehouseNotFound)));
    }

    #[tokio::test]
    async fn should_keep_user_listing_super_admin_only() {
        let users = MockUserRepo::default();
        users.users.lock().unwrap().push(test_user(UserRole::User));
        let usecase = ListUsersUseCase {
            users: users.clone(),
        };

        for role in [UserRole::User, UserRole::WarehouseAdmin] {
            assert!(matches!(
                usecase.execute(role).await,
                Err(ApiError::Forbidden)
            ));
        }

        let listed = usecase.execute(UserRole::SuperAdmin).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn should_404_unknown_user_lookup() {
        let usecase = GetUserUseCase {
            users: MockUserRepo::default(),
        };
        let result = usecase
            .execute(UserRole::SuperAdmin, UserId(Uuid::now_v7()))
            .await;
        assert!(matches!(result, Err(ApiError::UserNotFound)));
    }

    #[tokio::test]
    async fn should_promote_user_to_warehouse_admin_who_can_then_be_assigned() {
        let users = MockUserRepo::default();
        let account = test_user(UserRole::User);
        let account_id = account.id;
        users.users.lock().unwrap().push(account);

        let promoted = UpdateUserRoleUseCase {
            users: users.clone(),
        }
        .execute(UserRole::SuperAdmin, account_id, UserRole::WarehouseAdmin)
        .await
        .unwrap();
        assert_eq!(promoted.role, UserRole::WarehouseAdmin);

        // the promoted account now passes warehouse assignment end to end
        let warehouse = CreateWarehouseUseCase {
            warehouses: MockWarehouseRepo::default(),
            users,
        }
        .execute(
            UserRole::SuperAdmin,
            CreateWarehouseInput {
                name: "North Depot".into(),
                location: "Groningen".into(),
                capacity: 500,
                admin_id: account_id,
                image: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(warehouse.admin_id, account_id);
    }

    #[tokio::test]
    async fn should_deny_role_change_to_non_super_admins() {
        let users = MockUserRepo::default();
        let account = test_user(UserRole::User);
        let account_id = account.id;
        users.users.lock().unwrap().push(account);

        let usecase = UpdateUserRoleUseCase {
            users: users.clone(),
        };
        let result = usecase
            .execute(UserRole::WarehouseAdmin, account_id, UserRole::SuperAdmin)
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
        assert_eq!(
            users.users.lock().unwrap()[0].role,
            UserRole::User
        );
    }

    #[tokio::test]
    async fn should_404_role_change_of_unknown_user() {
        let usecase = UpdateUserRoleUseCase {
            users: MockUserRepo::default(),
        };
        let result = usecase
            .execute(
                UserRole::SuperAdmin,
                UserId(Uuid::now_v7()),
                UserRole::WarehouseAdmin,
            )
            .await;
        assert!(matches!(result, Err(ApiError::UserNotFound)));
    }
}
