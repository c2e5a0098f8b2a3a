use chrono::Utc;
use uuid::Uuid;

use harvest_domain::id::{UserId, WarehouseId};
use harvest_domain::user::UserRole;

use crate::domain::policy::{Action, Ownership, authorize};
use crate::domain::repository::{UserRepository, WarehouseRepository};
use crate::domain::types::{Warehouse, WarehousePatch};
use crate::error::ApiError;

// ── ListWarehouses / GetWarehouse ────────────────────────────────────────────

pub struct ListWarehousesUseCase<W: WarehouseRepository> {
    pub warehouses: W,
}

impl<W: WarehouseRepository> ListWarehousesUseCase<W> {
    pub async fn execute(&self) -> Result<Vec<Warehouse>, ApiError> {
        self.warehouses.list_active().await
    }
}

pub struct GetWarehouseUseCase<W: WarehouseRepository> {
    pub warehouses: W,
}

impl<W: WarehouseRepository> GetWarehouseUseCase<W> {
    pub async fn execute(&self, id: WarehouseId) -> Result<Warehouse, ApiError> {
        self.warehouses
            .find_by_id(id)
            .await?
            .ok_or(ApiError::WarehouseNotFound)
    }
}

// ── CreateWarehouse ──────────────────────────────────────────────────────────

pub struct CreateWarehouseInput {
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub admin_id: UserId,
    pub image: Option<String>,
}

pub struct CreateWarehouseUseCase<W, U>
where
    W: WarehouseRepository,
    U: UserRepository,
{
    pub warehouses: W,
    pub users: U,
}

impl<W, U> CreateWarehouseUseCase<W, U>
where
    W: WarehouseRepository,
    U: UserRepository,
{
    pub async fn execute(
        &self,
        role: UserRole,
        input: CreateWarehouseInput,
    ) -> Result<Warehouse, ApiError> {
        authorize(role, Action::CreateWarehouse, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;

        let admin = self
            .users
            .find_by_id(input.admin_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if admin.role != UserRole::WarehouseAdmin {
            return Err(ApiError::NotWarehouseAdmin);
        }
        if self.warehouses.find_by_admin(admin.id).await?.is_some() {
            return Err(ApiError::AdminAlreadyAssigned);
        }
        if self.warehouses.find_by_name(&input.name).await?.is_some() {
            return Err(ApiError::WarehouseNameTaken);
        }

        let now = Utc::now();
        let warehouse = Warehouse {
            id: WarehouseId(Uuid::now_v7()),
            name: input.name,
            location: input.location,
            capacity: input.capacity,
            admin_id: admin.id,
            image: input.image,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.warehouses.create(&warehouse).await?;
        Ok(warehouse)
    }
}

// ── UpdateWarehouse ──────────────────────────────────────────────────────────

pub struct UpdateWarehouseUseCase<W: WarehouseRepository> {
    pub warehouses: W,
}

impl<W: WarehouseRepository> UpdateWarehouseUseCase<W> {
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        id: WarehouseId,
        patch: WarehousePatch,
    ) -> Result<Warehouse, ApiError> {
        let warehouse = self
            .warehouses
            .find_by_id(id)
            .await?
            .ok_or(ApiError::WarehouseNotFound)?;
        authorize(
            role,
            Action::MutateWarehouse,
            Ownership::Warehouse {
                admin_id: warehouse.admin_id.0,
                actor_id: actor_id.0,
            },
        )
        .map_err(|_| ApiError::Forbidden)?;

        if let Some(ref name) = patch.name {
            if let Some(other) = self.warehouses.find_by_name(name).await? {
                if other.id != warehouse.id {
                    return Err(ApiError::WarehouseNameTaken);
                }
            }
        }

        self.warehouses.update(warehouse.id, &patch).await?;
        self.warehouses
            .find_by_id(warehouse.id)
            .await?
            .ok_or(ApiError::WarehouseNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::sync::{Arc, Mutex};

    use crate::domain::types::{User, UserProfilePatch};
    use crate::usecase::auth::hash_password;

    #[derive(Clone, Default)]
    struct MockWarehouseRepo {
        warehouses: Arc<Mutex<Vec<Warehouse>>>,
        patches: Arc<Mutex<Vec<(WarehouseId, WarehousePatch)>>>,
    }

    impl WarehouseRepository for MockWarehouseRepo {
        async fn list_active(&self) -> Result<Vec<Warehouse>, ApiError> {
            Ok(self
                .warehouses
                .lock()
                .unwrap()
                .iter()
                .filter(|w| w.is_active)
                .cloned()
                .collect())
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

        async fn update(&self, id: WarehouseId, patch: &WarehousePatch) -> Result<(), ApiError> {
            self.patches.lock().unwrap().push((id, patch.clone()));
            Ok(())
        }

        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.warehouses.lock().unwrap().len() as u64)
        }
    }

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

        async fn create(&self, user: &User) -> Result<(), ApiError> {
            self.users.lock().unwrap().push(user.clone());
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

        async fn list(&self) -> Result<Vec<User>, ApiError> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn count(&self) -> Result<u64, ApiError> {
            Ok(self.users.lock().unwrap().len() as u64)
        }

        async fn update_role(&self, id: UserId, role: UserRole) -> Result<(), ApiError> {
            if let Some(user) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
                user.role = role;
            }
            Ok(())
        }

        async fn update_profile(
            &self,
            _id: UserId,
            _patch: &UserProfilePatch,
        ) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn test_user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: UserId(Uuid::now_v7()),
            first_name: "Bob".into(),
            last_name: "Keeper".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
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

    fn test_warehouse(admin_id: UserId, name: &str) -> Warehouse {
        let now = Utc::now();
        Warehouse {
            id: WarehouseId(Uuid::now_v7()),
            name: name.into(),
            location: "Groningen".into(),
            capacity: 1_000,
            admin_id,
            image: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_input(admin_id: UserId, name: &str) -> CreateWarehouseInput {
        CreateWarehouseInput {
            name: name.into(),
            location: "Groningen".into(),
            capacity: 1_000,
            admin_id,
            image: None,
        }
    }

    #[tokio::test]
    async fn should_deny_non_super_admin_warehouse_creation() {
        let usecase = CreateWarehouseUseCase {
            warehouses: MockWarehouseRepo::default(),
            users: MockUserRepo::default(),
        };
        for role in [UserRole::User, UserRole::WarehouseAdmin] {
            let result = usecase
                .execute(role, create_input(UserId(Uuid::now_v7()), "North"))
                .await;
            assert!(matches!(result, Err(ApiError::Forbidden)));
        }
    }

    #[tokio::test]
    async fn should_require_warehouse_admin_role_on_designated_admin() {
        let admin = test_user(UserRole::User);
        let admin_id = admin.id;
        let users = MockUserRepo::default();
        users.users.lock().unwrap().push(admin);

        let usecase = CreateWarehouseUseCase {
            warehouses: MockWarehouseRepo::default(),
            users,
        };
        let result = usecase
            .execute(UserRole::SuperAdmin, create_input(admin_id, "North"))
            .await;
        assert!(matches!(result, Err(ApiError::NotWarehouseAdmin)));
    }

    #[tokio::test]
    async fn should_reject_admin_already_managing_a_warehouse() {
        let admin = test_user(UserRole::WarehouseAdmin);
        let admin_id = admin.id;
        let users = MockUserRepo::default();
        users.users.lock().unwrap().push(admin);
        let warehouses = MockWarehouseRepo::default();
        warehouses
            .warehouses
            .lock()
            .unwrap()
            .push(test_warehouse(admin_id, "North"));

        let usecase = CreateWarehouseUseCase { warehouses, users };
        let result = usecase
            .execute(UserRole::SuperAdmin, create_input(admin_id, "South"))
            .await;
        assert!(matches!(result, Err(ApiError::AdminAlreadyAssigned)));
    }

    #[tokio::test]
    async fn should_reject_duplicate_warehouse_name() {
        let admin = test_user(UserRole::WarehouseAdmin);
        let admin_id = admin.id;
        let users = MockUserRepo::default();
        users.users.lock().unwrap().push(admin);
        let warehouses = MockWarehouseRepo::default();
        warehouses
            .warehouses
            .lock()
            .unwrap()
            .push(test_warehouse(UserId(Uuid::now_v7()), "North"));

        let usecase = CreateWarehouseUseCase { warehouses, users };
        let result = usecase
            .execute(UserRole::SuperAdmin, create_input(admin_id, "North"))
            .await;
        assert!(matches!(result, Err(ApiError::WarehouseNameTaken)));
    }

    #[tokio::test]
    async fn should_create_warehouse_for_unassigned_admin() {
        let admin = test_user(UserRole::WarehouseAdmin);
        let admin_id = admin.id;
        let users = MockUserRepo::default();
        users.users.lock().unwrap().push(admin);

        let usecase = CreateWarehouseUseCase {
            warehouses: MockWarehouseRepo::default(),
            users,
        };
        let warehouse = usecase
            .execute(UserRole::SuperAdmin, create_input(admin_id, "North"))
            .await
            .unwrap();
        assert_eq!(warehouse.admin_id, admin_id);
        assert!(warehouse.is_active);
    }

    #[tokio::test]
    async fn should_let_owner_update_own_warehouse() {
        let admin_id = UserId(Uuid::now_v7());
        let warehouse = test_warehouse(admin_id, "North");
        let warehouse_id = warehouse.id;
        let warehouses = MockWarehouseRepo::default();
        warehouses.warehouses.lock().unwrap().push(warehouse);

        let usecase = UpdateWarehouseUseCase {
            warehouses: warehouses.clone(),
        };
        usecase
            .execute(
                admin_id,
                UserRole::WarehouseAdmin,
                warehouse_id,
                WarehousePatch {
                    capacity: Some(2_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let patches = warehouses.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.capacity, Some(2_000));
    }

    #[tokio::test]
    async fn should_deny_update_by_foreign_admin() {
        let warehouse = test_warehouse(UserId(Uuid::now_v7()), "North");
        let warehouse_id = warehouse.id;
        let warehouses = MockWarehouseRepo::default();
        warehouses.warehouses.lock().unwrap().push(warehouse);

        let usecase = UpdateWarehouseUseCase { warehouses };
        let result = usecase
            .execute(
                UserId(Uuid::now_v7()),
                UserRole::WarehouseAdmin,
                warehouse_id,
                WarehousePatch::default(),
            )
            .await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }
}
