use chrono::Utc;
use uuid::Uuid;

use harvest_domain::id::{EquipmentId, UserId, WarehouseId};
use harvest_domain::pagination::PageRequest;
use harvest_domain::user::UserRole;

use crate::domain::policy::{Action, Ownership, authorize};
use crate::domain::repository::{EquipmentRepository, WarehouseRepository};
use crate::domain::types::{Equipment, EquipmentFilter, EquipmentPatch, EquipmentSortBy};
use crate::error::ApiError;
use crate::usecase::product::resolve_target_warehouse;

// ── ListEquipment / SearchEquipment / GetEquipment ───────────────────────────

pub struct ListEquipmentUseCase<E: EquipmentRepository> {
    pub equipments: E,
}

impl<E: EquipmentRepository> ListEquipmentUseCase<E> {
    pub async fn execute(
        &self,
        filter: EquipmentFilter,
        sort_by: EquipmentSortBy,
        page: PageRequest,
    ) -> Result<Vec<Equipment>, ApiError> {
        self.equipments.list(&filter, sort_by, page.clamped()).await
    }
}

pub struct SearchEquipmentUseCase<E: EquipmentRepository> {
    pub equipments: E,
}

impl<E: EquipmentRepository> SearchEquipmentUseCase<E> {
    /// Free-text search over name, description, manufacturer and category.
    pub async fn execute(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<Vec<Equipment>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::MissingData);
        }
        self.equipments.search(query, page.clamped()).await
    }
}

pub struct GetEquipmentUseCase<E: EquipmentRepository> {
    pub equipments: E,
}

impl<E: EquipmentRepository> GetEquipmentUseCase<E> {
    pub async fn execute(&self, id: EquipmentId) -> Result<Equipment, ApiError> {
        self.equipments
            .find_by_id(id)
            .await?
            .ok_or(ApiError::EquipmentNotFound)
    }
}

// ── CreateEquipment ──────────────────────────────────────────────────────────

pub struct CreateEquipmentInput {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    /// Free-text category, unlike products which reference the category table.
    pub category: String,
    pub manufacturer: String,
    pub warehouse_id: Option<WarehouseId>,
    pub in_stock: i32,
    pub images: Vec<String>,
    pub specifications: Option<serde_json::Value>,
}

pub struct CreateEquipmentUseCase<E, W>
where
    E: EquipmentRepository,
    W: WarehouseRepository,
{
    pub equipments: E,
    pub warehouses: W,
}

impl<E, W> CreateEquipmentUseCase<E, W>
where
    E: EquipmentRepository,
    W: WarehouseRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        input: CreateEquipmentInput,
    ) -> Result<Equipment, ApiError> {
        let warehouse =
            resolve_target_warehouse(&self.warehouses, actor_id, input.warehouse_id).await?;
        authorize(
            role,
            Action::MutateEquipment,
            Ownership::Warehouse {
                admin_id: warehouse.admin_id.0,
                actor_id: actor_id.0,
            },
        )
        .map_err(|_| ApiError::Forbidden)?;

        if input.price_cents <= 0 {
            return Err(ApiError::InvalidPrice);
        }
        if input.in_stock < 0 {
            return Err(ApiError::InvalidStock);
        }

        let now = Utc::now();
        let equipment = Equipment {
            id: EquipmentId(Uuid::now_v7()),
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            category: input.category,
            manufacturer: input.manufacturer,
            warehouse_id: warehouse.id,
            in_stock: input.in_stock,
            images: input.images,
            specifications: input.specifications.unwrap_or(serde_json::Value::Null),
            is_available: true,
            created_at: now,
            updated_at: now,
        };
        self.equipments.create(&equipment).await?;
        Ok(equipment)
    }
}

// ── UpdateEquipment ──────────────────────────────────────────────────────────

pub struct UpdateEquipmentUseCase<E, W>
where
    E: EquipmentRepository,
    W: WarehouseRepository,
{
    pub equipments: E,
    pub warehouses: W,
}

impl<E, W> UpdateEquipmentUseCase<E, W>
where
    E: EquipmentRepository,
    W: WarehouseRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        equipment_id: EquipmentId,
        patch: EquipmentPatch,
    ) -> Result<Equipment, ApiError> {
        let equipment = self
            .equipments
            .find_by_id(equipment_id)
            .await?
            .ok_or(ApiError::EquipmentNotFound)?;
        authorize_equipment_mutation(&self.warehouses, actor_id, role, &equipment).await?;

        if let Some(price) = patch.price_cents {
            if price <= 0 {
                return Err(ApiError::InvalidPrice);
            }
        }
        if let Some(stock) = patch.in_stock {
            if stock < 0 {
                return Err(ApiError::InvalidStock);
            }
        }

        self.equipments.update(equipment.id, &patch).await?;
        self.equipments
            .find_by_id(equipment.id)
            .await?
            .ok_or(ApiError::EquipmentNotFound)
    }
}

async fn authorize_equipment_mutation<W: WarehouseRepository>(
    warehouses: &W,
    actor_id: UserId,
    role: UserRole,
    equipment: &Equipment,
) -> Result<(), ApiError> {
    let warehouse = warehouses
        .find_by_id(equipment.warehouse_id)
        .await?
        .ok_or(ApiError::WarehouseNotFound)?;
    authorize(
        role,
        Action::MutateEquipment,
        Ownership::Warehouse {
            admin_id: warehouse.admin_id.0,
            actor_id: actor_id.0,
        },
    )
    .map_err(|_| ApiError::Forbidden)
}

// ── DeleteEquipment ──────────────────────────────────────────────────────────

pub struct DeleteEquipmentUseCase<E, W>
where
    E: EquipmentRepository,
    W: WarehouseRepository,
{
    pub equipments: E,
    pub warehouses: W,
}

impl<E, W> DeleteEquipmentUseCase<E, W>
where
    E: EquipmentRepository,
    W: WarehouseRepository,
{
    /// Soft delete, mirroring product deletion.
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        equipment_id: EquipmentId,
    ) -> Result<(), ApiError> {
        let equipment = self
            .equipments
            .find_by_id(equipment_id)
            .await?
            .ok_or(ApiError::EquipmentNotFound)?;
        authorize_equipment_mutation(&self.warehouses, actor_id, role, &equipment).await?;

        let patch = EquipmentPatch {
            is_available: Some(false),
            ..Default::default()
        };
        self.equipments.update(equipment.id, &patch).await
    }
}
