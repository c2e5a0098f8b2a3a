use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Statement, TransactionError, TransactionTrait,
    sea_query::{Expr, OnConflict, extension::postgres::PgExpr},
};
use uuid::Uuid;

use harvest_api_schema::{
    cart_items, carts, categories, equipments, order_items, orders, product_ratings, products,
    users, warehouses,
};
use harvest_domain::id::{
    CartId, CartItemId, CategoryId, EquipmentId, OrderId, ProductId, UserId, WarehouseId,
};
use harvest_domain::pagination::{PageRequest, Sort};
use harvest_domain::user::UserRole;

use crate::domain::repository::{
    CartRepository, CategoryRepository, EquipmentRepository, OrderRepository, ProductRepository,
    UserRepository, WarehouseRepository,
};
use crate::domain::types::{
    Cart, CartItem, Category, CategoryPatch, Equipment, EquipmentFilter, EquipmentPatch,
    EquipmentSortBy, Order, OrderLine, OrderStatus, Product, ProductFilter, ProductPatch,
    ProductRating, ShippingAddress, User, UserProfilePatch, Warehouse, WarehousePatch,
};
use crate::error::ApiError;

fn txn_err(err: TransactionError<ApiError>) -> ApiError {
    match err {
        TransactionError::Connection(e) => ApiError::Internal(anyhow::anyhow!(e)),
        TransactionError::Transaction(e) => e,
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        let models = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list users")?;
        models.into_iter().map(user_from_model).collect()
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let count = users::Entity::find()
            .count(&self.db)
            .await
            .context("count users")?;
        Ok(count)
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(user.id.0),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            email: Set(user.email.clone()),
            phone: Set(user.phone.clone()),
            country: Set(user.country.clone()),
            password_hash: Set(user.password_hash.clone()),
            profile_image: Set(user.profile_image.clone()),
            role: Set(i16::from(user.role.as_u8())),
            is_verified: Set(user.is_verified),
            otp: Set(user.otp),
            otp_expires_at: Set(user.otp_expires_at),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create user")?;
        Ok(())
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id.0),
            role: Set(i16::from(role.as_u8())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update user role")?;
        Ok(())
    }

    async fn update_profile(&self, id: UserId, patch: &UserProfilePatch) -> Result<(), ApiError> {
        let mut am = users::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(ref first_name) = patch.first_name {
            am.first_name = Set(first_name.clone());
        }
        if let Some(ref last_name) = patch.last_name {
            am.last_name = Set(last_name.clone());
        }
        if let Some(ref phone) = patch.phone {
            am.phone = Set(phone.clone());
        }
        if let Some(ref country) = patch.country {
            am.country = Set(country.clone());
        }
        if let Some(ref profile_image) = patch.profile_image {
            am.profile_image = Set(Some(profile_image.clone()));
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update user profile")?;
        Ok(())
    }

    async fn set_otp(
        &self,
        id: UserId,
        otp: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id.0),
            otp: Set(otp),
            otp_expires_at: Set(expires_at),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set user otp")?;
        Ok(())
    }

    async fn mark_verified(&self, id: UserId) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id.0),
            is_verified: Set(true),
            otp: Set(None),
            otp_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark user verified")?;
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), ApiError> {
        users::ActiveModel {
            id: Set(id.0),
            password_hash: Set(password_hash.to_owned()),
            otp: Set(None),
            otp_expires_at: Set(None),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update user password")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> Result<User, ApiError> {
    let role = UserRole::from_u8(model.role as u8)
        .ok_or_else(|| anyhow::anyhow!("unknown role value {}", model.role))?;
    Ok(User {
        id: UserId(model.id),
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        country: model.country,
        password_hash: model.password_hash,
        profile_image: model.profile_image,
        role,
        is_verified: model.is_verified,
        otp: model.otp,
        otp_expires_at: model.otp_expires_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Warehouse repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbWarehouseRepository {
    pub db: DatabaseConnection,
}

impl WarehouseRepository for DbWarehouseRepository {
    async fn list_active(&self) -> Result<Vec<Warehouse>, ApiError> {
        let models = warehouses::Entity::find()
            .filter(warehouses::Column::IsActive.eq(true))
            .order_by_asc(warehouses::Column::Name)
            .all(&self.db)
            .await
            .context("list active warehouses")?;
        Ok(models.into_iter().map(warehouse_from_model).collect())
    }

    async fn find_by_id(&self, id: WarehouseId) -> Result<Option<Warehouse>, ApiError> {
        let model = warehouses::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find warehouse by id")?;
        Ok(model.map(warehouse_from_model))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Warehouse>, ApiError> {
        let model = warehouses::Entity::find()
            .filter(warehouses::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("find warehouse by name")?;
        Ok(model.map(warehouse_from_model))
    }

    async fn find_by_admin(&self, admin_id: UserId) -> Result<Option<Warehouse>, ApiError> {
        let model = warehouses::Entity::find()
            .filter(warehouses::Column::AdminId.eq(admin_id.0))
            .one(&self.db)
            .await
            .context("find warehouse by admin")?;
        Ok(model.map(warehouse_from_model))
    }

    async fn create(&self, warehouse: &Warehouse) -> Result<(), ApiError> {
        warehouses::ActiveModel {
            id: Set(warehouse.id.0),
            name: Set(warehouse.name.clone()),
            location: Set(warehouse.location.clone()),
            capacity: Set(warehouse.capacity),
            admin_id: Set(warehouse.admin_id.0),
            image: Set(warehouse.image.clone()),
            is_active: Set(warehouse.is_active),
            created_at: Set(warehouse.created_at),
            updated_at: Set(warehouse.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create warehouse")?;
        Ok(())
    }

    async fn update(&self, id: WarehouseId, patch: &WarehousePatch) -> Result<(), ApiError> {
        let mut am = warehouses::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(ref name) = patch.name {
            am.name = Set(name.clone());
        }
        if let Some(ref location) = patch.location {
            am.location = Set(location.clone());
        }
        if let Some(capacity) = patch.capacity {
            am.capacity = Set(capacity);
        }
        if let Some(ref image) = patch.image {
            am.image = Set(Some(image.clone()));
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update warehouse")?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let count = warehouses::Entity::find()
            .count(&self.db)
            .await
            .context("count warehouses")?;
        Ok(count)
    }
}

fn warehouse_from_model(model: warehouses::Model) -> Warehouse {
    Warehouse {
        id: WarehouseId(model.id),
        name: model.name,
        location: model.location,
        capacity: model.capacity,
        admin_id: UserId(model.admin_id),
        image: model.image,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Category repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCategoryRepository {
    pub db: DatabaseConnection,
}

impl CategoryRepository for DbCategoryRepository {
    async fn list_active(&self) -> Result<Vec<Category>, ApiError> {
        let models = categories::Entity::find()
            .filter(categories::Column::IsActive.eq(true))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .context("list active categories")?;
        Ok(models.into_iter().map(category_from_model).collect())
    }

    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, ApiError> {
        let model = categories::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find category by id")?;
        Ok(model.map(category_from_model))
    }

    async fn create(&self, category: &Category) -> Result<(), ApiError> {
        categories::ActiveModel {
            id: Set(category.id.0),
            name: Set(category.name.clone()),
            description: Set(category.description.clone()),
            image: Set(category.image.clone()),
            is_active: Set(category.is_active),
            created_at: Set(category.created_at),
            updated_at: Set(category.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create category")?;
        Ok(())
    }

    async fn update(&self, id: CategoryId, patch: &CategoryPatch) -> Result<(), ApiError> {
        let mut am = categories::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(ref name) = patch.name {
            am.name = Set(name.clone());
        }
        if let Some(ref description) = patch.description {
            am.description = Set(description.clone());
        }
        if let Some(ref image) = patch.image {
            am.image = Set(Some(image.clone()));
        }
        if let Some(is_active) = patch.is_active {
            am.is_active = Set(is_active);
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update category")?;
        Ok(())
    }
}

fn category_from_model(model: categories::Model) -> Category {
    Category {
        id: CategoryId(model.id),
        name: model.name,
        description: model.description,
        image: model.image,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

// ── Product repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbProductRepository {
    pub db: DatabaseConnection,
}

impl ProductRepository for DbProductRepository {
    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Vec<Product>, ApiError> {
        let mut query = products::Entity::find()
            .filter(products::Column::IsAvailable.eq(true));
        if let Some(category) = filter.category {
            query = query.filter(products::Column::CategoryId.eq(category.0));
        }
        if let Some(min) = filter.min_price_cents {
            query = query.filter(products::Column::PriceCents.gte(min));
        }
        if let Some(max) = filter.max_price_cents {
            query = query.filter(products::Column::PriceCents.lte(max));
        }
        let models = query
            .order_by_desc(products::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list products")?;
        models.into_iter().map(product_from_model).collect()
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
        let model = products::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find product by id")?;
        model.map(product_from_model).transpose()
    }

    async fn create(&self, product: &Product) -> Result<(), ApiError> {
        products::ActiveModel {
            id: Set(product.id.0),
            name: Set(product.name.clone()),
            description: Set(product.description.clone()),
            price_cents: Set(product.price_cents),
            category_id: Set(product.category_id.0),
            warehouse_id: Set(product.warehouse_id.0),
            in_stock: Set(product.in_stock),
            images: Set(images_to_json(&product.images)?),
            is_available: Set(product.is_available),
            average_rating: Set(product.average_rating),
            created_at: Set(product.created_at),
            updated_at: Set(product.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create product")?;
        Ok(())
    }

    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<(), ApiError> {
        let mut am = products::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(ref name) = patch.name {
            am.name = Set(name.clone());
        }
        if let Some(ref description) = patch.description {
            am.description = Set(description.clone());
        }
        if let Some(price_cents) = patch.price_cents {
            am.price_cents = Set(price_cents);
        }
        if let Some(category_id) = patch.category_id {
            am.category_id = Set(category_id.0);
        }
        if let Some(in_stock) = patch.in_stock {
            am.in_stock = Set(in_stock);
        }
        if let Some(ref images) = patch.images {
            am.images = Set(images_to_json(images)?);
        }
        if let Some(is_available) = patch.is_available {
            am.is_available = Set(is_available);
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update product")?;
        Ok(())
    }

    async fn upsert_rating(&self, rating: &ProductRating) -> Result<f64, ApiError> {
        let rating = rating.clone();
        self.db
            .transaction::<_, f64, ApiError>(|txn| {
                Box::pin(async move {
                    product_ratings::Entity::insert(product_ratings::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        product_id: Set(rating.product_id.0),
                        user_id: Set(rating.user_id.0),
                        rating: Set(rating.rating),
                        review: Set(rating.review.clone()),
                        created_at: Set(Utc::now()),
                    })
                    .on_conflict(
                        OnConflict::columns([
                            product_ratings::Column::ProductId,
                            product_ratings::Column::UserId,
                        ])
                        .update_columns([
                            product_ratings::Column::Rating,
                            product_ratings::Column::Review,
                        ])
                        .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await
                    .context("upsert product rating")?;

                    #[derive(FromQueryResult)]
                    struct AvgRow {
                        avg: f64,
                    }

                    let row = AvgRow::find_by_statement(Statement::from_sql_and_values(
                        txn.get_database_backend(),
                        "SELECT COALESCE(AVG(rating)::float8, 0) AS avg \
                         FROM product_ratings WHERE product_id = $1",
                        [rating.product_id.0.into()],
                    ))
                    .one(txn)
                    .await
                    .context("average product rating")?
                    .ok_or_else(|| anyhow::anyhow!("AVG returned no row"))?;

                    products::ActiveModel {
                        id: Set(rating.product_id.0),
                        average_rating: Set(row.avg),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .update(txn)
                    .await
                    .context("write product average rating")?;

                    Ok(row.avg)
                })
            })
            .await
            .map_err(txn_err)
    }
}

fn images_to_json(images: &[String]) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(images)
        .context("encode images")
        .map_err(Into::into)
}

fn images_from_json(value: serde_json::Value) -> Result<Vec<String>, ApiError> {
    serde_json::from_value(value)
        .context("decode images")
        .map_err(Into::into)
}

fn product_from_model(model: products::Model) -> Result<Product, ApiError> {
    Ok(Product {
        id: ProductId(model.id),
        name: model.name,
        description: model.description,
        price_cents: model.price_cents,
        category_id: CategoryId(model.category_id),
        warehouse_id: WarehouseId(model.warehouse_id),
        in_stock: model.in_stock,
        images: images_from_json(model.images)?,
        is_available: model.is_available,
        average_rating: model.average_rating,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Equipment repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbEquipmentRepository {
    pub db: DatabaseConnection,
}

impl EquipmentRepository for DbEquipmentRepository {
    async fn list(
        &self,
        filter: &EquipmentFilter,
        sort_by: EquipmentSortBy,
        page: PageRequest,
    ) -> Result<Vec<Equipment>, ApiError> {
        let mut query = equipments::Entity::find()
            .filter(equipments::Column::IsAvailable.eq(true));
        if let Some(ref category) = filter.category {
            query = query.filter(equipments::Column::Category.eq(category));
        }
        if let Some(min) = filter.min_price_cents {
            query = query.filter(equipments::Column::PriceCents.gte(min));
        }
        if let Some(max) = filter.max_price_cents {
            query = query.filter(equipments::Column::PriceCents.lte(max));
        }
        query = match sort_by {
            EquipmentSortBy::CreatedAt(Sort::Desc) => {
                query.order_by_desc(equipments::Column::CreatedAt)
            }
            EquipmentSortBy::CreatedAt(Sort::Asc) => {
                query.order_by_asc(equipments::Column::CreatedAt)
            }
            EquipmentSortBy::Price(Sort::Desc) => {
                query.order_by_desc(equipments::Column::PriceCents)
            }
            EquipmentSortBy::Price(Sort::Asc) => query.order_by_asc(equipments::Column::PriceCents),
        };
        let models = query
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list equipments")?;
        models.into_iter().map(equipment_from_model).collect()
    }

    async fn search(&self, query: &str, page: PageRequest) -> Result<Vec<Equipment>, ApiError> {
        let pattern = format!("%{query}%");
        let condition = Condition::any()
            .add(Expr::col(equipments::Column::Name).ilike(pattern.clone()))
            .add(Expr::col(equipments::Column::Description).ilike(pattern.clone()))
            .add(Expr::col(equipments::Column::Manufacturer).ilike(pattern.clone()))
            .add(Expr::col(equipments::Column::Category).ilike(pattern));
        let models = equipments::Entity::find()
            .filter(equipments::Column::IsAvailable.eq(true))
            .filter(condition)
            .order_by_desc(equipments::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("search equipments")?;
        models.into_iter().map(equipment_from_model).collect()
    }

    async fn find_by_id(&self, id: EquipmentId) -> Result<Option<Equipment>, ApiError> {
        let model = equipments::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find equipment by id")?;
        model.map(equipment_from_model).transpose()
    }

    async fn create(&self, equipment: &Equipment) -> Result<(), ApiError> {
        equipments::ActiveModel {
            id: Set(equipment.id.0),
            name: Set(equipment.name.clone()),
            description: Set(equipment.description.clone()),
            price_cents: Set(equipment.price_cents),
            category: Set(equipment.category.clone()),
            manufacturer: Set(equipment.manufacturer.clone()),
            in_stock: Set(equipment.in_stock),
            images: Set(images_to_json(&equipment.images)?),
            specifications: Set(equipment.specifications.clone()),
            warehouse_id: Set(equipment.warehouse_id.0),
            is_available: Set(equipment.is_available),
            created_at: Set(equipment.created_at),
            updated_at: Set(equipment.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create equipment")?;
        Ok(())
    }

    async fn update(&self, id: EquipmentId, patch: &EquipmentPatch) -> Result<(), ApiError> {
        let mut am = equipments::ActiveModel {
            id: Set(id.0),
            ..Default::default()
        };
        if let Some(ref name) = patch.name {
            am.name = Set(name.clone());
        }
        if let Some(ref description) = patch.description {
            am.description = Set(description.clone());
        }
        if let Some(price_cents) = patch.price_cents {
            am.price_cents = Set(price_cents);
        }
        if let Some(ref category) = patch.category {
            am.category = Set(category.clone());
        }
        if let Some(ref manufacturer) = patch.manufacturer {
            am.manufacturer = Set(manufacturer.clone());
        }
        if let Some(in_stock) = patch.in_stock {
            am.in_stock = Set(in_stock);
        }
        if let Some(ref images) = patch.images {
            am.images = Set(images_to_json(images)?);
        }
        if let Some(ref specifications) = patch.specifications {
            am.specifications = Set(specifications.clone());
        }
        if let Some(is_available) = patch.is_available {
            am.is_available = Set(is_available);
        }
        am.updated_at = Set(Utc::now());
        am.update(&self.db).await.context("update equipment")?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let count = equipments::Entity::find()
            .count(&self.db)
            .await
            .context("count equipments")?;
        Ok(count)
    }

    async fn count_by_warehouse(&self, warehouse_id: WarehouseId) -> Result<u64, ApiError> {
        let count = equipments::Entity::find()
            .filter(equipments::Column::WarehouseId.eq(warehouse_id.0))
            .count(&self.db)
            .await
            .context("count equipments by warehouse")?;
        Ok(count)
    }
}

fn equipment_from_model(model: equipments::Model) -> Result<Equipment, ApiError> {
    Ok(Equipment {
        id: EquipmentId(model.id),
        name: model.name,
        description: model.description,
        price_cents: model.price_cents,
        category: model.category,
        manufacturer: model.manufacturer,
        warehouse_id: WarehouseId(model.warehouse_id),
        in_stock: model.in_stock,
        images: images_from_json(model.images)?,
        specifications: model.specifications,
        is_available: model.is_available,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Cart repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCartRepository {
    pub db: DatabaseConnection,
}

impl CartRepository for DbCartRepository {
    async fn find_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Vec<CartItem>)>, ApiError> {
        let Some(cart) = carts::Entity::find()
            .filter(carts::Column::UserId.eq(user_id.0))
            .one(&self.db)
            .await
            .context("find cart by user")?
        else {
            return Ok(None);
        };
        let items = cart_items::Entity::find()
            .filter(cart_items::Column::CartId.eq(cart.id))
            .order_by_asc(cart_items::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list cart items")?;
        Ok(Some((
            cart_from_model(cart),
            items.into_iter().map(cart_item_from_model).collect(),
        )))
    }

    async fn create(&self, cart: &Cart) -> Result<(), ApiError> {
        carts::ActiveModel {
            id: Set(cart.id.0),
            user_id: Set(cart.user_id.0),
            total_cents: Set(cart.total_cents),
            created_at: Set(cart.created_at),
            updated_at: Set(cart.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create cart")?;
        Ok(())
    }

    async fn insert_item(&self, item: &CartItem) -> Result<(), ApiError> {
        cart_items::ActiveModel {
            id: Set(item.id.0),
            cart_id: Set(item.cart_id.0),
            product_id: Set(item.product_id.0),
            quantity: Set(item.quantity),
            unit_price_cents: Set(item.unit_price_cents),
            created_at: Set(item.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert cart item")?;
        Ok(())
    }

    async fn set_item_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<(), ApiError> {
        cart_items::ActiveModel {
            id: Set(item_id.0),
            quantity: Set(quantity),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set cart item quantity")?;
        Ok(())
    }

    async fn delete_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool, ApiError> {
        let result = cart_items::Entity::delete_many()
            .filter(cart_items::Column::CartId.eq(cart_id.0))
            .filter(cart_items::Column::Id.eq(item_id.0))
            .exec(&self.db)
            .await
            .context("delete cart item")?;
        Ok(result.rows_affected > 0)
    }

    async fn clear(&self, cart_id: CartId) -> Result<(), ApiError> {
        cart_items::Entity::delete_many()
            .filter(cart_items::Column::CartId.eq(cart_id.0))
            .exec(&self.db)
            .await
            .context("clear cart")?;
        Ok(())
    }

    async fn set_total(&self, cart_id: CartId, total_cents: i64) -> Result<(), ApiError> {
        carts::ActiveModel {
            id: Set(cart_id.0),
            total_cents: Set(total_cents),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set cart total")?;
        Ok(())
    }
}

fn cart_from_model(model: carts::Model) -> Cart {
    Cart {
        id: CartId(model.id),
        user_id: UserId(model.user_id),
        total_cents: model.total_cents,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn cart_item_from_model(model: cart_items::Model) -> CartItem {
    CartItem {
        id: CartItemId(model.id),
        cart_id: CartId(model.cart_id),
        product_id: ProductId(model.product_id),
        quantity: model.quantity,
        unit_price_cents: model.unit_price_cents,
        created_at: model.created_at,
    }
}

// ── Order repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderRepository for DbOrderRepository {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        let models = orders::Entity::find()
            .filter(orders::Column::UserId.eq(user_id.0))
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list orders by user")?;
        models.into_iter().map(order_from_model).collect()
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<(Order, Vec<OrderLine>)>, ApiError> {
        let Some(order) = orders::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find order by id")?
        else {
            return Ok(None);
        };
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(order.id))
            .all(&self.db)
            .await
            .context("list order items")?;
        let lines = items
            .into_iter()
            .map(|item| OrderLine {
                product_id: ProductId(item.product_id),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
            })
            .collect();
        Ok(Some((order_from_model(order)?, lines)))
    }

    async fn place(
        &self,
        order: &Order,
        lines: &[OrderLine],
        cart_id: Option<CartId>,
    ) -> Result<(), ApiError> {
        let order = order.clone();
        let lines = lines.to_vec();
        self.db
            .transaction::<_, (), ApiError>(|txn| {
                Box::pin(async move {
                    // Guarded decrement: the filter on in_stock makes oversell
                    // impossible even under concurrent placement.
                    for line in &lines {
                        let result = products::Entity::update_many()
                            .col_expr(
                                products::Column::InStock,
                                Expr::col(products::Column::InStock).sub(line.quantity),
                            )
                            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
                            .filter(products::Column::Id.eq(line.product_id.0))
                            .filter(products::Column::InStock.gte(line.quantity))
                            .exec(txn)
                            .await
                            .context("decrement product stock")?;
                        if result.rows_affected == 0 {
                            let available = products::Entity::find_by_id(line.product_id.0)
                                .one(txn)
                                .await
                                .context("re-read product stock")?
                                .map(|p| p.in_stock)
                                .ok_or(ApiError::ProductNotFound)?;
                            return Err(ApiError::InsufficientStock { available });
                        }
                    }

                    orders::ActiveModel {
                        id: Set(order.id.0),
                        user_id: Set(order.user_id.0),
                        status: Set(order.status.as_str().to_owned()),
                        payment_method: Set(order.payment_method.as_str().to_owned()),
                        total_cents: Set(order.total_cents),
                        shipping_address: Set(order.shipping.address.clone()),
                        shipping_city: Set(order.shipping.city.clone()),
                        shipping_postal_code: Set(order.shipping.postal_code.clone()),
                        shipping_country: Set(order.shipping.country.clone()),
                        created_at: Set(order.created_at),
                        updated_at: Set(order.updated_at),
                    }
                    .insert(txn)
                    .await
                    .context("insert order")?;

                    for line in &lines {
                        order_items::ActiveModel {
                            id: Set(Uuid::now_v7()),
                            order_id: Set(order.id.0),
                            product_id: Set(line.product_id.0),
                            quantity: Set(line.quantity),
                            unit_price_cents: Set(line.unit_price_cents),
                        }
                        .insert(txn)
                        .await
                        .context("insert order item")?;
                    }

                    if let Some(cart_id) = cart_id {
                        cart_items::Entity::delete_many()
                            .filter(cart_items::Column::CartId.eq(cart_id.0))
                            .exec(txn)
                            .await
                            .context("clear cart after order")?;
                        carts::ActiveModel {
                            id: Set(cart_id.0),
                            total_cents: Set(0),
                            updated_at: Set(Utc::now()),
                            ..Default::default()
                        }
                        .update(txn)
                        .await
                        .context("reset cart total after order")?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(txn_err)
    }

    async fn cancel_with_restock(&self, id: OrderId) -> Result<(), ApiError> {
        self.db
            .transaction::<_, (), ApiError>(|txn| {
                Box::pin(async move {
                    // Guarded flip: the status filter makes a concurrent second
                    // cancel lose the race instead of restocking twice.
                    let flipped = orders::Entity::update_many()
                        .col_expr(
                            orders::Column::Status,
                            Expr::value(OrderStatus::Cancelled.as_str()),
                        )
                        .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(orders::Column::Id.eq(id.0))
                        .filter(orders::Column::Status.eq(OrderStatus::Pending.as_str()))
                        .exec(txn)
                        .await
                        .context("mark order cancelled")?;
                    if flipped.rows_affected == 0 {
                        let current = orders::Entity::find_by_id(id.0)
                            .one(txn)
                            .await
                            .context("re-read order status")?
                            .ok_or(ApiError::OrderNotFound)?;
                        return Err(ApiError::CannotCancel {
                            status: current.status,
                        });
                    }

                    let items = order_items::Entity::find()
                        .filter(order_items::Column::OrderId.eq(id.0))
                        .all(txn)
                        .await
                        .context("list order items for restock")?;

                    for item in &items {
                        products::Entity::update_many()
                            .col_expr(
                                products::Column::InStock,
                                Expr::col(products::Column::InStock).add(item.quantity),
                            )
                            .col_expr(products::Column::UpdatedAt, Expr::value(Utc::now()))
                            .filter(products::Column::Id.eq(item.product_id))
                            .exec(txn)
                            .await
                            .context("restock product")?;
                    }

                    Ok(())
                })
            })
            .await
            .map_err(txn_err)
    }
}

fn order_from_model(model: orders::Model) -> Result<Order, ApiError> {
    let status = model
        .status
        .parse::<OrderStatus>()
        .map_err(|_| anyhow::anyhow!("unknown order status {:?}", model.status))?;
    let payment_method = model
        .payment_method
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown payment method {:?}", model.payment_method))?;
    Ok(Order {
        id: OrderId(model.id),
        user_id: UserId(model.user_id),
        status,
        payment_method,
        total_cents: model.total_cents,
        shipping: ShippingAddress {
            address: model.shipping_address,
            city: model.shipping_city,
            postal_code: model.shipping_postal_code,
            country: model.shipping_country,
        },
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
