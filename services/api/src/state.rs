use std::sync::Arc;

use sea_orm::DatabaseConnection;

use harvest_auth_types::identity::JwtSecret;

use crate::config::ApiConfig;
use crate::infra::db::{
    DbCartRepository, DbCategoryRepository, DbEquipmentRepository, DbOrderRepository,
    DbProductRepository, DbUserRepository, DbWarehouseRepository,
};
use crate::infra::email::SmtpMailer;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub mailer: SmtpMailer,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn warehouse_repo(&self) -> DbWarehouseRepository {
        DbWarehouseRepository {
            db: self.db.clone(),
        }
    }

    pub fn category_repo(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn product_repo(&self) -> DbProductRepository {
        DbProductRepository {
            db: self.db.clone(),
        }
    }

    pub fn equipment_repo(&self) -> DbEquipmentRepository {
        DbEquipmentRepository {
            db: self.db.clone(),
        }
    }

    pub fn cart_repo(&self) -> DbCartRepository {
        DbCartRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }
}

impl JwtSecret for AppState {
    fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}
