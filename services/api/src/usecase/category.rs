use chrono::Utc;
use uuid::Uuid;

use harvest_domain::id::{CategoryId, UserId};
use harvest_domain::user::UserRole;

use crate::domain::policy::{Action, Ownership, authorize};
use crate::domain::repository::CategoryRepository;
use crate::domain::types::{Category, CategoryPatch};
use crate::error::ApiError;

// ── ListCategories / GetCategory ─────────────────────────────────────────────

pub struct ListCategoriesUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> ListCategoriesUseCase<C> {
    pub async fn execute(&self) -> Result<Vec<Category>, ApiError> {
        self.categories.list_active().await
    }
}

pub struct GetCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> GetCategoryUseCase<C> {
    pub async fn execute(&self, id: CategoryId) -> Result<Category, ApiError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)
    }
}

// ── CreateCategory ───────────────────────────────────────────────────────────

pub struct CreateCategoryInput {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

pub struct CreateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> CreateCategoryUseCase<C> {
    pub async fn execute(
        &self,
        _actor_id: UserId,
        role: UserRole,
        input: CreateCategoryInput,
    ) -> Result<Category, ApiError> {
        authorize(role, Action::MutateCategory, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;
        if input.name.trim().is_empty() {
            return Err(ApiError::MissingData);
        }

        let now = Utc::now();
        let category = Category {
            id: CategoryId(Uuid::now_v7()),
            name: input.name,
            description: input.description,
            image: input.image,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.categories.create(&category).await?;
        Ok(category)
    }
}

// ── UpdateCategory ───────────────────────────────────────────────────────────

pub struct UpdateCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> UpdateCategoryUseCase<C> {
    pub async fn execute(
        &self,
        role: UserRole,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, ApiError> {
        authorize(role, Action::MutateCategory, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;
        let category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;
        if let Some(ref name) = patch.name {
            if name.trim().is_empty() {
                return Err(ApiError::MissingData);
            }
        }
        self.categories.update(category.id, &patch).await?;
        self.categories
            .find_by_id(category.id)
            .await?
            .ok_or(ApiError::CategoryNotFound)
    }
}

// ── DeleteCategory ───────────────────────────────────────────────────────────

pub struct DeleteCategoryUseCase<C: CategoryRepository> {
    pub categories: C,
}

impl<C: CategoryRepository> DeleteCategoryUseCase<C> {
    /// Soft delete: products keep their category reference, listings hide it.
    pub async fn execute(&self, role: UserRole, id: CategoryId) -> Result<(), ApiError> {
        authorize(role, Action::MutateCategory, Ownership::NotRequired)
            .map_err(|_| ApiError::Forbidden)?;
        let category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;
        let patch = CategoryPatch {
            is_active: Some(false),
            ..Default::default()
        };
        self.categories.update(category.id, &patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockCategoryRepo {
        categories: Arc<Mutex<Vec<Category>>>,
        patches: Arc<Mutex<Vec<(CategoryId, CategoryPatch)>>>,
    }

    impl CategoryRepository for MockCategoryRepo {
        async fn list_active(&self) -> Result<Vec<Category>, ApiError> {
            Ok(self
                .categories
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.is_active)
                .cloned()
                .collect())
        }

        async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, ApiError> {
            Ok(self
                .categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned())
        }

        async fn create(&self, category: &Category) -> Result<(), ApiError> {
            self.categories.lock().unwrap().push(category.clone());
            Ok(())
        }

        async fn update(&self, id: CategoryId, patch: &CategoryPatch) -> Result<(), ApiError> {
            self.patches.lock().unwrap().push((id, patch.clone()));
            Ok(())
        }
    }

    fn input() -> CreateCategoryInput {
        CreateCategoryInput {
            name: "Vegetables".into(),
            description: "Fresh produce".into(),
            image: None,
        }
    }

    #[tokio::test]
    async fn should_deny_non_super_admin_creation() {
        let usecase = CreateCategoryUseCase {
            categories: MockCategoryRepo::default(),
        };
        for role in [UserRole::User, UserRole::WarehouseAdmin] {
            let result = usecase
                .execute(UserId(Uuid::now_v7()), role, input())
                .await;
            assert!(matches!(result, Err(ApiError::Forbidden)));
        }
    }

    #[tokio::test]
    async fn should_create_active_category_as_super_admin() {
        let repo = MockCategoryRepo::default();
        let usecase = CreateCategoryUseCase {
            categories: repo.clone(),
        };
        let category = usecase
            .execute(UserId(Uuid::now_v7()), UserRole::SuperAdmin, input())
            .await
            .unwrap();
        assert!(category.is_active);
        assert_eq!(repo.categories.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_blank_name() {
        let usecase = CreateCategoryUseCase {
            categories: MockCategoryRepo::default(),
        };
        let mut blank = input();
        blank.name = "   ".into();
        let result = usecase
            .execute(UserId(Uuid::now_v7()), UserRole::SuperAdmin, blank)
            .await;
        assert!(matches!(result, Err(ApiError::MissingData)));
    }

    #[tokio::test]
    async fn should_deactivate_on_delete() {
        let repo = MockCategoryRepo::default();
        let usecase = CreateCategoryUseCase {
            categories: repo.clone(),
        };
        let category = usecase
            .execute(UserId(Uuid::now_v7()), UserRole::SuperAdmin, input())
            .await
            .unwrap();

        DeleteCategoryUseCase {
            categories: repo.clone(),
        }
        .execute(UserRole::SuperAdmin, category.id)
        .await
        .unwrap();

        let patches = repo.patches.lock().unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].1.is_active, Some(false));
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_category() {
        let usecase = GetCategoryUseCase {
            categories: MockCategoryRepo::default(),
        };
        let result = usecase.execute(CategoryId(Uuid::now_v7())).await;
        assert!(matches!(result, Err(ApiError::CategoryNotFound)));
    }
}
