use chrono::Utc;
use uuid::Uuid;

use harvest_domain::id::{CartId, CartItemId, ProductId, UserId};

use crate::domain::repository::{CartRepository, ProductRepository};
use crate::domain::types::{Cart, CartItem, cart_total};
use crate::error::ApiError;

async fn get_or_create<C: CartRepository>(
    carts: &C,
    user_id: UserId,
) -> Result<(Cart, Vec<CartItem>), ApiError> {
    if let Some(found) = carts.find_by_user(user_id).await? {
        return Ok(found);
    }
    let now = Utc::now();
    let cart = Cart {
        id: CartId(Uuid::now_v7()),
        user_id,
        total_cents: 0,
        created_at: now,
        updated_at: now,
    };
    carts.create(&cart).await?;
    Ok((cart, Vec::new()))
}

/// Reload the cart, recompute the derived total from its lines, and persist it.
async fn refresh_total<C: CartRepository>(
    carts: &C,
    user_id: UserId,
) -> Result<(Cart, Vec<CartItem>), ApiError> {
    let (mut cart, items) = carts
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("cart vanished during mutation")))?;
    let total = cart_total(&items);
    carts.set_total(cart.id, total).await?;
    cart.total_cents = total;
    Ok((cart, items))
}

// ── GetCart ──────────────────────────────────────────────────────────────────

pub struct GetCartUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> GetCartUseCase<C> {
    /// Idempotent: first access creates an empty cart.
    pub async fn execute(&self, user_id: UserId) -> Result<(Cart, Vec<CartItem>), ApiError> {
        get_or_create(&self.carts, user_id).await
    }
}

// ── AddCartItem ──────────────────────────────────────────────────────────────

pub struct AddCartItemUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> AddCartItemUseCase<C, P> {
    pub async fn execute(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(Cart, Vec<CartItem>), ApiError> {
        if quantity < 1 {
            return Err(ApiError::InvalidQuantity);
        }
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        if !product.is_available {
            return Err(ApiError::ProductUnavailable);
        }

        let (cart, items) = get_or_create(&self.carts, user_id).await?;
        let existing = items.iter().find(|item| item.product_id == product_id);
        let new_quantity = existing.map_or(quantity, |item| item.quantity + quantity);
        if new_quantity > product.in_stock {
            return Err(ApiError::InsufficientStock {
                available: product.in_stock,
            });
        }

        match existing {
            // merge keeps the unit price captured when the line was first added
            Some(item) => self.carts.set_item_quantity(item.id, new_quantity).await?,
            None => {
                self.carts
                    .insert_item(&CartItem {
                        id: CartItemId(Uuid::now_v7()),
                        cart_id: cart.id,
                        product_id,
                        quantity,
                        unit_price_cents: product.price_cents,
                        created_at: Utc::now(),
                    })
                    .await?;
            }
        }
        refresh_total(&self.carts, user_id).await
    }
}

// ── UpdateCartItem ───────────────────────────────────────────────────────────

pub struct UpdateCartItemUseCase<C: CartRepository, P: ProductRepository> {
    pub carts: C,
    pub products: P,
}

impl<C: CartRepository, P: ProductRepository> UpdateCartItemUseCase<C, P> {
    pub async fn execute(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(Cart, Vec<CartItem>), ApiError> {
        if quantity < 1 {
            return Err(ApiError::InvalidQuantity);
        }
        let (_, items) = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(ApiError::CartItemNotFound)?;
        let item = items
            .iter()
            .find(|item| item.id == item_id)
            .ok_or(ApiError::CartItemNotFound)?;
        let product = self
            .products
            .find_by_id(item.product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        if quantity > product.in_stock {
            return Err(ApiError::InsufficientStock {
                available: product.in_stock,
            });
        }
        self.carts.set_item_quantity(item.id, quantity).await?;
        refresh_total(&self.carts, user_id).await
    }
}

// ── RemoveCartItem ───────────────────────────────────────────────────────────

pub struct RemoveCartItemUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> RemoveCartItemUseCase<C> {
    pub async fn execute(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(Cart, Vec<CartItem>), ApiError> {
        let (cart, _) = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or(ApiError::CartItemNotFound)?;
        if !self.carts.delete_item(cart.id, item_id).await? {
            return Err(ApiError::CartItemNotFound);
        }
        refresh_total(&self.carts, user_id).await
    }
}

// ── ClearCart ────────────────────────────────────────────────────────────────

pub struct ClearCartUseCase<C: CartRepository> {
    pub carts: C,
}

impl<C: CartRepository> ClearCartUseCase<C> {
    /// Idempotent: clearing a missing or already-empty cart succeeds.
    pub async fn execute(&self, user_id: UserId) -> Result<Cart, ApiError> {
        let (mut cart, _) = get_or_create(&self.carts, user_id).await?;
        self.carts.clear(cart.id).await?;
        self.carts.set_total(cart.id, 0).await?;
        cart.total_cents = 0;
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use harvest_domain::id::{CategoryId, WarehouseId};
    use harvest_domain::pagination::PageRequest;

    use crate::domain::types::{Product, ProductFilter, ProductPatch, ProductRating};

    #[derive(Clone, Default)]
    struct MockCartRepo {
        cart: Arc<Mutex<Option<Cart>>>,
        items: Arc<Mutex<Vec<CartItem>>>,
    }

    impl CartRepository for MockCartRepo {
        async fn find_by_user(
            &self,
            user_id: UserId,
        ) -> Result<Option<(Cart, Vec<CartItem>)>, ApiError> {
            let cart = self.cart.lock().unwrap().clone();
            Ok(cart
                .filter(|c| c.user_id == user_id)
                .map(|c| (c, self.items.lock().unwrap().clone())))
        }

        async fn create(&self, cart: &Cart) -> Result<(), ApiError> {
            *self.cart.lock().unwrap() = Some(cart.clone());
            Ok(())
        }

        async fn insert_item(&self, item: &CartItem) -> Result<(), ApiError> {
            self.items.lock().unwrap().push(item.clone());
            Ok(())
        }

        async fn set_item_quantity(
            &self,
            item_id: CartItemId,
            quantity: i32,
        ) -> Result<(), ApiError> {
            let mut items = self.items.lock().unwrap();
            items
                .iter_mut()
                .find(|item| item.id == item_id)
                .unwrap()
                .quantity = quantity;
            Ok(())
        }

        async fn delete_item(
            &self,
            _cart_id: CartId,
            item_id: CartItemId,
        ) -> Result<bool, ApiError> {
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|item| item.id != item_id);
            Ok(items.len() < before)
        }

        async fn clear(&self, _cart_id: CartId) -> Result<(), ApiError> {
            self.items.lock().unwrap().clear();
            Ok(())
        }

        async fn set_total(&self, _cart_id: CartId, total_cents: i64) -> Result<(), ApiError> {
            if let Some(cart) = self.cart.lock().unwrap().as_mut() {
                cart.total_cents = total_cents;
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MockProductRepo {
        products: Arc<Mutex<Vec<Product>>>,
    }

    impl ProductRepository for MockProductRepo {
        async fn list(
            &self,
            _filter: &ProductFilter,
            _page: PageRequest,
        ) -> Result<Vec<Product>, ApiError> {
            Ok(self.products.lock().unwrap().clone())
        }

        async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ApiError> {
            Ok(self
                .products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned())
        }

        async fn create(&self, product: &Product) -> Result<(), ApiError> {
            self.products.lock().unwrap().push(product.clone());
            Ok(())
        }

        async fn update(&self, _id: ProductId, _patch: &ProductPatch) -> Result<(), ApiError> {
            Ok(())
        }

        async fn upsert_rating(&self, _rating: &ProductRating) -> Result<f64, ApiError> {
            Ok(0.0)
        }
    }

    fn test_product(price_cents: i64, in_stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId(Uuid::now_v7()),
            name: "Tomatoes".into(),
            description: "Vine tomatoes".into(),
            price_cents,
            category_id: CategoryId(Uuid::now_v7()),
            warehouse_id: WarehouseId(Uuid::now_v7()),
            in_stock,
            images: vec![],
            is_available: true,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn repos_with_product(product: Product) -> (MockCartRepo, MockProductRepo) {
        let products = MockProductRepo::default();
        products.products.lock().unwrap().push(product);
        (MockCartRepo::default(), products)
    }

    #[tokio::test]
    async fn should_create_cart_lazily_on_first_access() {
        let user_id = UserId(Uuid::now_v7());
        let carts = MockCartRepo::default();
        let usecase = GetCartUseCase {
            carts: carts.clone(),
        };

        let (cart, items) = usecase.execute(user_id).await.unwrap();
        assert_eq!(cart.user_id, user_id);
        assert_eq!(cart.total_cents, 0);
        assert!(items.is_empty());

        // second access returns the same cart
        let (again, _) = usecase.execute(user_id).await.unwrap();
        assert_eq!(again.id, cart.id);
    }

    #[tokio::test]
    async fn should_add_item_capturing_unit_price() {
        let user_id = UserId(Uuid::now_v7());
        let product = test_product(1_250, 10);
        let product_id = product.id;
        let (carts, products) = repos_with_product(product);

        let usecase = AddCartItemUseCase { carts, products };
        let (cart, items) = usecase.execute(user_id, product_id, 2).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].unit_price_cents, 1_250);
        assert_eq!(cart.total_cents, 2_500);
    }

    #[tokio::test]
    async fn should_merge_quantities_preserving_captured_price() {
        let user_id = UserId(Uuid::now_v7());
        let product = test_product(1_000, 10);
        let product_id = product.id;
        let (carts, products) = repos_with_product(product);

        let usecase = AddCartItemUseCase {
            carts,
            products: products.clone(),
        };
        usecase.execute(user_id, product_id, 2).await.unwrap();

        // price goes up between adds
        products.products.lock().unwrap()[0].price_cents = 9_999;

        let (cart, items) = usecase.execute(user_id, product_id, 3).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[0].unit_price_cents, 1_000);
        assert_eq!(cart.total_cents, 5_000);
    }

    #[tokio::test]
    async fn should_reject_add_beyond_stock() {
        let user_id = UserId(Uuid::now_v7());
        let product = test_product(1_000, 4);
        let product_id = product.id;
        let (carts, products) = repos_with_product(product);

        let usecase = AddCartItemUseCase { carts, products };
        usecase.execute(user_id, product_id, 3).await.unwrap();

        let result = usecase.execute(user_id, product_id, 2).await;
        assert!(matches!(
            result,
            Err(ApiError::InsufficientStock { available: 4 })
        ));
    }

    #[tokio::test]
    async fn should_reject_zero_quantity() {
        let (carts, products) = repos_with_product(test_product(1_000, 4));
        let usecase = AddCartItemUseCase { carts, products };
        let result = usecase
            .execute(UserId(Uuid::now_v7()), ProductId(Uuid::now_v7()), 0)
            .await;
        assert!(matches!(result, Err(ApiError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn should_reject_unavailable_product() {
        let mut product = test_product(1_000, 4);
        product.is_available = false;
        let product_id = product.id;
        let (carts, products) = repos_with_product(product);

        let usecase = AddCartItemUseCase { carts, products };
        let result = usecase.execute(UserId(Uuid::now_v7()), product_id, 1).await;
        assert!(matches!(result, Err(ApiError::ProductUnavailable)));
    }

    #[tokio::test]
    async fn should_recompute_total_on_update_and_remove() {
        let user_id = UserId(Uuid::now_v7());
        let product = test_product(500, 100);
        let product_id = product.id;
        let (carts, products) = repos_with_product(product);

        let add = AddCartItemUseCase {
            carts: carts.clone(),
            products: products.clone(),
        };
        let (_, items) = add.execute(user_id, product_id, 2).await.unwrap();
        let item_id = items[0].id;

        let update = UpdateCartItemUseCase {
            carts: carts.clone(),
            products: products.clone(),
        };
        let (cart, _) = update.execute(user_id, item_id, 7).await.unwrap();
        assert_eq!(cart.total_cents, 3_500);

        let remove = RemoveCartItemUseCase {
            carts: carts.clone(),
        };
        let (cart, items) = remove.execute(user_id, item_id).await.unwrap();
        assert_eq!(cart.total_cents, 0);
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_item() {
        let user_id = UserId(Uuid::now_v7());
        let (carts, products) = repos_with_product(test_product(500, 100));

        // materialize the cart first
        GetCartUseCase {
            carts: carts.clone(),
        }
        .execute(user_id)
        .await
        .unwrap();

        let update = UpdateCartItemUseCase {
            carts: carts.clone(),
            products,
        };
        let result = update
            .execute(user_id, CartItemId(Uuid::now_v7()), 1)
            .await;
        assert!(matches!(result, Err(ApiError::CartItemNotFound)));

        let remove = RemoveCartItemUseCase { carts };
        let result = remove.execute(user_id, CartItemId(Uuid::now_v7())).await;
        assert!(matches!(result, Err(ApiError::CartItemNotFound)));
    }

    #[tokio::test]
    async fn should_clear_cart_and_zero_total() {
        let user_id = UserId(Uuid::now_v7());
        let product = test_product(500, 100);
        let product_id = product.id;
        let (carts, products) = repos_with_product(product);

        AddCartItemUseCase {
            carts: carts.clone(),
            products,
        }
        .execute(user_id, product_id, 3)
        .await
        .unwrap();

        let cart = ClearCartUseCase {
            carts: carts.clone(),
        }
        .execute(user_id)
        .await
        .unwrap();
        assert_eq!(cart.total_cents, 0);
        assert!(carts.items.lock().unwrap().is_empty());
    }
}
