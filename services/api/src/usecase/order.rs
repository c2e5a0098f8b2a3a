use chrono::Utc;
use uuid::Uuid;

use harvest_domain::id::{OrderId, ProductId, UserId};

use crate::domain::repository::{CartRepository, OrderRepository, ProductRepository};
use crate::domain::types::{Order, OrderLine, OrderStatus, PaymentMethod, ShippingAddress};
use crate::error::ApiError;

// ── PlaceOrder ───────────────────────────────────────────────────────────────

pub struct OrderItemInput {
    pub product_id: ProductId,
    pub quantity: i32,
}

pub struct PlaceOrderInput {
    pub items: Vec<OrderItemInput>,
    pub payment_method: PaymentMethod,
    pub shipping: ShippingAddress,
}

pub struct PlaceOrderUseCase<C, P, O>
where
    C: CartRepository,
    P: ProductRepository,
    O: OrderRepository,
{
    pub carts: C,
    pub products: P,
    pub orders: O,
}

impl<C, P, O> PlaceOrderUseCase<C, P, O>
where
    C: CartRepository,
    P: ProductRepository,
    O: OrderRepository,
{
    /// Place an order from a client-supplied item list. Lines are priced at
    /// the product's current price; the buyer's cart is cleared whether or
    /// not the ordered items came from it.
    pub async fn execute(
        &self,
        user_id: UserId,
        input: PlaceOrderInput,
    ) -> Result<(Order, Vec<OrderLine>), ApiError> {
        if input.items.is_empty() {
            return Err(ApiError::EmptyOrder);
        }

        // Validation pass: abort before any write. The stock reads here are
        // advisory; the authoritative guard is the conditional decrement
        // inside the placement transaction.
        let mut lines = Vec::with_capacity(input.items.len());
        let mut total_cents = 0i64;
        for item in &input.items {
            if item.quantity < 1 {
                return Err(ApiError::InvalidQuantity);
            }
            let product = self
                .products
                .find_by_id(item.product_id)
                .await?
                .ok_or(ApiError::ProductNotFound)?;
            if !product.is_available {
                return Err(ApiError::ProductUnavailable);
            }
            if item.quantity > product.in_stock {
                return Err(ApiError::InsufficientStock {
                    available: product.in_stock,
                });
            }
            total_cents += i64::from(item.quantity) * product.price_cents;
            lines.push(OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price_cents: product.price_cents,
            });
        }

        let cart_id = self
            .carts
            .find_by_user(user_id)
            .await?
            .map(|(cart, _)| cart.id);

        let now = Utc::now();
        let order = Order {
            id: OrderId(Uuid::now_v7()),
            user_id,
            status: OrderStatus::Pending,
            payment_method: input.payment_method,
            total_cents,
            shipping: input.shipping,
            created_at: now,
            updated_at: now,
        };

        self.orders.place(&order, &lines, cart_id).await?;
        Ok((order, lines))
    }
}

// ── ListOrders / GetOrder ────────────────────────────────────────────────────

pub struct ListOrdersUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> ListOrdersUseCase<O> {
    pub async fn execute(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        self.orders.list_by_user(user_id).await
    }
}

pub struct GetOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> GetOrderUseCase<O> {
    pub async fn execute(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<(Order, Vec<OrderLine>), ApiError> {
        let (order, lines) = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(ApiError::OrderNotFound)?;
        // other users' orders are indistinguishable from missing ones
        if order.user_id != user_id {
            return Err(ApiError::OrderNotFound);
        }
        Ok((order, lines))
    }
}

// ── CancelOrder ──────────────────────────────────────────────────────────────

pub struct CancelOrderUseCase<O: OrderRepository> {
    pub orders: O,
}

impl<O: OrderRepository> CancelOrderUseCase<O> {
    pub async fn execute(&self, user_id: UserId, order_id: OrderId) -> Result<Order, ApiError> {
        let (mut order, _) = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(ApiError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(ApiError::OrderNotFound);
        }
        if !order.status.can_cancel() {
            return Err(ApiError::CannotCancel {
                status: order.status.to_string(),
            });
        }
        self.orders.cancel_with_restock(order.id).await?;
        order.status = OrderStatus::Cancelled;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use harvest_domain::id::{CartId, CartItemId, CategoryId, WarehouseId};
    use harvest_domain::pagination::PageRequest;

    use crate::domain::types::{
        Cart, CartItem, Product, ProductFilter, ProductPatch, ProductRating,
    };

    #[derive(Clone, Default)]
    struct MockCartRepo {
        cart: Arc<Mutex<Option<Cart>>>,
    }

    impl CartRepository for MockCartRepo {
        async fn find_by_user(
            &self,
            _user_id: UserId,
        ) -> Result<Option<(Cart, Vec<CartItem>)>, ApiError> {
            Ok(self
                .cart
                .lock()
                .unwrap()
                .clone()
                .map(|cart| (cart, Vec::new())))
        }

        async fn create(&self, _cart: &Cart) -> Result<(), ApiError> {
            Ok(())
        }

        async fn insert_item(&self, _item: &CartItem) -> Result<(), ApiError> {
            Ok(())
        }

        async fn set_item_quantity(
            &self,
            _item_id: CartItemId,
            _quantity: i32,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn delete_item(
            &self,
            _cart_id: CartId,
            _item_id: CartItemId,
        ) -> Result<bool, ApiError> {
            Ok(false)
        }

        async fn clear(&self, _cart_id: CartId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn set_total(&self, _cart_id: CartId, _total_cents: i64) -> Result<(), ApiError> {
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
            Ok(vec![])
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

        async fn create(&self, _product: &Product) -> Result<(), ApiError> {
            Ok(())
        }

        async fn update(&self, _id: ProductId, _patch: &ProductPatch) -> Result<(), ApiError> {
            Ok(())
        }

        async fn upsert_rating(&self, _rating: &ProductRating) -> Result<f64, ApiError> {
            Ok(0.0)
        }
    }

    #[derive(Clone, Default)]
    struct MockOrderRepo {
        orders: Arc<Mutex<Vec<(Order, Vec<OrderLine>)>>>,
        placed_from: Arc<Mutex<Option<Option<CartId>>>>,
        cancelled: Arc<Mutex<Vec<OrderId>>>,
    }

    impl OrderRepository for MockOrderRepo {
        async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|(o, _)| o.user_id == user_id)
                .map(|(o, _)| o.clone())
                .collect())
        }

        async fn find_by_id(
            &self,
            id: OrderId,
        ) -> Result<Option<(Order, Vec<OrderLine>)>, ApiError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|(o, _)| o.id == id)
                .cloned())
        }

        async fn place(
            &self,
            order: &Order,
            lines: &[OrderLine],
            cart_id: Option<CartId>,
        ) -> Result<(), ApiError> {
            self.orders
                .lock()
                .unwrap()
                .push((order.clone(), lines.to_vec()));
            *self.placed_from.lock().unwrap() = Some(cart_id);
            Ok(())
        }

        async fn cancel_with_restock(&self, id: OrderId) -> Result<(), ApiError> {
            // pending-only flip, like the store's conditional update
            let mut orders = self.orders.lock().unwrap();
            let Some((order, _)) = orders.iter_mut().find(|(o, _)| o.id == id) else {
                return Err(ApiError::OrderNotFound);
            };
            if !order.status.can_cancel() {
                return Err(ApiError::CannotCancel {
                    status: order.status.to_string(),
                });
            }
            order.status = OrderStatus::Cancelled;
            self.cancelled.lock().unwrap().push(id);
            Ok(())
        }
    }

    /// Order repo that reports a pending order but loses the cancel flip, as
    /// when another request cancels between the status read and the store
    /// update.
    #[derive(Clone)]
    struct LostRaceOrderRepo {
        order: Order,
        restocks: Arc<Mutex<u32>>,
    }

    impl OrderRepository for LostRaceOrderRepo {
        async fn list_by_user(&self, _user_id: UserId) -> Result<Vec<Order>, ApiError> {
            Ok(vec![self.order.clone()])
        }

        async fn find_by_id(
            &self,
            _id: OrderId,
        ) -> Result<Option<(Order, Vec<OrderLine>)>, ApiError> {
            Ok(Some((self.order.clone(), vec![])))
        }

        async fn place(
            &self,
            _order: &Order,
            _lines: &[OrderLine],
            _cart_id: Option<CartId>,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn cancel_with_restock(&self, _id: OrderId) -> Result<(), ApiError> {
            Err(ApiError::CannotCancel {
                status: "cancelled".to_owned(),
            })
        }
    }

    fn test_product(id: ProductId, price_cents: i64, in_stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id,
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

    fn empty_cart(user_id: UserId) -> Cart {
        let now = Utc::now();
        Cart {
            id: CartId(Uuid::now_v7()),
            user_id,
            total_cents: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(product_id: ProductId, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
        }
    }

    fn shipping() -> ShippingAddress {
        ShippingAddress {
            address: "1 Farm Lane".into(),
            city: "Utrecht".into(),
            postal_code: "3511".into(),
            country: "NL".into(),
        }
    }

    fn place_input(items: Vec<OrderItemInput>) -> PlaceOrderInput {
        PlaceOrderInput {
            items,
            payment_method: PaymentMethod::Stripe,
            shipping: shipping(),
        }
    }

    fn test_order(user_id: UserId, status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId(Uuid::now_v7()),
            user_id,
            status,
            payment_method: PaymentMethod::Stripe,
            total_cents: 1_000,
            shipping: shipping(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn should_reject_empty_item_list() {
        let usecase = PlaceOrderUseCase {
            carts: MockCartRepo::default(),
            products: MockProductRepo::default(),
            orders: MockOrderRepo::default(),
        };
        let result = usecase
            .execute(UserId(Uuid::now_v7()), place_input(vec![]))
            .await;
        assert!(matches!(result, Err(ApiError::EmptyOrder)));
    }

    #[tokio::test]
    async fn should_abort_before_any_write_when_a_line_is_unavailable() {
        let user_id = UserId(Uuid::now_v7());
        let good_id = ProductId(Uuid::now_v7());
        let bad_id = ProductId(Uuid::now_v7());
        let mut bad = test_product(bad_id, 2_000, 10);
        bad.is_available = false;

        let products = MockProductRepo::default();
        {
            let mut guard = products.products.lock().unwrap();
            guard.push(test_product(good_id, 1_000, 10));
            guard.push(bad);
        }
        let orders = MockOrderRepo::default();

        let usecase = PlaceOrderUseCase {
            carts: MockCartRepo::default(),
            products,
            orders: orders.clone(),
        };
        let result = usecase
            .execute(user_id, place_input(vec![item(good_id, 1), item(bad_id, 1)]))
            .await;

        assert!(matches!(result, Err(ApiError::ProductUnavailable)));
        assert!(orders.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_abort_when_stock_insufficient() {
        let user_id = UserId(Uuid::now_v7());
        let product_id = ProductId(Uuid::now_v7());

        let products = MockProductRepo::default();
        products
            .products
            .lock()
            .unwrap()
            .push(test_product(product_id, 1_000, 2));
        let orders = MockOrderRepo::default();

        let usecase = PlaceOrderUseCase {
            carts: MockCartRepo::default(),
            products,
            orders: orders.clone(),
        };
        let result = usecase
            .execute(user_id, place_input(vec![item(product_id, 5)]))
            .await;

        assert!(matches!(
            result,
            Err(ApiError::InsufficientStock { available: 2 })
        ));
        assert!(orders.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_nonpositive_line_quantity() {
        let product_id = ProductId(Uuid::now_v7());
        let products = MockProductRepo::default();
        products
            .products
            .lock()
            .unwrap()
            .push(test_product(product_id, 1_000, 10));

        let usecase = PlaceOrderUseCase {
            carts: MockCartRepo::default(),
            products,
            orders: MockOrderRepo::default(),
        };
        let result = usecase
            .execute(UserId(Uuid::now_v7()), place_input(vec![item(product_id, 0)]))
            .await;
        assert!(matches!(result, Err(ApiError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn should_price_lines_from_current_product_prices() {
        let user_id = UserId(Uuid::now_v7());
        let a = ProductId(Uuid::now_v7());
        let b = ProductId(Uuid::now_v7());

        let products = MockProductRepo::default();
        {
            let mut guard = products.products.lock().unwrap();
            guard.push(test_product(a, 800, 10));
            guard.push(test_product(b, 1_250, 10));
        }
        let carts = MockCartRepo::default();
        let cart = empty_cart(user_id);
        let cart_id = cart.id;
        *carts.cart.lock().unwrap() = Some(cart);
        let orders = MockOrderRepo::default();

        let usecase = PlaceOrderUseCase {
            carts,
            products,
            orders: orders.clone(),
        };
        let (order, lines) = usecase
            .execute(user_id, place_input(vec![item(a, 3), item(b, 1)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 3 * 800 + 1_250);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price_cents, 800);
        assert_eq!(lines[1].unit_price_cents, 1_250);
        // the cart is cleared even though the items came from the request body
        assert_eq!(*orders.placed_from.lock().unwrap(), Some(Some(cart_id)));
    }

    #[tokio::test]
    async fn should_place_order_when_user_has_no_cart() {
        let user_id = UserId(Uuid::now_v7());
        let product_id = ProductId(Uuid::now_v7());

        let products = MockProductRepo::default();
        products
            .products
            .lock()
            .unwrap()
            .push(test_product(product_id, 500, 10));
        let orders = MockOrderRepo::default();

        let usecase = PlaceOrderUseCase {
            carts: MockCartRepo::default(),
            products,
            orders: orders.clone(),
        };
        let (order, _) = usecase
            .execute(user_id, place_input(vec![item(product_id, 2)]))
            .await
            .unwrap();

        assert_eq!(order.total_cents, 1_000);
        assert_eq!(*orders.placed_from.lock().unwrap(), Some(None));
    }

    #[tokio::test]
    async fn should_cancel_pending_order_with_restock() {
        let user_id = UserId(Uuid::now_v7());
        let order = test_order(user_id, OrderStatus::Pending);
        let order_id = order.id;

        let orders = MockOrderRepo::default();
        orders.orders.lock().unwrap().push((order, vec![]));

        let usecase = CancelOrderUseCase {
            orders: orders.clone(),
        };
        let cancelled = usecase.execute(user_id, order_id).await.unwrap();

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(orders.cancelled.lock().unwrap().as_slice(), &[order_id]);
    }

    #[tokio::test]
    async fn should_reject_cancel_of_non_pending_order() {
        let user_id = UserId(Uuid::now_v7());
        let order = test_order(user_id, OrderStatus::Shipped);
        let order_id = order.id;

        let orders = MockOrderRepo::default();
        orders.orders.lock().unwrap().push((order, vec![]));

        let usecase = CancelOrderUseCase {
            orders: orders.clone(),
        };
        let result = usecase.execute(user_id, order_id).await;

        match result {
            Err(ApiError::CannotCancel { status }) => assert_eq!(status, "shipped"),
            other => panic!("expected CannotCancel, got {other:?}"),
        }
        assert!(orders.cancelled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_restock_only_once_when_cancelled_twice() {
        let user_id = UserId(Uuid::now_v7());
        let order = test_order(user_id, OrderStatus::Pending);
        let order_id = order.id;

        let orders = MockOrderRepo::default();
        orders.orders.lock().unwrap().push((order, vec![]));
        let usecase = CancelOrderUseCase {
            orders: orders.clone(),
        };

        usecase.execute(user_id, order_id).await.unwrap();
        let second = usecase.execute(user_id, order_id).await;

        match second {
            Err(ApiError::CannotCancel { status }) => assert_eq!(status, "cancelled"),
            other => panic!("expected CannotCancel, got {other:?}"),
        }
        assert_eq!(orders.cancelled.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_surface_lost_cancel_race_without_restock() {
        let user_id = UserId(Uuid::now_v7());
        let repo = LostRaceOrderRepo {
            order: test_order(user_id, OrderStatus::Pending),
            restocks: Arc::new(Mutex::new(0)),
        };
        let order_id = repo.order.id;

        let usecase = CancelOrderUseCase {
            orders: repo.clone(),
        };
        let result = usecase.execute(user_id, order_id).await;

        match result {
            Err(ApiError::CannotCancel { status }) => assert_eq!(status, "cancelled"),
            other => panic!("expected CannotCancel, got {other:?}"),
        }
        assert_eq!(*repo.restocks.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn should_hide_other_users_orders() {
        let owner = UserId(Uuid::now_v7());
        let stranger = UserId(Uuid::now_v7());
        let order = test_order(owner, OrderStatus::Pending);
        let order_id = order.id;

        let orders = MockOrderRepo::default();
        orders.orders.lock().unwrap().push((order, vec![]));

        let get = GetOrderUseCase {
            orders: orders.clone(),
        };
        assert!(matches!(
            get.execute(stranger, order_id).await,
            Err(ApiError::OrderNotFound)
        ));

        let cancel = CancelOrderUseCase { orders };
        assert!(matches!(
            cancel.execute(stranger, order_id).await,
            Err(ApiError::OrderNotFound)
        ));
    }
}
