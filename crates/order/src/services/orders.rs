//! Order history and administrative status changes.

use madeinworld_core::{Email, MiniAppType, OrderId, OrderStatus, SessionClaims, UserId};

use super::error::OrderError;
use super::store::OrderStore;
use crate::models::Order;

/// Read and administer orders for one request.
pub struct OrderService<'a, O> {
    orders: &'a O,
}

impl<'a, O: OrderStore> OrderService<'a, O> {
    #[must_use]
    pub const fn new(orders: &'a O) -> Self {
        Self { orders }
    }

    /// The user's orders in one storefront, newest first.
    ///
    /// # Errors
    ///
    /// `Repository` on storage failure.
    pub async fn history(
        &self,
        user_id: UserId,
        mini_app_type: MiniAppType,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.orders_for(user_id, mini_app_type).await?)
    }

    /// One order, visible only to the user who placed it.
    ///
    /// # Errors
    ///
    /// `NotFound` if the order does not exist or belongs to someone else.
    pub async fn get_for_user(&self, user_id: UserId, id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .order(id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(OrderError::NotFound)
    }

    /// Move an order to `next` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless `caller` is an administrator session for the
    ///   configured address (see [`is_admin_session`])
    /// - `NotFound` for an unknown order
    /// - `InvalidTransition` if the state machine does not allow the step,
    ///   including when a concurrent update moved the order first
    #[tracing::instrument(skip(self, admin, caller), fields(caller = %caller.email))]
    pub async fn update_status(
        &self,
        admin: Option<&Email>,
        caller: &SessionClaims,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, OrderError> {
        if !admin.is_some_and(|admin| is_admin_session(admin, caller)) {
            tracing::warn!(subject = %caller.sub, "Order status change by non-administrator");
            return Err(OrderError::Forbidden);
        }

        let current = self.orders.order(id).await?.ok_or(OrderError::NotFound)?;
        if !current.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to: next,
            });
        }

        let updated = self
            .orders
            .transition_status(id, current.status, next)
            .await?
            .ok_or(OrderError::InvalidTransition {
                from: current.status,
                to: next,
            })?;

        tracing::info!(order_id = %id, from = %current.status, to = %next, "Order status changed");
        Ok(updated)
    }
}

/// True when `caller` was minted by the administrator verification flow
/// for `admin`: both the email claim and the administrator subject must
/// match. Shopper flows never issue that subject.
#[must_use]
pub fn is_admin_session(admin: &Email, caller: &SessionClaims) -> bool {
    Email::parse(&caller.email).is_ok_and(|email| email == *admin)
        && caller.sub == admin.admin_subject()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::CartKey;
    use crate::services::checkout::CheckoutService;
    use crate::services::memory::MemoryShop;
    use crate::services::store::CartStore;

    const ADMIN: &str = "admin@madeinworld.com";

    async fn placed_order(shop: &MemoryShop, user: UserId) -> Order {
        let product_id = shop.stock("2.00", 50);
        let key = CartKey {
            user_id: user,
            mini_app_type: MiniAppType::GroupBuying,
            product_id,
        };
        shop.add_quantity(&key, 2).await.unwrap();
        CheckoutService::new(shop, shop)
            .checkout(user, MiniAppType::GroupBuying)
            .await
            .unwrap()
    }

    fn admin() -> Email {
        Email::parse(ADMIN).unwrap()
    }

    fn session(sub: &str, email: &str) -> SessionClaims {
        SessionClaims {
            sub: sub.to_owned(),
            email: email.to_owned(),
            iat: 0,
            exp: 0,
        }
    }

    fn admin_session() -> SessionClaims {
        session(&admin().admin_subject(), ADMIN)
    }

    #[tokio::test]
    async fn test_history_is_scoped_to_user_and_storefront() {
        let shop = MemoryShop::default();
        let alice = UserId::generate();
        let bob = UserId::generate();
        placed_order(&shop, alice).await;
        placed_order(&shop, alice).await;
        placed_order(&shop, bob).await;
        let service = OrderService::new(&shop);

        assert_eq!(service.history(alice, MiniAppType::GroupBuying).await.unwrap().len(), 2);
        assert!(service.history(alice, MiniAppType::RetailStore).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_users_order_is_not_found() {
        let shop = MemoryShop::default();
        let alice = UserId::generate();
        let order = placed_order(&shop, alice).await;
        let service = OrderService::new(&shop);

        assert_eq!(service.get_for_user(alice, order.id).await.unwrap().id, order.id);
        assert!(matches!(
            service.get_for_user(UserId::generate(), order.id).await.unwrap_err(),
            OrderError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_admin_walks_order_to_delivered() {
        let shop = MemoryShop::default();
        let order = placed_order(&shop, UserId::generate()).await;
        let service = OrderService::new(&shop);
        let admin = admin();

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            let updated = service
                .update_status(Some(&admin), &admin_session(), order.id, next)
                .await
                .unwrap();
            assert_eq!(updated.status, next);
        }
    }

    #[tokio::test]
    async fn test_illegal_transition_is_rejected() {
        let shop = MemoryShop::default();
        let order = placed_order(&shop, UserId::generate()).await;
        let admin = admin();

        let err = OrderService::new(&shop)
            .update_status(Some(&admin), &admin_session(), order.id, OrderStatus::Shipped)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Shipped,
            }
        ));
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let shop = MemoryShop::default();
        let order = placed_order(&shop, UserId::generate()).await;
        let admin = admin();
        let service = OrderService::new(&shop);

        assert!(matches!(
            service
                .update_status(
                    Some(&admin),
                    &session(&UserId::generate().to_string(), "shopper@example.com"),
                    order.id,
                    OrderStatus::Cancelled
                )
                .await
                .unwrap_err(),
            OrderError::Forbidden
        ));
        assert!(matches!(
            service
                .update_status(None, &admin_session(), order.id, OrderStatus::Cancelled)
                .await
                .unwrap_err(),
            OrderError::Forbidden
        ));
    }

    #[tokio::test]
    async fn test_admin_email_match_ignores_case() {
        let shop = MemoryShop::default();
        let order = placed_order(&shop, UserId::generate()).await;
        let admin = admin();

        let updated = OrderService::new(&shop)
            .update_status(
                Some(&admin),
                &session(&admin.admin_subject(), "Admin@MadeInWorld.com"),
                order.id,
                OrderStatus::Cancelled,
            )
            .await
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_shopper_account_with_admin_email_is_forbidden() {
        let shop = MemoryShop::default();
        let order = placed_order(&shop, UserId::generate()).await;
        let admin = admin();
        let self_registered = session(&UserId::generate().to_string(), ADMIN);

        let err = OrderService::new(&shop)
            .update_status(Some(&admin), &self_registered, order.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::Forbidden));
        let stored = OrderService::new(&shop).get_for_user(order.user_id, order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[test]
    fn test_admin_session_needs_subject_and_email() {
        let admin = admin();

        assert!(is_admin_session(&admin, &admin_session()));
        assert!(!is_admin_session(&admin, &session("admin-1", ADMIN)));
        assert!(!is_admin_session(
            &admin,
            &session(&admin.admin_subject(), "shopper@example.com")
        ));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let shop = MemoryShop::default();
        let admin = admin();

        let err = OrderService::new(&shop)
            .update_status(
                Some(&admin),
                &admin_session(),
                OrderId::generate(),
                OrderStatus::Confirmed,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::NotFound));
    }
}
