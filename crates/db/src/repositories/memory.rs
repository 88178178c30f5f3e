use std::collections::HashMap;

use tokio::sync::RwLock;

use kunan_core::domain::order::{Order, OrderId};

use super::{OrderRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderRepository {
    pub async fn find_by_id(&self, id: &OrderId) -> Option<Order> {
        let orders = self.orders.read().await;
        orders.get(&id.0).cloned()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id.0) {
            return Err(RepositoryError::Duplicate(order.id.0.clone()));
        }
        orders.insert(order.id.0.clone(), order.clone());
        Ok(())
    }
}
