pub mod repositories;

pub use repositories::{
    order_repository_from_config, DocumentOrderRepository, DocumentStoreSettings,
    InMemoryOrderRepository, OrderRepository, RepositoryError,
};
