use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use kunan_core::config::{StorageBackend, StorageConfig};
use kunan_core::domain::order::Order;
use kunan_core::errors::ApplicationError;

pub mod document;
pub mod memory;

pub use document::{DocumentOrderRepository, DocumentStoreSettings};
pub use memory::InMemoryOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("order store is not configured: {0}")]
    NotConfigured(String),
    #[error("order store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("order store rejected the document with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("order `{0}` already exists")]
    Duplicate(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Writes one order document keyed by its id.
    async fn create(&self, order: &Order) -> Result<(), RepositoryError>;
}

/// Picks the backend named by `storage.backend`.
pub fn order_repository_from_config(storage: &StorageConfig) -> Arc<dyn OrderRepository> {
    match storage.backend {
        StorageBackend::Document => {
            Arc::new(DocumentOrderRepository::new(DocumentStoreSettings::from(storage)))
        }
        StorageBackend::Memory => Arc::new(InMemoryOrderRepository::default()),
    }
}
