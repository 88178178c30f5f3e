use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{info, warn};

use kunan_core::config::StorageConfig;
use kunan_core::domain::order::{Order, OrderPayload};

use super::{OrderRepository, RepositoryError};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";

#[derive(Clone, Debug)]
pub struct DocumentStoreSettings {
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<SecretString>,
    pub database_id: String,
    pub collection_id: String,
}

impl From<&StorageConfig> for DocumentStoreSettings {
    fn from(storage: &StorageConfig) -> Self {
        Self {
            endpoint: storage.endpoint.clone(),
            project_id: storage.project_id.clone(),
            api_key: storage.api_key.clone(),
            database_id: storage.database_id.clone(),
            collection_id: storage.collection_id.clone(),
        }
    }
}

/// Writes orders to a hosted document database over its REST API.
pub struct DocumentOrderRepository {
    client: Client,
    settings: DocumentStoreSettings,
}

#[derive(Serialize)]
struct CreateDocumentBody<'a> {
    #[serde(rename = "documentId")]
    document_id: &'a str,
    data: OrderPayload<'a>,
}

impl DocumentOrderRepository {
    pub fn new(settings: DocumentStoreSettings) -> Self {
        Self { client: Client::new(), settings }
    }

    fn documents_url(&self) -> Result<String, RepositoryError> {
        let endpoint = self
            .settings
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or_else(|| RepositoryError::NotConfigured("storage.endpoint is not set".to_string()))?;

        Ok(format!(
            "{}/databases/{}/collections/{}/documents",
            endpoint.trim_end_matches('/'),
            self.settings.database_id,
            self.settings.collection_id
        ))
    }
}

#[async_trait::async_trait]
impl OrderRepository for DocumentOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), RepositoryError> {
        let url = self.documents_url()?;
        let body = CreateDocumentBody { document_id: &order.id.0, data: order.payload() };

        let mut request = self.client.post(&url).json(&body);
        if let Some(project_id) = self.settings.project_id.as_deref() {
            request = request.header(PROJECT_HEADER, project_id);
        }
        if let Some(api_key) = self.settings.api_key.as_ref() {
            request = request.header(KEY_HEADER, api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| {
            warn!(
                event_name = "persistence.order.transport_failed",
                order_id = %order.id.0,
                error = %error,
                "order store request failed"
            );
            RepositoryError::Http(error)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "persistence.order.rejected",
                order_id = %order.id.0,
                status = status.as_u16(),
                "order store rejected document"
            );
            return Err(RepositoryError::Rejected { status: status.as_u16(), body });
        }

        info!(
            event_name = "persistence.order.created",
            order_id = %order.id.0,
            collection_id = %self.settings.collection_id,
            "order document created"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use kunan_core::domain::order::{Order, OrderId};
    use kunan_core::domain::quote::Quote;

    use crate::repositories::{
        DocumentOrderRepository, DocumentStoreSettings, OrderRepository, RepositoryError,
    };

    fn order() -> Order {
        Order::from_quote(
            OrderId("ord-42".to_string()),
            Quote {
                task: "Llevar llaves a 10 cuadras en Miraflores".to_string(),
                price: 8.0,
                eta: "20 minutos".to_string(),
                category: "Flash".to_string(),
                justification: "Recorrido corto, tarifa base".to_string(),
            },
        )
    }

    fn settings(endpoint: Option<String>) -> DocumentStoreSettings {
        DocumentStoreSettings {
            endpoint,
            project_id: Some("kunan-project".to_string()),
            api_key: Some("server-key".to_string().into()),
            database_id: "kunan_db".to_string(),
            collection_id: "orders".to_string(),
        }
    }

    #[tokio::test]
    async fn create_posts_document_with_project_headers() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/databases/kunan_db/collections/orders/documents")
                    .header("x-appwrite-project", "kunan-project")
                    .header("x-appwrite-key", "server-key")
                    .json_body(json!({
                        "documentId": "ord-42",
                        "data": {
                            "task": "Llevar llaves a 10 cuadras en Miraflores",
                            "price": 8.0,
                            "eta": "20 minutos",
                            "category": "Flash",
                            "justification": "Recorrido corto, tarifa base",
                            "status": "pending"
                        }
                    }));
                then.status(201).json_body(json!({ "$id": "ord-42" }));
            })
            .await;

        let repo = DocumentOrderRepository::new(settings(Some(format!("{}/v1/", server.base_url()))));
        repo.create(&order()).await.expect("document created");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_reported_as_rejection() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/databases/kunan_db/collections/orders/documents");
                then.status(401).body("missing scope");
            })
            .await;

        let repo = DocumentOrderRepository::new(settings(Some(server.base_url())));
        let error = repo.create(&order()).await.expect_err("unauthorized");

        mock.assert_async().await;
        assert!(matches!(
            error,
            RepositoryError::Rejected { status: 401, ref body } if body == "missing scope"
        ));
    }

    #[tokio::test]
    async fn missing_endpoint_fails_at_call_time() {
        let repo = DocumentOrderRepository::new(settings(None));

        let error = repo.create(&order()).await.expect_err("not configured");

        assert!(matches!(error, RepositoryError::NotConfigured(_)));
    }
}
