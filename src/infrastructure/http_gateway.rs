//! reqwest-backed client for the Order and Catalog services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::domain::catalog::MenuItem;
use crate::domain::errors::GatewayError;
use crate::domain::order::{CreatedOrder, OrderRequest, OrderStatus, OrderView};
use crate::domain::ports::{CatalogGateway, OrderGateway};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusChange {
    status: OrderStatus,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpOrderGateway {
    client: Client,
    base_url: String,
}

impl HttpOrderGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Maps non-2xx responses onto `GatewayError::Server`, preferring the
    /// body's `error` field for the message.
    async fn check(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.error.or(body.message));
        log::debug!("Service answered {}: {}", status, text);
        Err(GatewayError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn create_order(
        &self,
        request: &OrderRequest,
        idempotency_key: &str,
    ) -> Result<CreatedOrder, GatewayError> {
        let response = self
            .client
            .post(self.url("orders"))
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_order(&self, id: &str) -> Result<Option<OrderView>, GatewayError> {
        let response = self.client.get(self.url(&format!("orders/{}", id))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<OrderView, GatewayError> {
        let response = self
            .client
            .patch(self.url(&format!("orders/{}/status", id)))
            .json(&StatusChange { status })
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl CatalogGateway for HttpOrderGateway {
    async fn list_menu(&self) -> Result<Vec<MenuItem>, GatewayError> {
        let response = self.client.get(self.url("menu")).send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let gateway = HttpOrderGateway::new(&ClientConfig::new("http://svc/api/")).unwrap();
        assert_eq!(gateway.url("orders"), "http://svc/api/orders");
        assert_eq!(gateway.url("/orders/1/status"), "http://svc/api/orders/1/status");
    }
}
