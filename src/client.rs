use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, error};

use crate::{metrics, request::SignedRequest, ProxyError, Result};

pub const DEFAULT_VENDOR_ENDPOINT: &str = "https://esa.cn-hangzhou.aliyuncs.com";

/// Outbound call to the vendor analytics API.
#[async_trait]
pub trait VendorClient: Send + Sync {
    async fn fetch(&self, request: &SignedRequest) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct HttpVendorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpVendorClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("edge_analytics_proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, endpoint))
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VendorClient for HttpVendorClient {
    async fn fetch(&self, request: &SignedRequest) -> Result<Value> {
        let _timer = metrics::UpstreamTimer::new();
        let url = format!("{}/", self.endpoint);
        debug!("Calling vendor API {} action={:?}", url, request.get("Action"));

        let response = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .query(request.params())
            .send()
            .await
            .map_err(|e| {
                metrics::record_upstream("transport_error");
                ProxyError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Vendor API error response ({}): {}", status, body);
            metrics::record_upstream("http_error");
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        let body = response.json::<Value>().await.map_err(|e| {
            metrics::record_upstream("decode_error");
            ProxyError::from(e)
        })?;
        metrics::record_upstream("success");
        Ok(body)
    }
}
