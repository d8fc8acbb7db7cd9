use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::future::try_join;
use reqwest::{Client, header};
use serde_json::Value;

use crate::connector::{
    error::{ConnectorError, internal_error},
    http_common,
    types::{HeaderPair, RawResponse, TurnOutcome, TurnRequests},
};

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Returns the response for any HTTP status; only transport-level failures
    /// are errors here.
    async fn post_json(
        &self,
        url: &str,
        headers: &[HeaderPair],
        body: &Value,
    ) -> Result<RawResponse, ConnectorError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| internal_error(format!("failed to build http client: {}", err)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[HeaderPair],
        body: &Value,
    ) -> Result<RawResponse, ConnectorError> {
        let mut req_builder = self.client.post(url).body(body.to_string());
        for (name, value) in headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        let response = req_builder
            .send()
            .await
            .map_err(|err| ConnectorError::dispatch(url, err))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|err| ConnectorError::dispatch(url, err))?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Runs the channel call and the optional analytics call side by side under
/// one deadline. The first failure wins and drops the other call.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn dispatch(
        &self,
        requests: &TurnRequests,
        deadline: Duration,
    ) -> Result<TurnOutcome, ConnectorError> {
        let channel = &requests.channel;
        let primary = self.call(&channel.url, &channel.headers, &channel.body);
        let analytics = async {
            match &requests.analytics {
                Some(analytics) => self
                    .call(&analytics.url, &analytics.headers, &analytics.body)
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };

        let endpoint = http_common::redact_endpoint(&channel.url);
        tracing::debug!(
            target: "connector",
            endpoint = %endpoint,
            analytics = requests.analytics.is_some(),
            deadline_ms = deadline.as_millis() as u64,
            "dispatch_started"
        );

        match tokio::time::timeout(deadline, try_join(primary, analytics)).await {
            Ok(Ok((primary, analytics))) => Ok(TurnOutcome { primary, analytics }),
            Ok(Err(err)) => {
                tracing::warn!(
                    target: "connector",
                    endpoint = err.endpoint.as_deref().unwrap_or("-"),
                    kind = ?err.kind,
                    http_status = ?err.http_status,
                    "dispatch_failed"
                );
                Err(err)
            }
            Err(_) => {
                tracing::warn!(
                    target: "connector",
                    endpoint = %endpoint,
                    deadline_ms = deadline.as_millis() as u64,
                    "dispatch_timed_out"
                );
                Err(ConnectorError::timeout(&channel.url, deadline))
            }
        }
    }

    async fn call(
        &self,
        url: &str,
        headers: &[HeaderPair],
        body: &Value,
    ) -> Result<RawResponse, ConnectorError> {
        let raw = self.transport.post_json(url, headers, body).await?;
        http_common::ensure_success(raw, url)
    }
}
