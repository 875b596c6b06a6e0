//! HTTP Research Producer
//!
//! Fetches guided research answers from the research backend for the warmer.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::warmer::ResearchProducer;

#[derive(Debug, Serialize)]
struct GuidedRequest<'a> {
    ticker: &'a str,
    step: &'a str,
    horizon: &'a str,
    risk: &'a str,
}

/// Calls a guided research endpoint with a bearer secret.
pub struct HttpProducer {
    client: reqwest::Client,
    endpoint: String,
    secret: String,
}

impl HttpProducer {
    pub fn new(
        endpoint: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            secret: secret.into(),
        })
    }
}

#[async_trait]
impl ResearchProducer for HttpProducer {
    async fn produce(
        &self,
        ticker: &str,
        step: &str,
        horizon: &str,
        risk: &str,
    ) -> anyhow::Result<Value> {
        let request = GuidedRequest {
            ticker,
            step,
            horizon,
            risk,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.secret)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        if !response.status().is_success() {
            anyhow::bail!("research backend returned {}", response.status());
        }

        response
            .json::<Value>()
            .await
            .context("research backend reply was not JSON")
    }
}
