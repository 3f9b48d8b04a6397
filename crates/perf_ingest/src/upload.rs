//! Authenticated POST of a run descriptor to the ingestion endpoint.

use crate::payload::RunDescriptor;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("ingest rejected upload: status {0} body {1}")]
    Status(u16, String),
}

/// What to do with the endpoint's answer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Log the status or transport error and carry on. Never fails the run.
    #[default]
    BestEffort,
    /// Transport errors and non-2xx statuses fail the run.
    Strict,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub timeout: Duration,
    pub policy: DeliveryPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            policy: DeliveryPolicy::BestEffort,
        }
    }
}

/// Result of one delivery attempt under the configured policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// None when the request never got a response.
    pub status: Option<u16>,
    pub accepted: bool,
}

pub struct Uploader {
    config: UploadConfig,
    client: reqwest::Client,
}

impl Uploader {
    pub fn new(config: UploadConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Send the descriptor once and return the response, whatever its status. No retries.
    pub async fn submit(
        &self,
        endpoint: &Url,
        token: &str,
        descriptor: &RunDescriptor,
    ) -> Result<reqwest::Response, UploadError> {
        let body = serde_json::to_vec(descriptor)?;
        let res = self
            .client
            .post(endpoint.clone())
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(res)
    }

    /// Submit and apply the delivery policy.
    pub async fn deliver(
        &self,
        endpoint: &Url,
        token: &str,
        descriptor: &RunDescriptor,
    ) -> Result<Delivery, UploadError> {
        let strict = self.config.policy == DeliveryPolicy::Strict;
        let res = match self.submit(endpoint, token, descriptor).await {
            Ok(res) => res,
            Err(UploadError::Request(e)) if !strict => {
                warn!(error = %e, %endpoint, "upload failed, ignoring");
                return Ok(Delivery {
                    status: e.status().map(|s| s.as_u16()),
                    accepted: false,
                });
            }
            Err(e) => return Err(e),
        };
        let status = res.status();
        if status.is_success() {
            info!(status = status.as_u16(), %endpoint, "upload accepted");
            return Ok(Delivery {
                status: Some(status.as_u16()),
                accepted: true,
            });
        }
        if strict {
            let body = res.text().await.unwrap_or_default();
            return Err(UploadError::Status(status.as_u16(), body));
        }
        warn!(status = status.as_u16(), %endpoint, "upload not accepted, ignoring");
        Ok(Delivery {
            status: Some(status.as_u16()),
            accepted: false,
        })
    }
}
