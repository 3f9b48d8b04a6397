//! Collect, build, and upload in one pass.

use crate::config::RunConfig;
use crate::criterion::{collect, CriterionError};
use crate::payload::RunDescriptor;
use crate::upload::{UploadConfig, UploadError, Uploader};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("criterion: {0}")]
    Criterion(#[from] CriterionError),
    #[error("upload: {0}")]
    Upload(#[from] UploadError),
}

#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub upload: UploadConfig,
    /// Build the payload but do not send it.
    pub dry_run: bool,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub descriptor: RunDescriptor,
    /// Response status, if a request was made and answered.
    pub status: Option<u16>,
    pub accepted: bool,
    pub uploaded: bool,
}

impl RunSummary {
    pub fn bench_count(&self) -> usize {
        self.descriptor.datas.len()
    }
}

/// Read every result under the configured Criterion dir into a descriptor.
///
/// Fails before any network activity if a results file is missing or malformed.
pub fn build_descriptor(config: &RunConfig) -> Result<RunDescriptor, CriterionError> {
    let records = collect(&config.criterion_dir)?;
    Ok(RunDescriptor::new(config, records))
}

/// Collect results and POST them once. An empty result set is still uploaded.
///
/// The delivery policy covers the request only: failing to build the HTTP client
/// is a setup error and fails the run under either policy.
pub async fn run(config: &RunConfig, options: &RunOptions) -> Result<RunSummary, RunError> {
    let descriptor = build_descriptor(config)?;
    info!(
        branch = %descriptor.branch,
        commit = %descriptor.commit_hash,
        benches = descriptor.datas.len(),
        "run descriptor ready"
    );
    if options.dry_run {
        return Ok(RunSummary {
            descriptor,
            status: None,
            accepted: false,
            uploaded: false,
        });
    }
    let uploader = Uploader::new(options.upload.clone())?;
    let delivery = uploader
        .deliver(&config.endpoint, &config.token, &descriptor)
        .await?;
    Ok(RunSummary {
        descriptor,
        status: delivery.status,
        accepted: delivery.accepted,
        uploaded: true,
    })
}
