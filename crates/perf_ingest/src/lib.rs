//! perf_ingest — push Criterion benchmark estimates from CI to a perf ingestion endpoint.
//!
//! Reads `<criterion_dir>/<bench>/new/estimates.json`, keeps the mean/median/slope
//! point estimates, and sends one run descriptor per invocation.

pub mod config;
pub mod criterion;
pub mod payload;
pub mod run;
pub mod upload;

pub use config::{branch_from_ref, ConfigError, RunConfig};
pub use criterion::{collect, discover, CriterionError, Estimates, ResultDir};
pub use payload::{BenchRecord, RunDescriptor};
pub use run::{build_descriptor, run, RunError, RunOptions, RunSummary};
pub use upload::{Delivery, DeliveryPolicy, UploadConfig, UploadError, Uploader};
