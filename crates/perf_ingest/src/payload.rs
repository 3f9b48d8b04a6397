//! Upload payload: one run descriptor holding one record per benchmark.

use crate::config::RunConfig;
use crate::criterion::Estimates;
use serde::{Deserialize, Serialize};

/// Point estimates for one benchmark. Missing statistics are omitted, never zero-filled.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchRecord {
    pub bench: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slope: Option<f64>,
}

impl BenchRecord {
    pub fn from_estimates(bench: String, estimates: &Estimates) -> Self {
        Self {
            bench,
            mean: estimates.mean.map(|e| e.point_estimate),
            median: estimates.median.map(|e| e.point_estimate),
            slope: estimates.slope.map(|e| e.point_estimate),
        }
    }
}

/// Body of the ingestion POST.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunDescriptor {
    pub branch: String,
    pub commit_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// In discovery order.
    pub datas: Vec<BenchRecord>,
}

impl RunDescriptor {
    pub fn new(config: &RunConfig, datas: Vec<BenchRecord>) -> Self {
        Self {
            branch: config.branch.clone(),
            commit_hash: config.commit_hash.clone(),
            os: config.os.clone(),
            datas,
        }
    }
}
