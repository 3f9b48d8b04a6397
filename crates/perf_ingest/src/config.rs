//! Run configuration from CI environment variables or positional arguments.
//!
//! Two sources, never combined:
//! - environment: `GITHUB_SHA`, `GITHUB_REF`, `API_KEY`, `OS_SPEC`
//! - arguments: `<commit_hash> <git_branch> <token>`
//!
//! Everything downstream takes a [`RunConfig`]; nothing else reads the process environment.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const ENV_COMMIT: &str = "GITHUB_SHA";
pub const ENV_REF: &str = "GITHUB_REF";
pub const ENV_TOKEN: &str = "API_KEY";
pub const ENV_OS: &str = "OS_SPEC";

/// Ingestion URL used when configured from the environment.
pub const ENV_ENDPOINT: &str = "https://perf-ci.speculare.cloud/api/ingest";
/// Ingestion URL used when configured from positional arguments.
pub const ARGS_ENDPOINT: &str = "https://perf-ci.speculare.cloud";

pub const DEFAULT_CRITERION_DIR: &str = "target/criterion";

const REQUIRED_ARGS: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("expected {expected} arguments <commit_hash> <git_branch> <token>, got {got}")]
    MissingArguments { expected: usize, got: usize },
    #[error("cannot extract branch from ref {0:?}")]
    InvalidRef(String),
    #[error("invalid endpoint {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        source: url::ParseError,
    },
}

#[derive(Clone)]
pub struct RunConfig {
    pub commit_hash: String,
    pub branch: String,
    pub token: String,
    /// Only set by the environment source.
    pub os: Option<String>,
    pub endpoint: Url,
    pub criterion_dir: PathBuf,
}

impl RunConfig {
    /// Read the run parameters from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Same as [`RunConfig::from_env`] with an injectable lookup.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVar(name));
        let commit_hash = var(ENV_COMMIT)?;
        let git_ref = var(ENV_REF)?;
        let token = var(ENV_TOKEN)?;
        let os = var(ENV_OS)?;
        let branch = branch_from_ref(&git_ref)?;
        Ok(Self {
            commit_hash,
            branch,
            token,
            os: Some(os),
            endpoint: parse_endpoint(ENV_ENDPOINT)?,
            criterion_dir: PathBuf::from(DEFAULT_CRITERION_DIR),
        })
    }

    /// Build from positional `<commit_hash> <git_branch> <token>`; extra values are ignored.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        let [commit_hash, branch, token, ..] = args else {
            return Err(ConfigError::MissingArguments {
                expected: REQUIRED_ARGS,
                got: args.len(),
            });
        };
        Ok(Self {
            commit_hash: commit_hash.as_ref().to_string(),
            branch: branch.as_ref().to_string(),
            token: token.as_ref().to_string(),
            os: None,
            endpoint: parse_endpoint(ARGS_ENDPOINT)?,
            criterion_dir: PathBuf::from(DEFAULT_CRITERION_DIR),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self, ConfigError> {
        self.endpoint = parse_endpoint(endpoint)?;
        Ok(self)
    }

    pub fn with_criterion_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.criterion_dir = dir.into();
        self
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("commit_hash", &self.commit_hash)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .field("os", &self.os)
            .field("endpoint", &self.endpoint.as_str())
            .field("criterion_dir", &self.criterion_dir)
            .finish()
    }
}

/// Third `/`-separated segment of a git ref: `refs/heads/main` -> `main`.
///
/// Nested branch names keep only their first component (`refs/heads/feat/x` -> `feat`).
pub fn branch_from_ref(git_ref: &str) -> Result<String, ConfigError> {
    match git_ref.split('/').nth(2) {
        Some(segment) if !segment.is_empty() => Ok(segment.to_string()),
        _ => Err(ConfigError::InvalidRef(git_ref.to_string())),
    }
}

fn parse_endpoint(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidEndpoint {
        url: url.to_string(),
        source,
    })
}
