// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pipeline configuration and where it is persisted between runs.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traversal::ExecPolicy;

/// Key the pipeline configuration is stored under.
pub const PIPELINE_CONFIG_KEY: &str = "sdkgraph";

/// Knobs of one pipeline run. Missing fields take their default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for parallel mutators.
    pub workers: usize,
    /// Run mutators that opted in on several threads.
    pub parallel: bool,
    /// Root of build outputs (snapshot artifacts).
    pub out_dir: PathBuf,
    /// Stop after the first mutator that records an error.
    pub fail_fast: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            parallel: true,
            out_dir: PathBuf::from("out/sdk"),
            fail_fast: false,
        }
    }
}

impl PipelineConfig {
    /// Single-threaded configuration.
    #[must_use]
    pub fn serial() -> Self {
        Self {
            workers: 1,
            parallel: false,
            ..Self::default()
        }
    }

    /// Scheduling derived from this configuration.
    #[must_use]
    pub fn exec_policy(&self) -> ExecPolicy {
        ExecPolicy {
            workers: self.workers.max(1),
            parallel: self.parallel,
        }
    }
}

/// Where pipeline configurations are kept, as JSON blobs under a key.
pub trait ConfigStore {
    /// Blob stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces the blob stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure to read or write a stored [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing is stored under the key.
    #[error("no stored configuration")]
    NotFound,
    /// The platform has no per-user configuration directory.
    #[error("no configuration directory for this user")]
    NoConfigDir,
    /// The store could not be read or written.
    #[error("configuration store: {0}")]
    Io(#[from] std::io::Error),
    /// The stored blob is not a valid pipeline configuration.
    #[error("malformed configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Reads and writes the [`PipelineConfig`] kept in a [`ConfigStore`].
#[derive(Debug)]
pub struct ConfigService<S> {
    store: S,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored pipeline configuration. Falls back to the default when nothing
    /// (or an empty blob) is stored; fields missing from the blob take their
    /// default too.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        match self.store.load_raw(PIPELINE_CONFIG_KEY) {
            Ok(bytes) if bytes.is_empty() => Ok(PipelineConfig::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(ConfigError::NotFound) => Ok(PipelineConfig::default()),
            Err(e) => Err(e),
        }
    }

    /// Persists `config` as pretty JSON.
    pub fn save_pipeline_config(&self, config: &PipelineConfig) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(config)?;
        self.store.save_raw(PIPELINE_CONFIG_KEY, &data)
    }
}
