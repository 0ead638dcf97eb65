// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pipeline configuration kept as `<key>.json` files in one directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sdkgraph_core::{ConfigError, ConfigStore};

/// Directory of JSON configuration files.
#[derive(Debug)]
pub struct FsConfigStore {
    dir: PathBuf,
}

impl FsConfigStore {
    /// Store in the platform's per-user config directory
    /// (`~/.config/sdkgraph` on Linux).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "sdkgraph")
            .ok_or(ConfigError::NoConfigDir)?;
        Self::at(dirs.config_dir())
    }

    /// Store in `dir`, creating it if needed.
    pub fn at(dir: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Directory holding the files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        fs::read(self.dir.join(format!("{key}.json"))).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ConfigError::NotFound,
            _ => ConfigError::Io(err),
        })
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        Ok(fs::write(self.dir.join(format!("{key}.json")), data)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use sdkgraph_core::{ConfigService, PipelineConfig};

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        assert_eq!(service.pipeline_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn saved_config_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let service = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        let config = PipelineConfig {
            workers: 3,
            fail_fast: true,
            ..PipelineConfig::serial()
        };
        service.save_pipeline_config(&config).unwrap();
        assert!(dir.path().join("sdkgraph.json").is_file());
        assert_eq!(service.pipeline_config().unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sdkgraph.json"), br#"{ "fail_fast": true }"#).unwrap();
        let service = ConfigService::new(FsConfigStore::at(dir.path()).unwrap());
        let config = service.pipeline_config().unwrap();
        assert!(config.fail_fast);
        assert_eq!(config.out_dir, PipelineConfig::default().out_dir);
    }
}
