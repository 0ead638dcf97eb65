// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Build actions: one snapshot artifact per in-development SDK.
//!
//! Serializing the artifact is the job of a [`SnapshotWriter`]. The pipeline
//! only describes what goes into it and records where it ended up.
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::diagnostics::{Diagnostic, Diagnostics, SdkError};
use crate::graph::ModuleGraph;
use crate::ident::{ModuleId, Variant};

/// Suffix of the snapshot file name.
pub const SNAPSHOT_SUFFIX: &str = "-current.zip";

/// One member as it goes into a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotMember {
    /// Member list the member was declared in.
    pub list: String,
    /// Module name.
    pub module: String,
    /// Member name.
    pub member_name: String,
    /// Module type.
    pub module_type: String,
}

/// Everything a writer needs to produce one SDK snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotRequest {
    /// SDK name.
    pub sdk: String,
    /// SDK variant.
    pub variant: Variant,
    /// Members in edge order, one entry per member variant.
    pub members: Vec<SnapshotMember>,
    /// Root of all build outputs.
    pub out_dir: PathBuf,
}

impl SnapshotRequest {
    /// `<out_dir>/<sdk>[/<variant>]/<sdk>-current.zip`.
    #[must_use]
    pub fn default_output(&self) -> PathBuf {
        let mut dir = self.out_dir.join(&self.sdk);
        if !self.variant.is_core() {
            dir.push(self.variant.as_str());
        }
        dir.join(format!("{}{SNAPSHOT_SUFFIX}", self.sdk))
    }
}

/// Snapshot collaborator failures.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// I/O error while writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Produces the snapshot artifact of one SDK.
pub trait SnapshotWriter: Send + Sync {
    /// Writes (or plans) the artifact and returns its path.
    fn write_snapshot(&self, request: &SnapshotRequest) -> Result<PathBuf, SnapshotError>;
}

/// Writer that only plans the default output path.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlannedSnapshotWriter;

impl SnapshotWriter for PlannedSnapshotWriter {
    fn write_snapshot(&self, request: &SnapshotRequest) -> Result<PathBuf, SnapshotError> {
        Ok(request.default_output())
    }
}

/// A snapshot produced by the build actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotOutput {
    /// SDK name.
    pub sdk: String,
    /// SDK variant.
    pub variant: Variant,
    /// Artifact path returned by the writer.
    pub path: PathBuf,
}

impl ModuleGraph {
    /// Describes the snapshot of SDK `id`, or `None` when `id` is not an
    /// in-development SDK.
    #[must_use]
    pub fn snapshot_request(&self, id: ModuleId, out_dir: &Path) -> Option<SnapshotRequest> {
        let record = self.module(id)?;
        let sdk = record.module().as_sdk()?;
        if sdk.is_snapshot() {
            return None;
        }
        let members = self
            .deps(id)
            .iter()
            .filter_map(|edge| {
                let list = edge.tag.as_sdk_member()?;
                let member = self.module(edge.to)?;
                Some(SnapshotMember {
                    list: list.property().to_owned(),
                    module: member.name().to_owned(),
                    member_name: member.member_name().to_owned(),
                    module_type: member.module().module_type().to_owned(),
                })
            })
            .collect();
        Some(SnapshotRequest {
            sdk: record.name().to_owned(),
            variant: record.variant().clone(),
            members,
            out_dir: out_dir.to_path_buf(),
        })
    }

    /// Runs the build action of every healthy in-development SDK.
    #[instrument(skip_all)]
    pub(crate) fn build_snapshots(
        &mut self,
        writer: &dyn SnapshotWriter,
        out_dir: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Vec<SnapshotOutput> {
        let requests: Vec<(ModuleId, SnapshotRequest)> = self
            .iter_modules()
            .filter(|(id, _)| !self.is_failed(*id))
            .filter_map(|(id, _)| Some((id, self.snapshot_request(id, out_dir)?)))
            .collect();

        let mut outputs = Vec::new();
        for (id, request) in requests {
            match writer.write_snapshot(&request) {
                Ok(path) => {
                    debug!(sdk = %request.sdk, path = %path.display(), "snapshot built");
                    if let Some(sdk) = self.module_mut(id).and_then(|r| r.module_mut().as_sdk_mut()) {
                        sdk.set_snapshot_file(path.clone());
                    }
                    outputs.push(SnapshotOutput {
                        sdk: request.sdk,
                        variant: request.variant,
                        path,
                    });
                }
                Err(err) => {
                    diagnostics.push(Diagnostic {
                        module: request.sdk,
                        variant: request.variant,
                        property: None,
                        error: SdkError::Snapshot(err.to_string()),
                    });
                    self.mark_failed(id);
                }
            }
        }
        outputs
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn default_output_is_placed_under_the_sdk_name() {
        let mut request = SnapshotRequest {
            sdk: "mysdk".into(),
            variant: Variant::core(),
            members: Vec::new(),
            out_dir: PathBuf::from("out"),
        };
        assert_eq!(
            PlannedSnapshotWriter.write_snapshot(&request).unwrap(),
            PathBuf::from("out/mysdk/mysdk-current.zip")
        );
        request.variant = Variant::new("android_arm64");
        assert_eq!(
            request.default_output(),
            PathBuf::from("out/mysdk/android_arm64/mysdk-current.zip")
        );
    }
}
