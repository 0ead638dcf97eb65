// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! SDK nodes: a declared SDK or one of its frozen snapshots.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::module::Module;

/// Module type of an in-development SDK.
pub const SDK_MODULE_TYPE: &str = "sdk";
/// Module type of a frozen SDK snapshot.
pub const SDK_SNAPSHOT_MODULE_TYPE: &str = "sdk_snapshot";

/// Member lists declared on an SDK, keyed by property name.
///
/// Values are copied at construction and never change afterwards, except for
/// defaults being prepended before any pass runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SdkProperties {
    member_lists: BTreeMap<String, Vec<String>>,
}

impl SdkProperties {
    /// No members.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `names` to the list `property`.
    #[must_use]
    pub fn with_members<I, S>(mut self, property: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.member_lists
            .entry(property.to_owned())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Members listed under `property` (empty when absent).
    #[must_use]
    pub fn members(&self, property: &str) -> &[String] {
        self.member_lists.get(property).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every property that was set.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.member_lists.keys().map(String::as_str)
    }

    /// Prepends each defaults' lists, in order, ahead of the module's own.
    pub(crate) fn prepend_defaults(&mut self, defaults: &[&Self]) {
        let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for d in defaults.iter().copied().chain(std::iter::once(&*self)) {
            for (property, names) in &d.member_lists {
                merged
                    .entry(property.clone())
                    .or_default()
                    .extend(names.iter().cloned());
            }
        }
        self.member_lists = merged;
    }
}

/// Graph node for `sdk` and `sdk_snapshot` declarations.
#[derive(Clone, Debug)]
pub struct SdkModule {
    properties: SdkProperties,
    snapshot: bool,
    defaults: Vec<String>,
    snapshot_file: Option<PathBuf>,
}

impl SdkModule {
    /// In-development SDK.
    #[must_use]
    pub fn new(properties: SdkProperties) -> Self {
        Self {
            properties,
            snapshot: false,
            defaults: Vec::new(),
            snapshot_file: None,
        }
    }

    /// Frozen snapshot; its name must carry a version.
    #[must_use]
    pub fn snapshot(properties: SdkProperties) -> Self {
        Self {
            snapshot: true,
            ..Self::new(properties)
        }
    }

    /// Inherit member lists from `sdk_defaults` modules.
    #[must_use]
    pub fn with_defaults<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults.extend(names.into_iter().map(Into::into));
        self
    }

    /// Returns `true` for `sdk_snapshot` nodes.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    /// Declared member lists.
    #[must_use]
    pub fn properties(&self) -> &SdkProperties {
        &self.properties
    }

    pub(crate) fn properties_mut(&mut self) -> &mut SdkProperties {
        &mut self.properties
    }

    /// Snapshot artifact built for this SDK, once build actions ran.
    #[must_use]
    pub fn snapshot_file(&self) -> Option<&Path> {
        self.snapshot_file.as_deref()
    }

    pub(crate) fn set_snapshot_file(&mut self, path: PathBuf) {
        self.snapshot_file = Some(path);
    }
}

impl Module for SdkModule {
    fn module_type(&self) -> &str {
        if self.snapshot {
            SDK_SNAPSHOT_MODULE_TYPE
        } else {
            SDK_MODULE_TYPE
        }
    }

    fn defaults(&self) -> &[String] {
        &self.defaults
    }

    fn as_sdk(&self) -> Option<&SdkModule> {
        Some(self)
    }

    fn as_sdk_mut(&mut self) -> Option<&mut SdkModule> {
        Some(self)
    }
}
