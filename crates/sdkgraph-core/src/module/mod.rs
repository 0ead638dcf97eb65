// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Module trait objects stored in the graph and the SDK capabilities they may
//! implement.
//!
//! Passes never inspect concrete module types. They ask a module for a
//! capability through the `as_*` accessors on [`Module`]; a module that
//! returns `None` simply does not participate in that pass.
use std::fmt;

use crate::context::DepRef;
use crate::diagnostics::SdkError;
use crate::sdk::{SdkModule, SdkProperties};
use crate::sdk_ref::{SdkRef, SdkRefs};
use crate::tag::DependencyTag;

mod apex;
mod defaults;
mod library;

pub use apex::{
    apex_uses_sdks_mutator, register_packaging_mutators, ApexModule, APEX_CONTENT_TAG,
    APEX_MODULE_TYPE, APEX_USES_SDKS,
};
pub use defaults::{SdkDefaultsModule, SDK_DEFAULTS_MODULE_TYPE};
pub use library::{LibraryModule, DEP_TAG, EXTERNAL_DEP_TAG};

/// A dependency a module declares on its own, resolved by the host in the
/// deps phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredDep {
    /// Why the edge exists.
    pub tag: DependencyTag,
    /// Name of the target module.
    pub name: String,
}

impl DeclaredDep {
    /// Dependency on `name` under `tag`.
    pub fn new(tag: DependencyTag, name: impl Into<String>) -> Self {
        Self {
            tag,
            name: name.into(),
        }
    }
}

/// A node of the module graph.
pub trait Module: fmt::Debug + Send + Sync {
    /// Module type as written in the build description (e.g. `cc_library_shared`).
    fn module_type(&self) -> &str;

    /// Dependencies the module declares itself.
    fn dependencies(&self) -> Vec<DeclaredDep> {
        Vec::new()
    }

    /// Names of the defaults modules this module inherits from.
    fn defaults(&self) -> &[String] {
        &[]
    }

    /// Packaging root access.
    fn as_apex(&self) -> Option<&ApexModule> {
        None
    }

    /// SDK node access.
    fn as_sdk(&self) -> Option<&SdkModule> {
        None
    }

    /// Mutable SDK node access (defaults merging, build actions).
    fn as_sdk_mut(&mut self) -> Option<&mut SdkModule> {
        None
    }

    /// Properties an `sdk_defaults` module contributes.
    fn as_sdk_defaults(&self) -> Option<&SdkProperties> {
        None
    }

    /// SDK-aware capability.
    fn as_sdk_aware(&self) -> Option<&dyn SdkAware> {
        None
    }

    /// Mutable SDK-aware capability; only the host's delta application uses it.
    fn as_sdk_aware_mut(&mut self) -> Option<&mut dyn SdkAware> {
        None
    }

    /// Co-packaging capability.
    fn as_package_boundary(&self) -> Option<&dyn PackageBoundary> {
        None
    }
}

/// Per-module SDK state embedded by every SDK-aware module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SdkBase {
    containing_sdk: Option<SdkRef>,
    required_sdks: SdkRefs,
    sdk_member_name: Option<String>,
}

impl SdkBase {
    /// Fresh state: in no SDK, nothing required.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a frozen copy that stands in for `member_name`.
    pub fn with_member_name(member_name: impl Into<String>) -> Self {
        Self {
            sdk_member_name: Some(member_name.into()),
            ..Self::default()
        }
    }

    /// State seeded with an initial required set (packaging roots).
    #[must_use]
    pub fn with_required(required: SdkRefs) -> Self {
        Self {
            required_sdks: required,
            ..Self::default()
        }
    }

    /// The SDK this module is a member of.
    #[must_use]
    pub fn containing_sdk(&self) -> Option<&SdkRef> {
        self.containing_sdk.as_ref()
    }

    /// Records membership. Assignment happens at most once: re-claiming by the
    /// same SDK is a no-op (`Ok(false)`), a different SDK is an error.
    pub fn make_member_of(&mut self, sdk: &SdkRef) -> Result<bool, SdkError> {
        match &self.containing_sdk {
            None => {
                self.containing_sdk = Some(sdk.clone());
                Ok(true)
            }
            Some(existing) if existing == sdk => Ok(false),
            Some(existing) => Err(SdkError::DuplicateMembership {
                existing: existing.clone(),
                requested: sdk.clone(),
            }),
        }
    }

    /// SDKs this module must be built against.
    #[must_use]
    pub fn required_sdks(&self) -> &SdkRefs {
        &self.required_sdks
    }

    /// Unions `sdks` into the required set; returns `true` if it grew.
    pub fn build_with_sdks(&mut self, sdks: &SdkRefs) -> bool {
        self.required_sdks.union_with(sdks)
    }

    /// Explicit member name, if this module represents another one.
    #[must_use]
    pub fn sdk_member_name(&self) -> Option<&str> {
        self.sdk_member_name.as_deref()
    }
}

/// Contract for graph nodes that can belong to an SDK.
///
/// Implementors only provide access to their [`SdkBase`]; the provided
/// methods carry the single-assignment and union-only rules.
pub trait SdkAware {
    /// Shared SDK state.
    fn sdk_base(&self) -> &SdkBase;

    /// Mutable SDK state.
    fn sdk_base_mut(&mut self) -> &mut SdkBase;

    /// The SDK this module is a member of.
    fn containing_sdk(&self) -> Option<&SdkRef> {
        self.sdk_base().containing_sdk()
    }

    /// See [`SdkBase::make_member_of`].
    fn make_member_of(&mut self, sdk: &SdkRef) -> Result<bool, SdkError> {
        self.sdk_base_mut().make_member_of(sdk)
    }

    /// SDKs this module must be built against.
    fn required_sdks(&self) -> &SdkRefs {
        self.sdk_base().required_sdks()
    }

    /// See [`SdkBase::build_with_sdks`].
    fn build_with_sdks(&mut self, sdks: &SdkRefs) -> bool {
        self.sdk_base_mut().build_with_sdks(sdks)
    }

    /// Logical member name: the explicit one, else the module's own name.
    fn member_name<'a>(&'a self, module_name: &'a str) -> &'a str {
        self.sdk_base().sdk_member_name().unwrap_or(module_name)
    }
}

/// Contract for nodes gated on co-packaging (packaging roots and their
/// contents).
pub trait PackageBoundary {
    /// Returns `true` if `dep` is bundled into the same deployable unit.
    fn dep_is_in_same_package(&self, dep: &DepRef<'_>) -> bool;
}
