// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packaging root (APEX-like bundle) and the packaging mutator that turns
//! `uses_sdks` into a requirement.
use crate::context::{DepRef, TopDownContext};
use crate::module::{DeclaredDep, Module, PackageBoundary, SdkAware, SdkBase};
use crate::sdk_ref::{SdkRef, SdkRefError, SdkRefs};
use crate::tag::DependencyTag;
use crate::traversal::{MutatorRegistry, Phase};

/// Module type name.
pub const APEX_MODULE_TYPE: &str = "apex";
/// Tag label for bundle contents.
pub const APEX_CONTENT_TAG: &str = "apex_content";
/// Registration name of the packaging requirement mutator.
pub const APEX_USES_SDKS: &str = "apex_uses_sdks";

/// A deployable bundle that pins the SDKs its contents are built against.
///
/// Every direct dependency of a bundle is part of the bundle.
#[derive(Clone, Debug)]
pub struct ApexModule {
    contents: Vec<String>,
    uses_sdks: SdkRefs,
    sdk: SdkBase,
}

impl ApexModule {
    /// Bundle of `contents` requiring `uses_sdks` (`name@version` each).
    pub fn new<C, S>(contents: C, uses_sdks: &[S]) -> Result<Self, SdkRefError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        S: AsRef<str>,
    {
        let uses_sdks = uses_sdks
            .iter()
            .map(|s| SdkRef::parse_validated(s.as_ref()))
            .collect::<Result<SdkRefs, _>>()?;
        Ok(Self {
            contents: contents.into_iter().map(Into::into).collect(),
            uses_sdks,
            sdk: SdkBase::new(),
        })
    }

    /// SDKs declared by the bundle itself.
    #[must_use]
    pub fn uses_sdks(&self) -> &SdkRefs {
        &self.uses_sdks
    }
}

impl Module for ApexModule {
    fn module_type(&self) -> &str {
        APEX_MODULE_TYPE
    }

    fn dependencies(&self) -> Vec<DeclaredDep> {
        let tag = DependencyTag::plain(APEX_CONTENT_TAG);
        self.contents
            .iter()
            .map(|n| DeclaredDep::new(tag.clone(), n))
            .collect()
    }

    fn as_apex(&self) -> Option<&ApexModule> {
        Some(self)
    }

    fn as_sdk_aware(&self) -> Option<&dyn SdkAware> {
        Some(self)
    }

    fn as_sdk_aware_mut(&mut self) -> Option<&mut dyn SdkAware> {
        Some(self)
    }

    fn as_package_boundary(&self) -> Option<&dyn PackageBoundary> {
        Some(self)
    }
}

impl SdkAware for ApexModule {
    fn sdk_base(&self) -> &SdkBase {
        &self.sdk
    }

    fn sdk_base_mut(&mut self) -> &mut SdkBase {
        &mut self.sdk
    }
}

impl PackageBoundary for ApexModule {
    fn dep_is_in_same_package(&self, _dep: &DepRef<'_>) -> bool {
        true
    }
}

/// Makes every bundle require the SDKs it declares in `uses_sdks`.
pub fn apex_uses_sdks_mutator(ctx: &mut TopDownContext<'_>) {
    let Some(apex) = ctx.module().as_apex() else {
        return;
    };
    if !apex.uses_sdks().is_empty() {
        let id = ctx.module_id();
        ctx.build_with_sdks(id, apex.uses_sdks());
    }
}

/// Registers the packaging subsystem's post-deps mutators. They must be
/// registered before the SDK post-deps mutators.
pub fn register_packaging_mutators(registry: &mut MutatorRegistry) {
    registry
        .top_down(Phase::PostDeps, APEX_USES_SDKS, apex_uses_sdks_mutator)
        .parallel();
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn uses_sdks_are_parsed_but_not_yet_required() {
        let apex = ApexModule::new(["libfoo"], &["mysdk@11"]).unwrap();
        assert!(apex.uses_sdks().contains(&SdkRef::new("mysdk", "11")));
        assert!(apex.required_sdks().is_empty());
        assert_eq!(apex.dependencies().len(), 1);
    }

    #[test]
    fn uses_sdks_are_validated() {
        let err = ApexModule::new(Vec::<String>::new(), &["mysdk@eleven"]).unwrap_err();
        assert_eq!(err, SdkRefError::InvalidVersion("eleven".into()));
    }
}
