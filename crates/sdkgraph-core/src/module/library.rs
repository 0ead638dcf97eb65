// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generic SDK-aware library module.
use crate::context::DepRef;
use crate::module::{DeclaredDep, Module, PackageBoundary, SdkAware, SdkBase};
use crate::sdk_ref::SdkRefs;
use crate::tag::DependencyTag;

/// Tag label for dependencies bundled with the library.
pub const DEP_TAG: &str = "dep";
/// Tag label for dependencies resolved outside the library's package.
pub const EXTERNAL_DEP_TAG: &str = "external_dep";

/// A library of any kind (native, java, stub sources...).
///
/// `deps` are bundled together with the library; `external_deps` cross the
/// package boundary (e.g. links against stubs) and are therefore subject to
/// the SDK requirement check.
#[derive(Clone, Debug)]
pub struct LibraryModule {
    module_type: String,
    deps: Vec<String>,
    external_deps: Vec<String>,
    defaults: Vec<String>,
    sdk: SdkBase,
}

impl LibraryModule {
    /// Library of `module_type` with no dependencies.
    pub fn new(module_type: impl Into<String>) -> Self {
        Self {
            module_type: module_type.into(),
            deps: Vec::new(),
            external_deps: Vec::new(),
            defaults: Vec::new(),
            sdk: SdkBase::new(),
        }
    }

    /// Adds co-packaged dependencies.
    #[must_use]
    pub fn with_deps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds dependencies that live outside the library's package.
    #[must_use]
    pub fn with_external_deps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external_deps.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds defaults modules.
    #[must_use]
    pub fn with_defaults<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults.extend(names.into_iter().map(Into::into));
        self
    }

    /// Marks the library as the frozen copy of `member_name`.
    #[must_use]
    pub fn with_sdk_member_name(mut self, member_name: impl Into<String>) -> Self {
        self.sdk = SdkBase::with_member_name(member_name);
        self
    }

    /// Seeds the required set (a library that is itself a packaging root).
    #[must_use]
    pub fn with_required_sdks(mut self, sdks: &SdkRefs) -> Self {
        self.sdk.build_with_sdks(sdks);
        self
    }
}

impl Module for LibraryModule {
    fn module_type(&self) -> &str {
        &self.module_type
    }

    fn dependencies(&self) -> Vec<DeclaredDep> {
        let dep = DependencyTag::plain(DEP_TAG);
        let external = DependencyTag::plain(EXTERNAL_DEP_TAG);
        self.deps
            .iter()
            .map(|n| DeclaredDep::new(dep.clone(), n))
            .chain(
                self.external_deps
                    .iter()
                    .map(|n| DeclaredDep::new(external.clone(), n)),
            )
            .collect()
    }

    fn defaults(&self) -> &[String] {
        &self.defaults
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

impl SdkAware for LibraryModule {
    fn sdk_base(&self) -> &SdkBase {
        &self.sdk
    }

    fn sdk_base_mut(&mut self) -> &mut SdkBase {
        &mut self.sdk
    }
}

impl PackageBoundary for LibraryModule {
    // Replaced edges keep their tag, so the tag still tells after rewiring.
    fn dep_is_in_same_package(&self, dep: &DepRef<'_>) -> bool {
        !matches!(dep.tag, DependencyTag::Plain(label) if &**label == EXTERNAL_DEP_TAG)
    }
}
