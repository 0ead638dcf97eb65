// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Member types: the per-kind capability that turns member names into
//! dependency edges.
use std::fmt;

use crate::context::BottomUpContext;
use crate::module::Module;
use crate::tag::DependencyTag;

/// Knows how to reference one kind of SDK member.
///
/// The pipeline only ever calls [`SdkMemberType::add_dependencies`] and
/// [`SdkMemberType::is_instance`]; everything else about a member kind
/// (compiling it, serializing it into a snapshot) lives with its implementor.
pub trait SdkMemberType: fmt::Debug + Send + Sync {
    /// Human-readable kind, used in diagnostics.
    fn name(&self) -> &str;

    /// Adds one edge per name from the SDK to the member, under `tag`.
    ///
    /// The default reaches every variant of each named module so that every
    /// split copy learns its containing SDK. Unknown names are reported by the
    /// host when the delta is applied.
    fn add_dependencies(
        &self,
        ctx: &mut BottomUpContext<'_>,
        tag: &DependencyTag,
        names: &[String],
    ) {
        for name in names {
            ctx.add_dependency_all_variants(tag.clone(), name);
        }
    }

    /// Returns `true` if `module` is something this member type can hold.
    fn is_instance(&self, module: &dyn Module) -> bool;
}

/// Member type recognised by a fixed set of module type names.
#[derive(Debug, Clone, Copy)]
pub struct ModuleTypeMember {
    name: &'static str,
    module_types: &'static [&'static str],
}

impl ModuleTypeMember {
    /// Member type `name` accepting modules whose type is in `module_types`.
    #[must_use]
    pub const fn new(name: &'static str, module_types: &'static [&'static str]) -> Self {
        Self { name, module_types }
    }
}

impl SdkMemberType for ModuleTypeMember {
    fn name(&self) -> &str {
        self.name
    }

    fn is_instance(&self, module: &dyn Module) -> bool {
        self.module_types.contains(&module.module_type())
    }
}

/// Native shared libraries.
pub const NATIVE_SHARED_LIBRARY: ModuleTypeMember = ModuleTypeMember::new(
    "native shared library",
    &[
        "cc_library",
        "cc_library_shared",
        "cc_prebuilt_library_shared",
    ],
);

/// Java libraries provided separately at runtime (headers only).
pub const JAVA_HEADER_LIBRARY: ModuleTypeMember =
    ModuleTypeMember::new("java header library", &["java_library", "java_import"]);

/// Java implementation libraries.
pub const JAVA_IMPL_LIBRARY: ModuleTypeMember =
    ModuleTypeMember::new("java implementation library", &["java_library", "java_import"]);

/// Stub source bundles.
pub const STUBS_SOURCES: ModuleTypeMember = ModuleTypeMember::new(
    "stubs sources",
    &["droidstubs", "prebuilt_stubs_sources"],
);
