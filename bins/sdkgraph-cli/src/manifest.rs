// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! JSON module manifests.
//!
//! ```json
//! { "modules": [
//!   { "type": "cc_library_shared", "name": "libfoo", "variants": ["apex_a"] },
//!   { "type": "sdk", "name": "mysdk", "native_shared_libs": ["libfoo"] },
//!   { "type": "apex", "name": "com.a", "variants": ["apex_a"],
//!     "contents": ["libfoo"], "uses_sdks": ["mysdk@11"] }
//! ] }
//! ```
//!
//! Any `type` other than `sdk`, `sdk_snapshot`, `sdk_defaults` and `apex`
//! declares a library of that type. Keys not listed on [`ModuleDecl`] are
//! member lists and are only accepted on SDK and defaults modules.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

use sdkgraph_core::module::{APEX_MODULE_TYPE, SDK_DEFAULTS_MODULE_TYPE};
use sdkgraph_core::{
    ApexModule, GraphBuilder, LibraryModule, Module, SdkDefaultsModule, SdkModule, SdkProperties,
    SdkRef, SdkRefs, Variant, SDK_MODULE_TYPE, SDK_SNAPSHOT_MODULE_TYPE,
};

/// A whole manifest file.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    /// Declared modules, in declaration order.
    pub modules: Vec<ModuleDecl>,
}

/// One module declaration; see the module docs for the format.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDecl {
    /// Module type.
    #[serde(rename = "type")]
    pub module_type: String,
    /// Module name (`name@version` for snapshots and frozen members).
    pub name: String,
    /// Variants to create; empty means the core variant only.
    #[serde(default)]
    pub variants: Vec<String>,
    /// Co-packaged dependencies (libraries).
    #[serde(default)]
    pub deps: Vec<String>,
    /// Dependencies outside the library's package.
    #[serde(default)]
    pub external_deps: Vec<String>,
    /// Defaults modules.
    #[serde(default)]
    pub defaults: Vec<String>,
    /// Logical member name of a frozen member copy.
    #[serde(default)]
    pub sdk_member_name: Option<String>,
    /// SDKs a library must be built against from the start.
    #[serde(default)]
    pub required_sdks: Vec<String>,
    /// Bundle contents.
    #[serde(default)]
    pub contents: Vec<String>,
    /// SDKs a bundle pins.
    #[serde(default)]
    pub uses_sdks: Vec<String>,
    /// Member lists.
    #[serde(flatten)]
    pub member_lists: BTreeMap<String, Vec<String>>,
}

impl Manifest {
    /// Parses a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("malformed module manifest")
    }

    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Declares every module, in every variant, on a fresh builder.
    pub fn to_builder(&self) -> Result<GraphBuilder> {
        let mut b = GraphBuilder::new();
        for decl in &self.modules {
            if decl.variants.is_empty() {
                b.boxed(&decl.name, Variant::core(), decl.instantiate()?)?;
            }
            for variant in &decl.variants {
                b.boxed(&decl.name, Variant::new(variant), decl.instantiate()?)?;
            }
        }
        Ok(b)
    }
}

impl ModuleDecl {
    /// Builds the graph node this declaration describes.
    pub fn instantiate(&self) -> Result<Box<dyn Module>> {
        let module: Box<dyn Module> = match self.module_type.as_str() {
            SDK_MODULE_TYPE => {
                Box::new(SdkModule::new(self.properties()).with_defaults(self.defaults.clone()))
            }
            SDK_SNAPSHOT_MODULE_TYPE => Box::new(
                SdkModule::snapshot(self.properties()).with_defaults(self.defaults.clone()),
            ),
            SDK_DEFAULTS_MODULE_TYPE => Box::new(SdkDefaultsModule::new(self.properties())),
            APEX_MODULE_TYPE => {
                self.reject_member_lists()?;
                Box::new(
                    ApexModule::new(self.contents.iter().cloned(), &self.uses_sdks)
                        .with_context(|| format!("module {:?}: uses_sdks", self.name))?,
                )
            }
            other => {
                self.reject_member_lists()?;
                let mut lib = LibraryModule::new(other)
                    .with_deps(self.deps.iter().cloned())
                    .with_external_deps(self.external_deps.iter().cloned())
                    .with_defaults(self.defaults.iter().cloned());
                if let Some(member_name) = &self.sdk_member_name {
                    lib = lib.with_sdk_member_name(member_name.clone());
                }
                if !self.required_sdks.is_empty() {
                    lib = lib.with_required_sdks(&self.required()?);
                }
                Box::new(lib)
            }
        };
        Ok(module)
    }

    fn properties(&self) -> SdkProperties {
        self.member_lists
            .iter()
            .fold(SdkProperties::new(), |props, (list, names)| {
                props.with_members(list, names.iter().cloned())
            })
    }

    fn required(&self) -> Result<SdkRefs> {
        self.required_sdks
            .iter()
            .map(|s| {
                SdkRef::parse_validated(s)
                    .with_context(|| format!("module {:?}: required_sdks", self.name))
            })
            .collect()
    }

    fn reject_member_lists(&self) -> Result<()> {
        if let Some(key) = self.member_lists.keys().next() {
            bail!(
                "module {:?}: property {key:?} is not valid for type {:?}",
                self.name,
                self.module_type
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const SCENARIO: &str = include_str!("../demos/pinned_bundle.json");

    #[test]
    fn demo_manifest_declares_every_variant() {
        let manifest = Manifest::from_json(SCENARIO).unwrap();
        let graph = manifest.to_builder().unwrap().build();
        assert_eq!(graph.variants_of("libfoo").len(), 2);
        assert!(graph.lookup("mysdk", &Variant::core()).is_some());
        assert!(graph.lookup("com.a", &Variant::new("apex_a")).is_some());
    }

    #[test]
    fn member_lists_land_on_sdk_properties() {
        let decl: ModuleDecl = serde_json::from_str(
            r#"{ "type": "sdk", "name": "mysdk", "java_libs": ["core-lib"], "native_shared_libs": [] }"#,
        )
        .unwrap();
        let module = decl.instantiate().unwrap();
        let sdk = module.as_sdk().unwrap();
        assert_eq!(sdk.properties().members("java_libs"), ["core-lib"]);
        assert!(!sdk.is_snapshot());
    }

    #[test]
    fn member_lists_are_rejected_on_libraries() {
        let decl: ModuleDecl = serde_json::from_str(
            r#"{ "type": "cc_library_shared", "name": "libfoo", "native_shared_libs": ["x"] }"#,
        )
        .unwrap();
        let err = decl.instantiate().unwrap_err();
        assert!(err.to_string().contains("native_shared_libs"));
    }

    #[test]
    fn malformed_required_sdk_is_an_error() {
        let decl: ModuleDecl = serde_json::from_str(
            r#"{ "type": "cc_library_shared", "name": "libfoo", "required_sdks": ["a@b@c"] }"#,
        )
        .unwrap();
        assert!(decl.instantiate().is_err());
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let manifest = Manifest::from_json(
            r#"{ "modules": [
                { "type": "cc_library_shared", "name": "libfoo" },
                { "type": "cc_library_shared", "name": "libfoo" }
            ] }"#,
        )
        .unwrap();
        assert!(manifest.to_builder().is_err());
    }
}
