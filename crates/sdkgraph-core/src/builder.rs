// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph construction from module declarations.
use tracing::debug;

use crate::diagnostics::GraphError;
use crate::graph::ModuleGraph;
use crate::ident::{ModuleId, Variant};
use crate::module::Module;
use crate::sdk::SdkProperties;

/// Collects module declarations and produces a [`ModuleGraph`].
///
/// `build` rejects duplicate `(name, variant)` pairs and prepends the member
/// lists of `sdk_defaults` modules to the SDKs that name them.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ModuleGraph,
}

impl GraphBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a module in the core variant.
    pub fn module(
        &mut self,
        name: &str,
        module: impl Module + 'static,
    ) -> Result<ModuleId, GraphError> {
        self.graph.add_module(name, Variant::core(), Box::new(module))
    }

    /// Declares a module in `variant`.
    pub fn variant(
        &mut self,
        name: &str,
        variant: &str,
        module: impl Module + 'static,
    ) -> Result<ModuleId, GraphError> {
        self.graph
            .add_module(name, Variant::new(variant), Box::new(module))
    }

    /// Declares an already boxed module.
    pub fn boxed(
        &mut self,
        name: &str,
        variant: Variant,
        module: Box<dyn Module>,
    ) -> Result<ModuleId, GraphError> {
        self.graph.add_module(name, variant, module)
    }

    /// Finishes construction.
    #[must_use]
    pub fn build(mut self) -> ModuleGraph {
        self.graph.merge_sdk_defaults();
        self.graph
    }
}

impl ModuleGraph {
    /// Prepends `sdk_defaults` member lists into every SDK that names them.
    /// Unknown defaults are left for dependency resolution to report.
    fn merge_sdk_defaults(&mut self) {
        let plans: Vec<(ModuleId, Vec<SdkProperties>)> = self
            .iter_modules()
            .filter(|(_, r)| r.module().as_sdk().is_some() && !r.module().defaults().is_empty())
            .map(|(id, r)| {
                let inherited = r
                    .module()
                    .defaults()
                    .iter()
                    .filter_map(|name| self.resolve(name, r.variant()))
                    .filter_map(|d| self.module(d)?.module().as_sdk_defaults().cloned())
                    .collect();
                (id, inherited)
            })
            .collect();

        for (id, inherited) in plans {
            if let Some(sdk) = self.module_mut(id).and_then(|r| r.module_mut().as_sdk_mut()) {
                let refs: Vec<&SdkProperties> = inherited.iter().collect();
                sdk.properties_mut().prepend_defaults(&refs);
                debug!(?id, defaults = refs.len(), "merged sdk defaults");
            }
        }
    }
}
