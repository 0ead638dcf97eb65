// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mutation ops emitted by mutators and their serial application.
//!
//! A mutator visiting module `M` never writes to the graph. It records
//! [`MutationOp`]s into a [`ModuleDelta`] owned by `M`. Once every module of
//! a wave has run, the deltas are sorted by source id and applied one by one,
//! so the graph only ever has a single writer and the result does not depend
//! on how the wave was scheduled.

use tracing::debug;

use crate::diagnostics::{Diagnostic, Diagnostics, SdkError};
use crate::graph::ModuleGraph;
use crate::ident::ModuleId;
use crate::sdk_ref::{SdkRef, SdkRefs};
use crate::tag::DependencyTag;

/// Which variants of a named module a new dependency targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariantSelector {
    /// The source's own variant, falling back to the core variant.
    Same,
    /// Every declared variant.
    All,
}

/// One intended graph change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationOp {
    /// Edge `source → name` under `tag`.
    AddDependency {
        /// Edge tag.
        tag: DependencyTag,
        /// Target module name.
        name: String,
        /// Target variants.
        variants: VariantSelector,
    },
    /// Edge `from → source` under `tag`.
    AddReverseDependency {
        /// Edge tag.
        tag: DependencyTag,
        /// Depending module.
        from: ModuleId,
    },
    /// Retarget same-variant edges aimed at `name` to the source.
    ReplaceDependencies {
        /// Name of the module being replaced.
        name: String,
    },
    /// Record `target`'s containing SDK.
    SetContainingSdk {
        /// Member being claimed.
        target: ModuleId,
        /// Claiming SDK.
        sdk: SdkRef,
    },
    /// Union `sdks` into `target`'s required set.
    BuildWithSdks {
        /// Module receiving the requirement.
        target: ModuleId,
        /// SDKs to add.
        sdks: SdkRefs,
    },
    /// Report an error against the source.
    Error {
        /// Offending property, if any.
        property: Option<String>,
        /// What went wrong.
        error: SdkError,
    },
}

/// Ops emitted while visiting one module.
#[derive(Debug)]
pub struct ModuleDelta {
    source: ModuleId,
    ops: Vec<MutationOp>,
}

impl ModuleDelta {
    /// Empty delta for `source`.
    #[must_use]
    pub fn new(source: ModuleId) -> Self {
        Self {
            source,
            ops: Vec::new(),
        }
    }

    /// Module the delta was produced for.
    #[must_use]
    pub fn source(&self) -> ModuleId {
        self.source
    }

    /// Records an op.
    pub fn emit(&mut self, op: MutationOp) {
        self.ops.push(op);
    }

    /// Number of recorded ops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Counters returned by [`ModuleGraph::apply_deltas`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Edges added.
    pub edges_added: usize,
    /// Edges retargeted.
    pub edges_rewired: usize,
    /// Diagnostics recorded.
    pub errors: usize,
}

impl ModuleGraph {
    /// Applies `deltas` in source-id order.
    pub(crate) fn apply_deltas(
        &mut self,
        mut deltas: Vec<ModuleDelta>,
        diagnostics: &mut Diagnostics,
    ) -> ApplyStats {
        deltas.sort_by_key(ModuleDelta::source);
        let mut stats = ApplyStats::default();
        for delta in deltas {
            let source = delta.source;
            for op in delta.ops {
                self.apply_op(source, op, diagnostics, &mut stats);
            }
        }
        stats
    }

    fn apply_op(
        &mut self,
        source: ModuleId,
        op: MutationOp,
        diagnostics: &mut Diagnostics,
        stats: &mut ApplyStats,
    ) {
        match op {
            MutationOp::AddDependency {
                tag,
                name,
                variants,
            } => {
                let targets: Vec<ModuleId> = match variants {
                    VariantSelector::All => self.variants_of(&name).to_vec(),
                    VariantSelector::Same => self
                        .module(source)
                        .and_then(|r| self.resolve(&name, r.variant()))
                        .into_iter()
                        .collect(),
                };
                if targets.is_empty() {
                    let property = tag.as_sdk_member().map(|t| t.property().to_owned());
                    self.report(source, property, SdkError::UndefinedModule(name), diagnostics);
                    stats.errors += 1;
                    return;
                }
                for target in targets {
                    self.add_edge(source, target, tag.clone());
                    stats.edges_added += 1;
                }
            }
            MutationOp::AddReverseDependency { tag, from } => {
                if self.module(from).is_some() {
                    self.add_edge(from, source, tag);
                    stats.edges_added += 1;
                }
            }
            MutationOp::ReplaceDependencies { name } => {
                let Some(old) = self
                    .module(source)
                    .and_then(|r| self.lookup(&name, r.variant()))
                else {
                    return;
                };
                let rewired = self.retarget_dependents(old, source);
                if rewired > 0 {
                    debug!(%name, ?source, rewired, "replaced dependencies");
                }
                stats.edges_rewired += rewired;
            }
            MutationOp::SetContainingSdk { target, sdk } => {
                let result = self
                    .module_mut(target)
                    .and_then(|r| r.module_mut().as_sdk_aware_mut())
                    .map(|aware| aware.make_member_of(&sdk));
                if let Some(Err(error)) = result {
                    self.report(target, None, error, diagnostics);
                    stats.errors += 1;
                }
            }
            MutationOp::BuildWithSdks { target, sdks } => {
                if let Some(aware) = self
                    .module_mut(target)
                    .and_then(|r| r.module_mut().as_sdk_aware_mut())
                {
                    aware.build_with_sdks(&sdks);
                }
            }
            MutationOp::Error { property, error } => {
                self.report(source, property, error, diagnostics);
                stats.errors += 1;
            }
        }
    }

    fn report(
        &mut self,
        id: ModuleId,
        property: Option<String>,
        error: SdkError,
        diagnostics: &mut Diagnostics,
    ) {
        let Some(record) = self.module(id) else {
            return;
        };
        diagnostics.push(Diagnostic {
            module: record.name().to_owned(),
            variant: record.variant().clone(),
            property,
            error,
        });
        self.mark_failed(id);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ident::Variant;
    use crate::module::{LibraryModule, SdkAware};

    fn lib() -> Box<dyn crate::module::Module> {
        Box::new(LibraryModule::new("cc_library_shared"))
    }

    fn aware(g: &ModuleGraph, id: ModuleId) -> &dyn SdkAware {
        g.module(id)
            .and_then(|r| r.module().as_sdk_aware())
            .unwrap()
    }

    #[test]
    fn deltas_apply_in_source_order() {
        let mut g = ModuleGraph::new();
        let a = g.add_module("a", Variant::core(), lib()).unwrap();
        let b = g.add_module("b", Variant::core(), lib()).unwrap();
        let member = g.add_module("m", Variant::core(), lib()).unwrap();

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let mut d_first = ModuleDelta::new(first);
        d_first.emit(MutationOp::SetContainingSdk {
            target: member,
            sdk: SdkRef::new("first", "1"),
        });
        let mut d_second = ModuleDelta::new(second);
        d_second.emit(MutationOp::SetContainingSdk {
            target: member,
            sdk: SdkRef::new("second", "1"),
        });

        let mut diags = Diagnostics::default();
        // Submitted out of order on purpose.
        let stats = g.apply_deltas(vec![d_second, d_first], &mut diags);
        assert_eq!(stats.errors, 1);
        assert_eq!(
            aware(&g, member).containing_sdk(),
            Some(&SdkRef::new("first", "1"))
        );
        assert!(g.is_failed(member));
        assert_eq!(diags.for_module("m").count(), 1);
    }

    #[test]
    fn unknown_names_are_reported_against_the_source() {
        let mut g = ModuleGraph::new();
        let a = g.add_module("a", Variant::core(), lib()).unwrap();
        let mut d = ModuleDelta::new(a);
        d.emit(MutationOp::AddDependency {
            tag: DependencyTag::plain("dep"),
            name: "ghost".into(),
            variants: VariantSelector::Same,
        });
        let mut diags = Diagnostics::default();
        g.apply_deltas(vec![d], &mut diags);
        let reported: Vec<_> = diags.iter().collect();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].error, SdkError::UndefinedModule("ghost".into()));
        assert!(g.is_failed(a));
    }

    #[test]
    fn all_variants_fan_out() {
        let mut g = ModuleGraph::new();
        let sdk = g.add_module("s", Variant::core(), lib()).unwrap();
        g.add_module("m", Variant::new("x"), lib()).unwrap();
        g.add_module("m", Variant::new("y"), lib()).unwrap();
        let mut d = ModuleDelta::new(sdk);
        d.emit(MutationOp::AddDependency {
            tag: DependencyTag::plain("dep"),
            name: "m".into(),
            variants: VariantSelector::All,
        });
        let stats = g.apply_deltas(vec![d], &mut Diagnostics::default());
        assert_eq!(stats.edges_added, 2);
        assert_eq!(g.deps(sdk).len(), 2);
    }
}
