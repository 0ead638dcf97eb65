// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-module contexts handed to mutators.
//!
//! A context pairs the read-only [`GraphView`] with the [`ModuleDelta`] of
//! the module being visited. Bottom-up contexts may create and rewire edges;
//! top-down contexts may write the SDK fields of direct dependencies.
use std::ops::{Deref, DerefMut};

use crate::delta::{ModuleDelta, MutationOp, VariantSelector};
use crate::diagnostics::SdkError;
use crate::graph::ModuleRecord;
use crate::ident::{ModuleId, Variant};
use crate::module::Module;
use crate::sdk_ref::{SdkRef, SdkRefs};
use crate::tag::DependencyTag;
use crate::view::GraphView;

/// A direct dependency as seen from the visited module.
#[derive(Clone, Copy, Debug)]
pub struct DepRef<'a> {
    /// Target id.
    pub id: ModuleId,
    /// Target module name.
    pub name: &'a str,
    /// Target member name.
    pub member_name: &'a str,
    /// Tag of the edge.
    pub tag: &'a DependencyTag,
    /// Target module.
    pub module: &'a dyn Module,
}

/// Shared part of [`BottomUpContext`] and [`TopDownContext`].
#[derive(Debug)]
pub struct BaseModuleContext<'a> {
    view: GraphView<'a>,
    id: ModuleId,
    record: &'a ModuleRecord,
    delta: ModuleDelta,
}

impl<'a> BaseModuleContext<'a> {
    fn new(view: GraphView<'a>, id: ModuleId, record: &'a ModuleRecord) -> Self {
        Self {
            view,
            id,
            record,
            delta: ModuleDelta::new(id),
        }
    }

    /// Id of the visited module.
    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.id
    }

    /// The visited module.
    #[must_use]
    pub fn module(&self) -> &'a dyn Module {
        self.record.module()
    }

    /// Name of the visited module.
    #[must_use]
    pub fn module_name(&self) -> &'a str {
        self.record.name()
    }

    /// Variant of the visited module.
    #[must_use]
    pub fn variant(&self) -> &'a Variant {
        self.record.variant()
    }

    /// Read-only graph view.
    #[must_use]
    pub fn view(&self) -> GraphView<'a> {
        self.view
    }

    /// Direct dependencies in edge order.
    pub fn direct_deps(&self) -> impl Iterator<Item = DepRef<'a>> + 'a {
        let view = self.view;
        view.deps(self.id).iter().filter_map(move |edge| {
            let record = view.module(edge.to)?;
            Some(DepRef {
                id: edge.to,
                name: record.name(),
                member_name: record.member_name(),
                tag: &edge.tag,
                module: record.module(),
            })
        })
    }

    /// Reports an error against one of the module's properties.
    pub fn property_error(&mut self, property: &str, error: impl Into<SdkError>) {
        self.delta.emit(MutationOp::Error {
            property: Some(property.to_owned()),
            error: error.into(),
        });
    }

    /// Reports an error against the module as a whole.
    pub fn module_error(&mut self, error: impl Into<SdkError>) {
        self.delta.emit(MutationOp::Error {
            property: None,
            error: error.into(),
        });
    }

    pub(crate) fn into_delta(self) -> ModuleDelta {
        self.delta
    }
}

/// Context of a bottom-up mutator.
#[derive(Debug)]
pub struct BottomUpContext<'a> {
    base: BaseModuleContext<'a>,
}

impl<'a> BottomUpContext<'a> {
    pub(crate) fn new(view: GraphView<'a>, id: ModuleId, record: &'a ModuleRecord) -> Self {
        Self {
            base: BaseModuleContext::new(view, id, record),
        }
    }

    /// Adds an edge to `name` in this module's variant (or the core variant).
    pub fn add_dependency(&mut self, tag: DependencyTag, name: &str) {
        self.base.delta.emit(MutationOp::AddDependency {
            tag,
            name: name.to_owned(),
            variants: VariantSelector::Same,
        });
    }

    /// Adds one edge to every variant of `name`.
    pub fn add_dependency_all_variants(&mut self, tag: DependencyTag, name: &str) {
        self.base.delta.emit(MutationOp::AddDependency {
            tag,
            name: name.to_owned(),
            variants: VariantSelector::All,
        });
    }

    /// Adds an edge from `from` to this module.
    pub fn add_reverse_dependency(&mut self, from: ModuleId, tag: DependencyTag) {
        self.base
            .delta
            .emit(MutationOp::AddReverseDependency { tag, from });
    }

    /// Retargets edges aimed at `name` in this module's variant to this module.
    pub fn replace_dependencies(&mut self, name: &str) {
        self.base.delta.emit(MutationOp::ReplaceDependencies {
            name: name.to_owned(),
        });
    }

    pub(crate) fn into_delta(self) -> ModuleDelta {
        self.base.into_delta()
    }
}

impl<'a> Deref for BottomUpContext<'a> {
    type Target = BaseModuleContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for BottomUpContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

/// Context of a top-down mutator.
#[derive(Debug)]
pub struct TopDownContext<'a> {
    base: BaseModuleContext<'a>,
}

impl<'a> TopDownContext<'a> {
    pub(crate) fn new(view: GraphView<'a>, id: ModuleId, record: &'a ModuleRecord) -> Self {
        Self {
            base: BaseModuleContext::new(view, id, record),
        }
    }

    /// Records `sdk` as the containing SDK of `target`.
    pub fn make_member_of(&mut self, target: ModuleId, sdk: &SdkRef) {
        self.base.delta.emit(MutationOp::SetContainingSdk {
            target,
            sdk: sdk.clone(),
        });
    }

    /// Unions `sdks` into the required set of `target` (a direct dependency or
    /// the module itself).
    pub fn build_with_sdks(&mut self, target: ModuleId, sdks: &SdkRefs) {
        self.base.delta.emit(MutationOp::BuildWithSdks {
            target,
            sdks: sdks.clone(),
        });
    }

    pub(crate) fn into_delta(self) -> ModuleDelta {
        self.base.into_delta()
    }
}

impl<'a> Deref for TopDownContext<'a> {
    type Target = BaseModuleContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for TopDownContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}
