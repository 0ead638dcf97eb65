// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Read-only view over a [`ModuleGraph`] handed to mutators.
//!
//! Mutators observe through [`GraphView`] and mutate through a
//! [`ModuleDelta`](crate::delta::ModuleDelta). Do not add anything to this
//! type that hands out `&mut ModuleGraph` or interior mutability.

use crate::graph::{DependencyEdge, ModuleGraph, ModuleRecord};
use crate::ident::{ModuleId, Variant};

/// Read-only, `Copy` view over a [`ModuleGraph`].
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    graph: &'a ModuleGraph,
}

impl<'a> GraphView<'a> {
    /// Creates a view over `graph`.
    #[must_use]
    pub fn new(graph: &'a ModuleGraph) -> Self {
        Self { graph }
    }

    /// Record for `id`.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&'a ModuleRecord> {
        self.graph.module(id)
    }

    /// Exact lookup by name and variant.
    #[must_use]
    pub fn lookup(&self, name: &str, variant: &Variant) -> Option<ModuleId> {
        self.graph.lookup(name, variant)
    }

    /// Outgoing edges of `id`.
    #[must_use]
    pub fn deps(&self, id: ModuleId) -> &'a [DependencyEdge] {
        self.graph.deps(id)
    }
}
