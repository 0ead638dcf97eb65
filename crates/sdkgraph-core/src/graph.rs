// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory module graph the pipeline runs over.
use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::diagnostics::GraphError;
use crate::ident::{make_module_id, ModuleId, Variant};
use crate::module::Module;
use crate::tag::DependencyTag;

/// A module variant stored in the graph.
#[derive(Debug)]
pub struct ModuleRecord {
    name: String,
    variant: Variant,
    module: Box<dyn Module>,
}

impl ModuleRecord {
    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant this record was declared (or split) for.
    #[must_use]
    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// The module itself.
    #[must_use]
    pub fn module(&self) -> &dyn Module {
        &*self.module
    }

    pub(crate) fn module_mut(&mut self) -> &mut dyn Module {
        &mut *self.module
    }

    /// Logical member name: the SDK-aware override, else the module name.
    #[must_use]
    pub fn member_name(&self) -> &str {
        self.module
            .as_sdk_aware()
            .map_or(self.name.as_str(), |aware| aware.member_name(&self.name))
    }
}

/// Directed dependency `from → to`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Depending module.
    pub from: ModuleId,
    /// Module depended upon.
    pub to: ModuleId,
    /// Why the edge exists.
    pub tag: DependencyTag,
}

/// Traversal direction of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Dependencies before dependents.
    BottomUp,
    /// Dependents before dependencies.
    TopDown,
}

/// Module graph: records, ordered dependency edges and a reverse index.
///
/// Invariants
/// - every edge endpoint is a stored module;
/// - `dependents[to]` contains `from` iff at least one edge `from → to` exists;
/// - edges of one module keep insertion order (duplicates allowed).
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: BTreeMap<ModuleId, ModuleRecord>,
    by_name: FxHashMap<String, Vec<ModuleId>>,
    deps: BTreeMap<ModuleId, Vec<DependencyEdge>>,
    dependents: BTreeMap<ModuleId, BTreeSet<ModuleId>>,
    failed: BTreeSet<ModuleId>,
}

impl ModuleGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a module variant.
    pub fn add_module(
        &mut self,
        name: impl Into<String>,
        variant: Variant,
        module: Box<dyn Module>,
    ) -> Result<ModuleId, GraphError> {
        let name = name.into();
        let id = make_module_id(&name, &variant);
        if self.modules.contains_key(&id) {
            return Err(GraphError::DuplicateModule { name, variant });
        }
        self.by_name.entry(name.clone()).or_default().push(id);
        self.modules.insert(
            id,
            ModuleRecord {
                name,
                variant,
                module,
            },
        );
        Ok(id)
    }

    /// Record for `id`.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleRecord> {
        self.modules.get(&id)
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> Option<&mut ModuleRecord> {
        self.modules.get_mut(&id)
    }

    /// Iterate modules in canonical id order.
    pub fn iter_modules(&self) -> impl Iterator<Item = (ModuleId, &ModuleRecord)> {
        self.modules.iter().map(|(id, r)| (*id, r))
    }

    /// Number of module variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` for an empty graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Exact lookup by name and variant.
    #[must_use]
    pub fn lookup(&self, name: &str, variant: &Variant) -> Option<ModuleId> {
        let id = make_module_id(name, variant);
        self.modules.contains_key(&id).then_some(id)
    }

    /// Dependency resolution: the same variant, else the core variant.
    #[must_use]
    pub fn resolve(&self, name: &str, variant: &Variant) -> Option<ModuleId> {
        self.lookup(name, variant)
            .or_else(|| self.lookup(name, &Variant::core()))
    }

    /// Every variant declared under `name`, in declaration order.
    #[must_use]
    pub fn variants_of(&self, name: &str) -> &[ModuleId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Adds an edge. Both ends must exist.
    pub(crate) fn add_edge(&mut self, from: ModuleId, to: ModuleId, tag: DependencyTag) {
        debug_assert!(self.modules.contains_key(&from), "edge source missing");
        debug_assert!(self.modules.contains_key(&to), "edge target missing");
        self.deps
            .entry(from)
            .or_default()
            .push(DependencyEdge { from, to, tag });
        self.dependents.entry(to).or_default().insert(from);
    }

    /// Outgoing edges of `id` in insertion order.
    #[must_use]
    pub fn deps(&self, id: ModuleId) -> &[DependencyEdge] {
        self.deps.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Modules with at least one edge to `id`.
    pub fn dependents(&self, id: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        self.dependents.get(&id).into_iter().flatten().copied()
    }

    /// Iterate all edges grouped by source in canonical order.
    pub fn iter_edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.deps.values().flatten()
    }

    /// Points every edge `d → old` at `new` instead, for dependents `d` in
    /// `new`'s variant. Edges from `new` itself and edges laid down by SDK
    /// declarations (see [`DependencyTag::is_sdk_structure`]) are left alone.
    /// Returns the number of edges rewired.
    pub(crate) fn retarget_dependents(&mut self, old: ModuleId, new: ModuleId) -> usize {
        let Some(variant) = self.modules.get(&new).map(|r| r.variant.clone()) else {
            return 0;
        };
        let sources: Vec<ModuleId> = self
            .dependents(old)
            .filter(|d| *d != new)
            .filter(|d| self.modules.get(d).is_some_and(|r| r.variant == variant))
            .collect();
        let mut rewired = 0;
        for source in sources {
            let Some(edges) = self.deps.get_mut(&source) else {
                continue;
            };
            let mut moved = false;
            for edge in edges
                .iter_mut()
                .filter(|e| e.to == old && !e.tag.is_sdk_structure())
            {
                edge.to = new;
                moved = true;
                rewired += 1;
            }
            if !moved {
                continue;
            }
            let still_depends = edges.iter().any(|e| e.to == old);
            if !still_depends {
                if let Some(set) = self.dependents.get_mut(&old) {
                    set.remove(&source);
                }
            }
            self.dependents.entry(new).or_default().insert(source);
        }
        if self.dependents.get(&old).is_some_and(BTreeSet::is_empty) {
            self.dependents.remove(&old);
        }
        rewired
    }

    /// Marks `id` so later passes skip it.
    pub(crate) fn mark_failed(&mut self, id: ModuleId) {
        self.failed.insert(id);
    }

    /// Returns `true` once an error was recorded against `id`.
    #[must_use]
    pub fn is_failed(&self, id: ModuleId) -> bool {
        self.failed.contains(&id)
    }

    /// Splits the graph into waves for `order`.
    ///
    /// Every module of a wave only waits on modules of earlier waves: for
    /// [`TraversalOrder::BottomUp`] a module waits on its dependencies, for
    /// [`TraversalOrder::TopDown`] on its dependents. Waves are sorted by id.
    pub fn waves(&self, order: TraversalOrder) -> Result<Vec<Vec<ModuleId>>, GraphError> {
        let mut pending: BTreeMap<ModuleId, usize> =
            self.modules.keys().map(|id| (*id, 0)).collect();
        let mut release: BTreeMap<ModuleId, BTreeSet<ModuleId>> = BTreeMap::new();
        for edge in self.iter_edges().filter(|e| e.from != e.to) {
            let (waiter, blocker) = match order {
                TraversalOrder::BottomUp => (edge.from, edge.to),
                TraversalOrder::TopDown => (edge.to, edge.from),
            };
            if release.entry(blocker).or_default().insert(waiter) {
                *pending.entry(waiter).or_default() += 1;
            }
        }

        let mut wave: Vec<ModuleId> = pending
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut waves = Vec::new();
        let mut visited = 0;
        while !wave.is_empty() {
            visited += wave.len();
            let mut next = Vec::new();
            for id in &wave {
                for waiter in release.get(id).into_iter().flatten() {
                    if let Some(n) = pending.get_mut(waiter) {
                        *n -= 1;
                        if *n == 0 {
                            next.push(*waiter);
                        }
                    }
                }
            }
            next.sort_unstable();
            waves.push(std::mem::replace(&mut wave, next));
        }

        if visited != self.modules.len() {
            let mut stuck: Vec<String> = pending
                .iter()
                .filter(|(_, n)| **n > 0)
                .filter_map(|(id, _)| self.modules.get(id))
                .map(|r| format!("{} ({})", r.name, r.variant))
                .collect();
            stuck.sort();
            return Err(GraphError::Cycle(stuck));
        }
        Ok(waves)
    }
}
