// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mutator registration and wave-by-wave execution.
//!
//! A pass visits the whole graph in waves (see [`ModuleGraph::waves`]). All
//! modules of a wave are independent: each one reads the graph through a
//! [`GraphView`] and writes only into its own [`ModuleDelta`]. Workers claim
//! modules through an atomic counter; the wave's deltas are merged in
//! canonical order before the next wave starts.
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, info_span};

use crate::context::{BottomUpContext, TopDownContext};
use crate::delta::{ApplyStats, ModuleDelta};
use crate::diagnostics::{Diagnostics, GraphError};
use crate::graph::{ModuleGraph, TraversalOrder};
use crate::ident::ModuleId;
use crate::view::GraphView;

/// A mutator run on every module, dependencies first.
pub trait BottomUpMutator: Send + Sync {
    /// Visits one module.
    fn mutate(&self, ctx: &mut BottomUpContext<'_>);
}

impl<F> BottomUpMutator for F
where
    F: Fn(&mut BottomUpContext<'_>) + Send + Sync,
{
    fn mutate(&self, ctx: &mut BottomUpContext<'_>) {
        self(ctx);
    }
}

/// A mutator run on every module, dependents first.
pub trait TopDownMutator: Send + Sync {
    /// Visits one module.
    fn mutate(&self, ctx: &mut TopDownContext<'_>);
}

impl<F> TopDownMutator for F
where
    F: Fn(&mut TopDownContext<'_>) + Send + Sync,
{
    fn mutate(&self, ctx: &mut TopDownContext<'_>) {
        self(ctx);
    }
}

/// Where in the build a mutator runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Before declared dependencies are resolved.
    PreDeps,
    /// Dependency resolution.
    Deps,
    /// After dependency resolution.
    PostDeps,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Self; 3] = [Self::PreDeps, Self::Deps, Self::PostDeps];
}

enum MutatorFn {
    BottomUp(Box<dyn BottomUpMutator>),
    TopDown(Box<dyn TopDownMutator>),
}

/// A named mutator in a phase.
pub struct RegisteredMutator {
    name: String,
    phase: Phase,
    parallel: bool,
    func: MutatorFn,
}

impl RegisteredMutator {
    /// Allows the mutator to visit the modules of a wave concurrently.
    pub fn parallel(&mut self) -> &mut Self {
        self.parallel = true;
        self
    }

    /// Registration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phase the mutator belongs to.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` if the mutator opted into parallel visiting.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Traversal direction.
    #[must_use]
    pub fn order(&self) -> TraversalOrder {
        match self.func {
            MutatorFn::BottomUp(_) => TraversalOrder::BottomUp,
            MutatorFn::TopDown(_) => TraversalOrder::TopDown,
        }
    }

    fn visit(&self, view: GraphView<'_>, id: ModuleId) -> Option<ModuleDelta> {
        let record = view.module(id)?;
        let delta = match &self.func {
            MutatorFn::BottomUp(m) => {
                let mut ctx = BottomUpContext::new(view, id, record);
                m.mutate(&mut ctx);
                ctx.into_delta()
            }
            MutatorFn::TopDown(m) => {
                let mut ctx = TopDownContext::new(view, id, record);
                m.mutate(&mut ctx);
                ctx.into_delta()
            }
        };
        (!delta.is_empty()).then_some(delta)
    }
}

impl std::fmt::Debug for RegisteredMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredMutator")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("order", &self.order())
            .field("parallel", &self.parallel)
            .finish()
    }
}

/// Ordered list of mutators. Within a phase, mutators run in registration
/// order; phases run in [`Phase::ALL`] order.
#[derive(Debug, Default)]
pub struct MutatorRegistry {
    mutators: Vec<RegisteredMutator>,
}

impl MutatorRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bottom-up mutator.
    pub fn bottom_up(
        &mut self,
        phase: Phase,
        name: &str,
        mutator: impl BottomUpMutator + 'static,
    ) -> &mut RegisteredMutator {
        self.push(phase, name, MutatorFn::BottomUp(Box::new(mutator)))
    }

    /// Registers a top-down mutator.
    pub fn top_down(
        &mut self,
        phase: Phase,
        name: &str,
        mutator: impl TopDownMutator + 'static,
    ) -> &mut RegisteredMutator {
        self.push(phase, name, MutatorFn::TopDown(Box::new(mutator)))
    }

    fn push(&mut self, phase: Phase, name: &str, func: MutatorFn) -> &mut RegisteredMutator {
        let index = self.mutators.len();
        self.mutators.push(RegisteredMutator {
            name: name.to_owned(),
            phase,
            parallel: false,
            func,
        });
        &mut self.mutators[index]
    }

    /// Mutators in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredMutator> {
        Phase::ALL
            .into_iter()
            .flat_map(move |phase| self.mutators.iter().filter(move |m| m.phase == phase))
    }

    /// Number of registered mutators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }
}

/// How a pass is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecPolicy {
    /// Worker threads for parallel mutators.
    pub workers: usize,
    /// Global switch; `false` runs every mutator serially.
    pub parallel: bool,
}

/// Outcome of one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Waves executed.
    pub waves: usize,
    /// Modules visited.
    pub visited: usize,
    /// Totals over all applied deltas.
    pub applied: ApplyStats,
}

/// Runs `mutator` over the whole graph.
pub fn run_pass(
    graph: &mut ModuleGraph,
    mutator: &RegisteredMutator,
    policy: ExecPolicy,
    diagnostics: &mut Diagnostics,
) -> Result<PassStats, GraphError> {
    let span = info_span!("pass", name = %mutator.name, order = ?mutator.order());
    let _guard = span.enter();

    let waves = graph.waves(mutator.order())?;
    let workers = if policy.parallel && mutator.parallel {
        policy.workers.max(1)
    } else {
        1
    };
    let mut stats = PassStats::default();
    for (index, wave) in waves.into_iter().enumerate() {
        let items: Vec<ModuleId> = wave.into_iter().filter(|id| !graph.is_failed(*id)).collect();
        if items.is_empty() {
            continue;
        }
        let deltas = {
            let view = GraphView::new(graph);
            if workers > 1 && items.len() > 1 {
                execute_parallel(view, mutator, &items, workers)
            } else {
                execute_serial(view, mutator, &items)
            }
        };
        let applied = graph.apply_deltas(deltas, diagnostics);
        debug!(wave = index, modules = items.len(), ?applied, "wave applied");
        stats.waves += 1;
        stats.visited += items.len();
        stats.applied.edges_added += applied.edges_added;
        stats.applied.edges_rewired += applied.edges_rewired;
        stats.applied.errors += applied.errors;
    }
    info!(
        visited = stats.visited,
        waves = stats.waves,
        edges_added = stats.applied.edges_added,
        edges_rewired = stats.applied.edges_rewired,
        errors = stats.applied.errors,
        "pass complete"
    );
    Ok(stats)
}

fn execute_serial(
    view: GraphView<'_>,
    mutator: &RegisteredMutator,
    items: &[ModuleId],
) -> Vec<ModuleDelta> {
    items
        .iter()
        .filter_map(|id| mutator.visit(view, *id))
        .collect()
}

fn execute_parallel(
    view: GraphView<'_>,
    mutator: &RegisteredMutator,
    items: &[ModuleId],
    workers: usize,
) -> Vec<ModuleDelta> {
    let next = AtomicUsize::new(0);
    let workers = workers.min(items.len());
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let next = &next;
                s.spawn(move || {
                    let mut out = Vec::new();
                    loop {
                        let ix = next.fetch_add(1, Ordering::Relaxed);
                        let Some(id) = items.get(ix) else {
                            break;
                        };
                        if let Some(delta) = mutator.visit(view, *id) {
                            out.push(delta);
                        }
                    }
                    out
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(deltas) => deltas,
                Err(e) => std::panic::resume_unwind(e),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ident::Variant;
    use crate::module::LibraryModule;
    use crate::tag::DependencyTag;

    #[test]
    fn phases_run_in_order_regardless_of_registration() {
        let mut registry = MutatorRegistry::new();
        registry.top_down(Phase::PostDeps, "late", |_: &mut TopDownContext<'_>| {});
        registry.bottom_up(Phase::PreDeps, "early", |_: &mut BottomUpContext<'_>| {});
        registry
            .bottom_up(Phase::Deps, "deps", |_: &mut BottomUpContext<'_>| {})
            .parallel();
        let names: Vec<_> = registry.iter().map(RegisteredMutator::name).collect();
        assert_eq!(names, ["early", "deps", "late"]);
        assert!(registry.iter().nth(1).unwrap().is_parallel());
    }

    #[test]
    fn bottom_up_pass_sees_edges_added_by_earlier_waves() {
        // a -> b; visiting b adds b -> c.
        let mut g = ModuleGraph::new();
        let lib = || Box::new(LibraryModule::new("cc_library_shared"));
        let a = g.add_module("a", Variant::core(), lib()).unwrap();
        let b = g.add_module("b", Variant::core(), lib()).unwrap();
        g.add_module("c", Variant::core(), lib()).unwrap();
        g.add_edge(a, b, DependencyTag::plain("dep"));

        let mut registry = MutatorRegistry::new();
        registry.bottom_up(Phase::PreDeps, "link_c", |ctx: &mut BottomUpContext<'_>| {
            if ctx.module_name() == "b" {
                ctx.add_dependency(DependencyTag::plain("dep"), "c");
            }
        });
        let mut diags = Diagnostics::default();
        let m = registry.iter().next().unwrap();
        let policy = ExecPolicy {
            workers: 4,
            parallel: true,
        };
        let stats = run_pass(&mut g, m, policy, &mut diags).unwrap();
        assert_eq!(stats.applied.edges_added, 1);
        assert_eq!(stats.visited, 3);
        assert!(diags.is_empty());
    }
}
