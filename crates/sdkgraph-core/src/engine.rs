// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Build driver: runs every registered mutator, then the build actions.
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::context::BottomUpContext;
use crate::diagnostics::{BuildFailed, Diagnostics, PipelineError};
use crate::graph::ModuleGraph;
use crate::member_list::MemberListRegistry;
use crate::module::register_packaging_mutators;
use crate::pipeline::{register_post_deps_mutators, register_pre_deps_mutators};
use crate::snapshot::{PlannedSnapshotWriter, SnapshotOutput, SnapshotWriter};
use crate::tag::DependencyTag;
use crate::traversal::{run_pass, MutatorRegistry, PassStats, Phase};

/// Registration name of the host dependency resolution mutator.
pub const RESOLVE_DEPS: &str = "deps";

/// Deps phase: adds the edges each module declares, plus one
/// [`DependencyTag::Defaults`] edge per inherited defaults module.
pub fn resolve_deps_mutator(ctx: &mut BottomUpContext<'_>) {
    let module = ctx.module();
    for dep in module.dependencies() {
        ctx.add_dependency(dep.tag, &dep.name);
    }
    for name in module.defaults() {
        ctx.add_dependency(DependencyTag::Defaults, name);
    }
}

/// Outcome of one mutator run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Mutator name.
    pub name: String,
    /// Modules visited.
    pub visited: usize,
    /// Edges added.
    pub edges_added: usize,
    /// Edges retargeted.
    pub edges_rewired: usize,
    /// Diagnostics recorded.
    pub errors: usize,
}

impl PassSummary {
    fn new(name: &str, stats: PassStats) -> Self {
        Self {
            name: name.to_owned(),
            visited: stats.visited,
            edges_added: stats.applied.edges_added,
            edges_rewired: stats.applied.edges_rewired,
            errors: stats.applied.errors,
        }
    }
}

/// What a build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Every error recorded, in report order.
    pub diagnostics: Diagnostics,
    /// Snapshot artifacts of in-development SDKs.
    pub snapshots: Vec<SnapshotOutput>,
    /// One entry per mutator that ran.
    pub passes: Vec<PassSummary>,
}

impl BuildReport {
    /// Returns `true` when no error was recorded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// `Err` carrying the diagnostics when the build failed.
    pub fn into_result(self) -> Result<Self, BuildFailed> {
        if self.succeeded() {
            Ok(self)
        } else {
            Err(BuildFailed(self.diagnostics))
        }
    }
}

/// Owns the graph, the mutators and the configuration of one build.
pub struct Context {
    graph: ModuleGraph,
    registry: MutatorRegistry,
    config: PipelineConfig,
    writer: Box<dyn SnapshotWriter>,
}

impl Context {
    /// Context with only host dependency resolution registered.
    #[must_use]
    pub fn new(graph: ModuleGraph, config: PipelineConfig) -> Self {
        let mut registry = MutatorRegistry::new();
        registry
            .bottom_up(Phase::Deps, RESOLVE_DEPS, resolve_deps_mutator)
            .parallel();
        Self {
            graph,
            registry,
            config,
            writer: Box::new(PlannedSnapshotWriter),
        }
    }

    /// Context with the packaging mutators and the SDK pipeline registered in
    /// their required order.
    #[must_use]
    pub fn with_sdk_pipeline(
        graph: ModuleGraph,
        config: PipelineConfig,
        lists: &Arc<MemberListRegistry>,
    ) -> Self {
        let mut ctx = Self::new(graph, config);
        register_pre_deps_mutators(&mut ctx.registry, lists);
        register_packaging_mutators(&mut ctx.registry);
        register_post_deps_mutators(&mut ctx.registry);
        ctx
    }

    /// Registry for additional mutators.
    pub fn registry_mut(&mut self) -> &mut MutatorRegistry {
        &mut self.registry
    }

    /// Replaces the snapshot collaborator.
    pub fn set_snapshot_writer(&mut self, writer: impl SnapshotWriter + 'static) {
        self.writer = Box::new(writer);
    }

    /// The graph in its current state.
    #[must_use]
    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Consumes the context, returning the graph.
    #[must_use]
    pub fn into_graph(self) -> ModuleGraph {
        self.graph
    }

    /// Runs every phase, then the build actions.
    ///
    /// Module-level problems end up in the report; only host failures (such
    /// as a dependency cycle) are returned as errors.
    #[instrument(skip(self), fields(modules = self.graph.len(), mutators = self.registry.len()))]
    pub fn run(&mut self) -> Result<BuildReport, PipelineError> {
        let policy = self.config.exec_policy();
        let mut report = BuildReport::default();
        for mutator in self.registry.iter() {
            let stats = run_pass(&mut self.graph, mutator, policy, &mut report.diagnostics)?;
            report.passes.push(PassSummary::new(mutator.name(), stats));
            if self.config.fail_fast && !report.diagnostics.is_empty() {
                warn!(mutator = mutator.name(), "stopping after first failing mutator");
                return Ok(report);
            }
        }
        report.snapshots = self.graph.build_snapshots(
            &*self.writer,
            &self.config.out_dir,
            &mut report.diagnostics,
        );
        info!(
            errors = report.diagnostics.len(),
            snapshots = report.snapshots.len(),
            "build finished"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("modules", &self.graph.len())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
