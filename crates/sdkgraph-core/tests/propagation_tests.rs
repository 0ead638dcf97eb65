// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Requirement propagation, replacement and validation properties.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{
    cc_lib, deps, expected_violations, fingerprint, native_snapshot, refs, reported_violations,
    required, run, scenario_a, APEX_A,
};
use sdkgraph_core::module::register_packaging_mutators;
use sdkgraph_core::pipeline::{
    register_post_deps_mutators, register_pre_deps_mutators, sdk_deps_replace_mutator,
    SDK_DEPS_REPLACE,
};
use sdkgraph_core::{
    run_pass, ApexModule, Context, DeclaredDep, DepRef, DependencyTag, Diagnostics, GraphBuilder,
    MemberListRegistry, Module, MutatorRegistry, PackageBoundary, Phase, PipelineConfig, SdkAware,
    SdkBase, SdkError,
};

/// Consumer that treats every dependency as coming from outside its package.
#[derive(Debug)]
struct StrictConsumer {
    deps: Vec<String>,
    defaults: Vec<String>,
    sdk: SdkBase,
}

impl Module for StrictConsumer {
    fn module_type(&self) -> &str {
        "strict_consumer"
    }

    fn dependencies(&self) -> Vec<DeclaredDep> {
        self.deps
            .iter()
            .map(|n| DeclaredDep::new(DependencyTag::plain("link"), n))
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

impl SdkAware for StrictConsumer {
    fn sdk_base(&self) -> &SdkBase {
        &self.sdk
    }

    fn sdk_base_mut(&mut self) -> &mut SdkBase {
        &mut self.sdk
    }
}

impl PackageBoundary for StrictConsumer {
    fn dep_is_in_same_package(&self, _dep: &DepRef<'_>) -> bool {
        false
    }
}

#[test]
fn requirement_sets_only_grow_along_dependencies() {
    let mut b = GraphBuilder::new();
    b.module("root", ApexModule::new(["l1"], &["mysdk@11"]).unwrap())
        .unwrap();
    b.module("l1", cc_lib().with_deps(["l2"])).unwrap();
    let before = refs(&[("other", "1")]);
    b.module("l2", cc_lib().with_deps(["l3"]).with_required_sdks(&before))
        .unwrap();
    b.module("l3", cc_lib()).unwrap();
    let (graph, report) = run(b);
    assert!(report.succeeded(), "{}", report.diagnostics);

    let root = refs(&[("mysdk", "11")]);
    let l2 = required(&graph, "l2", "");
    assert!(l2.is_superset(&before));
    assert!(l2.is_superset(&root));
    assert_eq!(required(&graph, "l1", ""), root);
    assert_eq!(
        required(&graph, "l3", ""),
        refs(&[("mysdk", "11"), ("other", "1")])
    );
}

#[test]
fn replacement_is_a_fixed_point() {
    let lists = MemberListRegistry::shared_standard();
    let mut ctx = Context::with_sdk_pipeline(
        scenario_a().build(),
        PipelineConfig::serial(),
        &lists,
    );
    assert!(ctx.run().unwrap().succeeded());
    let mut graph = ctx.into_graph();
    let once = fingerprint(&graph);

    let mut registry = MutatorRegistry::new();
    registry.bottom_up(Phase::PostDeps, SDK_DEPS_REPLACE, sdk_deps_replace_mutator);
    let replace = registry.iter().next().unwrap();
    let policy = PipelineConfig::serial().exec_policy();
    let mut diagnostics = Diagnostics::default();
    for _ in 0..2 {
        let stats = run_pass(&mut graph, replace, policy, &mut diagnostics).unwrap();
        assert_eq!(stats.applied.edges_rewired, 0);
    }
    assert!(diagnostics.is_empty());
    assert_eq!(fingerprint(&graph), once);
}

#[test]
fn validation_flags_exactly_the_uncovered_dependencies() {
    let mut b = GraphBuilder::new();
    for name in ["x", "y", "z", "lib_defaults"] {
        b.module(name, cc_lib()).unwrap();
    }
    b.module("s@1", native_snapshot(&["x"])).unwrap();
    b.module("s@2", native_snapshot(&["y", "lib_defaults"]))
        .unwrap();
    b.module(
        "consumer",
        StrictConsumer {
            deps: vec!["x".into(), "y".into(), "z".into()],
            defaults: vec!["lib_defaults".into()],
            sdk: SdkBase::with_required(refs(&[("s", "1")])),
        },
    )
    .unwrap();
    let (graph, report) = run(b);

    let reported = reported_violations(&report.diagnostics);
    assert_eq!(reported, expected_violations(&graph, &report.diagnostics));
    let flagged: Vec<_> = reported.iter().map(|(_, dep)| dep.as_str()).collect();
    assert_eq!(flagged, ["y", "z"]);

    let unassigned = report
        .diagnostics
        .iter()
        .find_map(|d| match &d.error {
            SdkError::RequirementViolation { dep, sdk, .. } if dep == "z" => Some(sdk.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(unassigned, "<none>");
}

#[test]
fn validation_matches_the_graph_in_the_pinned_scenario() {
    let (graph, report) = run(scenario_a());
    assert!(expected_violations(&graph, &report.diagnostics).is_empty());
    assert!(reported_violations(&report.diagnostics).is_empty());
}

#[test]
fn packaging_mutators_run_before_sdk_post_deps_mutators() {
    let (_, report) = run(scenario_a());
    let names: Vec<_> = report.passes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "SdkMember",
            "SdkMember_deps",
            "SdkMemberInterVersion",
            "deps",
            "apex_uses_sdks",
            "SdkDepsMutator",
            "SdkDepsReplaceMutator",
            "SdkRequirementCheck",
        ]
    );
}

#[test]
fn sdk_post_deps_mutators_see_nothing_when_packaging_runs_late() {
    let lists = MemberListRegistry::shared_standard();
    let mut ctx = Context::new(scenario_a().build(), PipelineConfig::serial());
    let registry = ctx.registry_mut();
    register_pre_deps_mutators(registry, &lists);
    register_post_deps_mutators(registry);
    register_packaging_mutators(registry);
    let report = ctx.run().unwrap();
    assert!(report.succeeded(), "{}", report.diagnostics);

    let graph = ctx.into_graph();
    assert_eq!(
        deps(&graph, "com.a", APEX_A),
        [("libfoo".to_owned(), APEX_A.to_owned())]
    );
    assert!(required(&graph, "libfoo", APEX_A).is_empty());
    assert_eq!(required(&graph, "com.a", APEX_A), refs(&[("mysdk", "11")]));
}
