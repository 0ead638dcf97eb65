// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeSet;
use std::fmt::Write as _;

use sdkgraph_core::{
    ApexModule, BuildReport, Context, DepRef, Diagnostics, GraphBuilder, LibraryModule,
    MemberListRegistry, ModuleGraph, ModuleId, PipelineConfig, SdkError, SdkModule, SdkProperties,
    SdkRef, SdkRefs, Variant,
};

pub const APEX_A: &str = "apex_a";
pub const APEX_B: &str = "apex_b";

/// Shared library of type `cc_library_shared`.
pub fn cc_lib() -> LibraryModule {
    LibraryModule::new("cc_library_shared")
}

/// `sdk` module listing `names` as native shared libraries.
pub fn native_sdk(names: &[&str]) -> SdkModule {
    SdkModule::new(SdkProperties::new().with_members("native_shared_libs", names.iter().copied()))
}

/// `sdk_snapshot` module listing `names` as native shared libraries.
pub fn native_snapshot(names: &[&str]) -> SdkModule {
    SdkModule::snapshot(
        SdkProperties::new().with_members("native_shared_libs", names.iter().copied()),
    )
}

pub fn refs(items: &[(&str, &str)]) -> SdkRefs {
    items.iter().map(|(n, v)| SdkRef::new(*n, *v)).collect()
}

/// Runs the full pipeline single-threaded.
pub fn run(builder: GraphBuilder) -> (ModuleGraph, BuildReport) {
    run_with(builder, PipelineConfig::serial())
}

pub fn run_with(builder: GraphBuilder, config: PipelineConfig) -> (ModuleGraph, BuildReport) {
    let lists = MemberListRegistry::shared_standard();
    let mut ctx = Context::with_sdk_pipeline(builder.build(), config, &lists);
    let report = ctx.run().expect("pipeline runs");
    (ctx.into_graph(), report)
}

pub fn id(graph: &ModuleGraph, name: &str, variant: &str) -> ModuleId {
    graph
        .lookup(name, &Variant::new(variant))
        .unwrap_or_else(|| panic!("module {name} ({variant}) declared"))
}

pub fn containing(graph: &ModuleGraph, name: &str, variant: &str) -> Option<SdkRef> {
    graph
        .module(id(graph, name, variant))
        .and_then(|r| r.module().as_sdk_aware())
        .and_then(|a| a.containing_sdk().cloned())
}

pub fn required(graph: &ModuleGraph, name: &str, variant: &str) -> SdkRefs {
    graph
        .module(id(graph, name, variant))
        .and_then(|r| r.module().as_sdk_aware())
        .map(|a| a.required_sdks().clone())
        .unwrap_or_default()
}

/// `(target name, target variant)` of every outgoing edge.
pub fn deps(graph: &ModuleGraph, name: &str, variant: &str) -> Vec<(String, String)> {
    graph
        .deps(id(graph, name, variant))
        .iter()
        .map(|e| {
            let target = graph.module(e.to).unwrap();
            (target.name().to_owned(), target.variant().as_str().to_owned())
        })
        .collect()
}

/// Stable textual dump of everything the pipeline can change.
pub fn fingerprint(graph: &ModuleGraph) -> String {
    let mut out = String::new();
    for (id, record) in graph.iter_modules() {
        let _ = write!(out, "{}/{}", record.name(), record.variant());
        if let Some(aware) = record.module().as_sdk_aware() {
            let containing = aware
                .containing_sdk()
                .map_or_else(|| "-".to_owned(), ToString::to_string);
            let _ = write!(out, " in={containing} req={}", aware.required_sdks());
        }
        if graph.is_failed(id) {
            out.push_str(" FAILED");
        }
        for edge in graph.deps(id) {
            let target = graph.module(edge.to).unwrap();
            let _ = write!(out, " ->{}/{}[{}]", target.name(), target.variant(), edge.tag);
        }
        out.push('\n');
    }
    out
}

/// `(consumer, dependency)` pairs the requirement check must flag in the
/// final graph. Modules that had already failed before the check are skipped.
pub fn expected_violations(
    graph: &ModuleGraph,
    diagnostics: &Diagnostics,
) -> BTreeSet<(String, String)> {
    let reported = reported_violations(diagnostics);
    let mut out = BTreeSet::new();
    for (id, record) in graph.iter_modules() {
        if graph.is_failed(id) && !reported.iter().any(|(m, _)| m == record.name()) {
            continue;
        }
        let module = record.module();
        let (Some(aware), Some(boundary)) = (module.as_sdk_aware(), module.as_package_boundary())
        else {
            continue;
        };
        if aware.required_sdks().is_empty() {
            continue;
        }
        for edge in graph.deps(id) {
            if edge.tag.is_defaults() {
                continue;
            }
            let target = graph.module(edge.to).unwrap();
            let Some(dep_aware) = target.module().as_sdk_aware() else {
                continue;
            };
            let dep = DepRef {
                id: edge.to,
                name: target.name(),
                member_name: target.member_name(),
                tag: &edge.tag,
                module: target.module(),
            };
            if !boundary.dep_is_in_same_package(&dep)
                && !aware.required_sdks().contains_opt(dep_aware.containing_sdk())
            {
                out.insert((record.name().to_owned(), target.name().to_owned()));
            }
        }
    }
    out
}

pub fn reported_violations(diagnostics: &Diagnostics) -> BTreeSet<(String, String)> {
    diagnostics
        .iter()
        .filter_map(|d| match &d.error {
            SdkError::RequirementViolation { dep, .. } => Some((d.module.clone(), dep.clone())),
            _ => None,
        })
        .collect()
}

/// Two bundles sharing `libfoo`; `com.a` pins `mysdk@11`, `com.b` pins nothing.
pub fn scenario_a() -> GraphBuilder {
    let mut b = GraphBuilder::new();
    for variant in [APEX_A, APEX_B] {
        b.variant("libfoo", variant, cc_lib()).unwrap();
        b.variant(
            "mysdk_libfoo@11",
            variant,
            cc_lib().with_sdk_member_name("libfoo"),
        )
        .unwrap();
    }
    b.module("mysdk", native_sdk(&["libfoo"])).unwrap();
    b.module("mysdk@11", native_snapshot(&["mysdk_libfoo@11"]))
        .unwrap();
    b.variant(
        "com.a",
        APEX_A,
        ApexModule::new(["libfoo"], &["mysdk@11"]).unwrap(),
    )
    .unwrap();
    b.variant(
        "com.b",
        APEX_B,
        ApexModule::new(["libfoo"], &[] as &[&str]).unwrap(),
    )
    .unwrap();
    b
}
