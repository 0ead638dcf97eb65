// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! sdkgraph-core: SDK membership over a module dependency graph.
//!
//! SDKs list their members; the pipeline records which SDK each member
//! belongs to, ripples the SDK versions packaging roots require down to their
//! dependencies, swaps in frozen member copies where a version is pinned and
//! finally checks that nothing outside a package escapes its required SDKs.
//!
//! ```no_run
//! use sdkgraph_core::{
//!     ApexModule, Context, GraphBuilder, LibraryModule, MemberListRegistry, PipelineConfig,
//!     SdkModule, SdkProperties,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut b = GraphBuilder::new();
//! b.module("libfoo", LibraryModule::new("cc_library_shared"))?;
//! b.module(
//!     "mysdk",
//!     SdkModule::new(SdkProperties::new().with_members("native_shared_libs", ["libfoo"])),
//! )?;
//! b.module("com.example", ApexModule::new(["libfoo"], &["mysdk@current"])?)?;
//!
//! let lists = MemberListRegistry::shared_standard();
//! let mut ctx = Context::with_sdk_pipeline(b.build(), PipelineConfig::default(), &lists);
//! let report = ctx.run()?.into_result()?;
//! assert_eq!(report.snapshots.len(), 1);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod builder;
mod config;
mod context;
mod delta;
mod diagnostics;
mod engine;
mod graph;
mod ident;
mod member_list;
mod member_type;
pub mod module;
pub mod pipeline;
mod sdk;
mod sdk_ref;
mod snapshot;
mod tag;
mod traversal;
mod view;

pub use builder::GraphBuilder;
pub use config::{ConfigError, ConfigService, ConfigStore, PipelineConfig, PIPELINE_CONFIG_KEY};
pub use context::{BaseModuleContext, BottomUpContext, DepRef, TopDownContext};
pub use delta::{ApplyStats, ModuleDelta, MutationOp, VariantSelector};
pub use diagnostics::{BuildFailed, Diagnostic, Diagnostics, GraphError, PipelineError, SdkError};
pub use engine::{resolve_deps_mutator, BuildReport, Context, PassSummary, RESOLVE_DEPS};
pub use graph::{DependencyEdge, ModuleGraph, ModuleRecord, TraversalOrder};
pub use ident::{make_module_id, Hash, ModuleId, Variant};
pub use member_list::{MemberListProperty, MemberListRegistry, RegistryError};
pub use member_type::{
    ModuleTypeMember, SdkMemberType, JAVA_HEADER_LIBRARY, JAVA_IMPL_LIBRARY,
    NATIVE_SHARED_LIBRARY, STUBS_SOURCES,
};
pub use module::{
    ApexModule, DeclaredDep, LibraryModule, Module, PackageBoundary, SdkAware, SdkBase,
    SdkDefaultsModule,
};
pub use sdk::{SdkModule, SdkProperties, SDK_MODULE_TYPE, SDK_SNAPSHOT_MODULE_TYPE};
pub use sdk_ref::{
    validate_version, SdkRef, SdkRefError, SdkRefs, SdkVersion, CURRENT_VERSION,
    SDK_VERSION_SEPARATOR,
};
pub use snapshot::{
    PlannedSnapshotWriter, SnapshotError, SnapshotMember, SnapshotOutput, SnapshotRequest,
    SnapshotWriter, SNAPSHOT_SUFFIX,
};
pub use tag::{DependencyTag, SdkMemberTag};
pub use traversal::{
    run_pass, BottomUpMutator, ExecPolicy, MutatorRegistry, PassStats, Phase, RegisteredMutator,
    TopDownMutator,
};
pub use view::GraphView;
