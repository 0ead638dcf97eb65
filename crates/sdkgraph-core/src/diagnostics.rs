// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User-facing build diagnostics and host-fatal errors.
//!
//! Mutators never panic and never abort a traversal: every problem they find
//! becomes a [`Diagnostic`] attributed to one module (and optionally one of
//! its properties). The module is then skipped by later passes while the rest
//! of the graph keeps being processed. Only structural host failures (a cycle,
//! a duplicate declaration) are fatal and surface as [`PipelineError`].
use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::ident::Variant;
use crate::sdk_ref::{SdkRef, SdkRefError, SdkRefs};

/// Problems reported against a single module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    /// An `sdk_snapshot` module whose name has no version suffix.
    #[error("sdk_snapshot should be named as <name>@<version>")]
    SnapshotNameUnversioned,
    /// An `sdk` module whose name carries a version suffix.
    #[error("sdk shouldn't be named as <name>@<version>")]
    SdkNameVersioned,
    /// Malformed reference or version token.
    #[error(transparent)]
    Ref(#[from] SdkRefError),
    /// The SDK declares a member list no member type is registered for.
    #[error("unrecognized member list property {0:?}")]
    UnknownMemberList(String),
    /// A dependency names a module that does not exist.
    #[error("depends on undefined module {0:?}")]
    UndefinedModule(String),
    /// A member list references a module its member type cannot handle.
    #[error("{name:?} is a {module_type} module, which is not a valid {member_type}")]
    MemberTypeMismatch {
        /// Referenced module.
        name: String,
        /// Member type of the list.
        member_type: String,
        /// Module type of the referenced module.
        module_type: String,
    },
    /// Two different SDKs claim the same module.
    #[error("is already a member of sdk {existing}; cannot also be a member of {requested}")]
    DuplicateMembership {
        /// SDK that claimed the module first.
        existing: SdkRef,
        /// SDK that tried to claim it afterwards.
        requested: SdkRef,
    },
    /// A non-co-packaged dependency lies outside the required SDKs.
    #[error("depends on {dep:?} (in SDK {sdk:?}) that isn't part of the required SDKs: {allowed}")]
    RequirementViolation {
        /// Offending dependency.
        dep: String,
        /// Its containing SDK (`<none>` when unassigned).
        sdk: String,
        /// The consumer's required set.
        allowed: SdkRefs,
    },
    /// The snapshot collaborator failed.
    #[error("failed to build snapshot: {0}")]
    Snapshot(String),
}

/// One error attributed to a module variant and, optionally, a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Module name.
    pub module: String,
    /// Module variant.
    pub variant: Variant,
    /// Property the error is attributed to, if any.
    pub property: Option<String>,
    /// What went wrong.
    pub error: SdkError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {:?} variant {:?}: ", self.module, self.variant.as_str())?;
        if let Some(property) = &self.property {
            write!(f, "{property}: ")?;
        }
        write!(f, "{}", self.error)
    }
}

/// Diagnostics accumulated over a whole build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Records one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "build error");
        self.entries.push(diagnostic);
    }

    /// Returns `true` when nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics reported against `module` (any variant).
    pub fn for_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries.iter().filter(move |d| d.module == module)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.entries {
            writeln!(f, "error: {d}")?;
        }
        Ok(())
    }
}

/// Structural failures of the host graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A `(name, variant)` pair was declared twice.
    #[error("module {name:?} already declared in variant {variant}")]
    DuplicateModule {
        /// Module name.
        name: String,
        /// Variant label.
        variant: Variant,
    },
    /// The dependency graph is not acyclic.
    #[error("dependency cycle among modules: {}", .0.join(", "))]
    Cycle(Vec<String>),
}

/// Fatal errors that stop the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Host graph failure.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Returned by [`crate::BuildReport::into_result`] when any diagnostic was recorded.
#[derive(Debug, Error)]
#[error("build failed with {} error(s)", .0.len())]
pub struct BuildFailed(pub Diagnostics);
