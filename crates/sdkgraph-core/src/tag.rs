// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dependency tags: why an edge exists.
use std::fmt;
use std::sync::Arc;

/// Tag attached to every dependency edge.
///
/// The tag alone determines which pass (or host phase) created the edge and
/// how later passes interpret it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DependencyTag {
    /// SDK → member edge created by membership assignment for one member list.
    SdkMember(SdkMemberTag),
    /// In-development member → frozen copy of the same member at `version`.
    VersionedMember {
        /// Member name shared by both ends of the edge.
        member: String,
        /// Version of the SDK the frozen copy belongs to.
        version: String,
    },
    /// Module → defaults module it inherits properties from.
    Defaults,
    /// Any other host-declared dependency, labelled by its kind.
    Plain(Arc<str>),
}

impl DependencyTag {
    /// Host-declared dependency with `label`.
    pub fn plain(label: &str) -> Self {
        Self::Plain(Arc::from(label))
    }

    /// Returns the member-list tag when this edge is an SDK membership edge.
    #[must_use]
    pub fn as_sdk_member(&self) -> Option<&SdkMemberTag> {
        match self {
            Self::SdkMember(tag) => Some(tag),
            _ => None,
        }
    }

    /// Returns `true` for edges whose target is fixed by an SDK declaration:
    /// membership edges and in-development → frozen member edges. Dependency
    /// replacement never moves them.
    #[must_use]
    pub fn is_sdk_structure(&self) -> bool {
        matches!(self, Self::SdkMember(_) | Self::VersionedMember { .. })
    }

    /// Returns `true` for edges to defaults modules.
    #[must_use]
    pub fn is_defaults(&self) -> bool {
        matches!(self, Self::Defaults)
    }
}

impl fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SdkMember(tag) => write!(f, "sdk_member({})", tag.property()),
            Self::VersionedMember { member, version } => {
                write!(f, "versioned_member({member}@{version})")
            }
            Self::Defaults => f.write_str("defaults"),
            Self::Plain(label) => f.write_str(label),
        }
    }
}

/// Membership tag bound to one member-list property.
///
/// Instances are created once, when the member-list table is built, and
/// cloned onto every edge that property produces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SdkMemberTag {
    property: Arc<str>,
}

impl SdkMemberTag {
    pub(crate) fn new(property: &str) -> Self {
        Self {
            property: Arc::from(property),
        }
    }

    /// Name of the member-list property this tag was bound for.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }
}
