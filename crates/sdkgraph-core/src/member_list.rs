// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Table of member-list properties an SDK may declare.
//!
//! Each entry ties a property name to the member type that handles it and to
//! the dependency tag its edges carry. The table is immutable once built and
//! is handed to the passes behind an `Arc`, so the passes and the member types
//! never need to reach each other through global state.
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::member_type::{
    SdkMemberType, JAVA_HEADER_LIBRARY, JAVA_IMPL_LIBRARY, NATIVE_SHARED_LIBRARY, STUBS_SOURCES,
};
use crate::sdk::SdkProperties;
use crate::tag::{DependencyTag, SdkMemberTag};

/// Error returned when building a [`MemberListRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two entries share a property name.
    #[error("member list property {0:?} registered twice")]
    Duplicate(String),
}

/// One declarable member list.
#[derive(Debug, Clone)]
pub struct MemberListProperty {
    name: String,
    member_type: Arc<dyn SdkMemberType>,
    dependency_tag: DependencyTag,
}

impl MemberListProperty {
    /// Binds a fresh membership tag to `name`.
    pub fn new(name: impl Into<String>, member_type: Arc<dyn SdkMemberType>) -> Self {
        let name = name.into();
        let dependency_tag = DependencyTag::SdkMember(SdkMemberTag::new(&name));
        Self {
            name,
            member_type,
            dependency_tag,
        }
    }

    /// Property name as written in the build description.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member type referenced by the list.
    #[must_use]
    pub fn member_type(&self) -> &dyn SdkMemberType {
        &*self.member_type
    }

    /// Tag carried by every edge this list creates.
    #[must_use]
    pub fn dependency_tag(&self) -> &DependencyTag {
        &self.dependency_tag
    }

    /// Reads the member names out of an SDK's properties.
    #[must_use]
    pub fn members<'a>(&self, properties: &'a SdkProperties) -> &'a [String] {
        properties.members(&self.name)
    }
}

/// Ordered, immutable set of member-list properties.
#[derive(Debug, Clone, Default)]
pub struct MemberListRegistry {
    properties: Vec<MemberListProperty>,
}

impl MemberListRegistry {
    /// Empty table; add entries with [`MemberListRegistry::register`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table, organised by package then by name.
    #[must_use]
    pub fn standard() -> Self {
        let entries: [(&str, Arc<dyn SdkMemberType>); 4] = [
            // native
            ("native_shared_libs", Arc::new(NATIVE_SHARED_LIBRARY)),
            // java
            ("java_header_libs", Arc::new(JAVA_HEADER_LIBRARY)),
            ("java_libs", Arc::new(JAVA_IMPL_LIBRARY)),
            ("stubs_sources", Arc::new(STUBS_SOURCES)),
        ];
        Self {
            properties: entries
                .into_iter()
                .map(|(name, ty)| MemberListProperty::new(name, ty))
                .collect(),
        }
    }

    /// Process-wide standard table, built on first use.
    pub fn shared_standard() -> Arc<Self> {
        static STANDARD: OnceLock<Arc<MemberListRegistry>> = OnceLock::new();
        Arc::clone(STANDARD.get_or_init(|| Arc::new(Self::standard())))
    }

    /// Appends an entry.
    pub fn register(
        &mut self,
        name: &str,
        member_type: Arc<dyn SdkMemberType>,
    ) -> Result<(), RegistryError> {
        if self.get(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_owned()));
        }
        self.properties
            .push(MemberListProperty::new(name, member_type));
        Ok(())
    }

    /// Entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MemberListProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Entry that bound `tag`.
    #[must_use]
    pub fn for_tag(&self, tag: &SdkMemberTag) -> Option<&MemberListProperty> {
        self.get(tag.property())
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MemberListProperty> {
        self.properties.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::member_type::ModuleTypeMember;

    #[test]
    fn standard_table_order_and_tags() {
        let registry = MemberListRegistry::standard();
        let names: Vec<_> = registry.iter().map(MemberListProperty::name).collect();
        assert_eq!(
            names,
            ["native_shared_libs", "java_header_libs", "java_libs", "stubs_sources"]
        );
        for p in registry.iter() {
            let tag = p.dependency_tag().as_sdk_member().unwrap();
            assert_eq!(tag.property(), p.name());
            assert!(registry.for_tag(tag).is_some());
        }
    }

    #[test]
    fn accessor_reads_the_named_list() {
        let registry = MemberListRegistry::standard();
        let props = SdkProperties::new().with_members("java_libs", ["core-lib"]);
        let java_libs = registry.get("java_libs").unwrap();
        assert_eq!(java_libs.members(&props), ["core-lib"]);
        assert!(registry.get("stubs_sources").unwrap().members(&props).is_empty());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = MemberListRegistry::new();
        let ty: Arc<dyn SdkMemberType> = Arc::new(ModuleTypeMember::new("thing", &["thing"]));
        registry.register("things", Arc::clone(&ty)).unwrap();
        assert_eq!(
            registry.register("things", ty),
            Err(RegistryError::Duplicate("things".into()))
        );
    }

    #[test]
    fn shared_table_is_built_once() {
        let a = MemberListRegistry::shared_standard();
        let b = MemberListRegistry::shared_standard();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
