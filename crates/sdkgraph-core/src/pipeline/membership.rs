// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passes 1 and 2: SDK → member edges and containing-SDK recording.
use tracing::trace;

use crate::context::{BottomUpContext, TopDownContext};
use crate::diagnostics::SdkError;
use crate::member_list::MemberListRegistry;
use crate::sdk_ref::SdkRef;

/// Pass 1: adds one edge per listed member, tagged with the list's tag.
///
/// Properties no member type is registered for are reported on the property.
pub fn member_mutator(ctx: &mut BottomUpContext<'_>, lists: &MemberListRegistry) {
    let Some(sdk) = ctx.module().as_sdk() else {
        return;
    };
    for property in sdk.properties().property_names() {
        if lists.get(property).is_none() {
            ctx.property_error(property, SdkError::UnknownMemberList(property.to_owned()));
        }
    }
    for list in lists.iter() {
        let names = list.members(sdk.properties());
        if names.is_empty() {
            continue;
        }
        trace!(sdk = ctx.module_name(), list = list.name(), count = names.len(), "adding members");
        list.member_type()
            .add_dependencies(ctx, list.dependency_tag(), names);
    }
}

/// Pass 2: validates the SDK's own name, then claims every member reached
/// through a membership edge.
///
/// A naming error stops the SDK here: none of its members are claimed.
pub fn member_deps_mutator(ctx: &mut TopDownContext<'_>, lists: &MemberListRegistry) {
    let Some(sdk) = ctx.module().as_sdk() else {
        return;
    };
    let Some(my_ref) = checked_sdk_ref(ctx, sdk.is_snapshot()) else {
        return;
    };

    let deps: Vec<_> = ctx.direct_deps().collect();
    for dep in deps {
        let Some(list) = dep.tag.as_sdk_member().and_then(|t| lists.for_tag(t)) else {
            continue;
        };
        if !list.member_type().is_instance(dep.module) {
            ctx.property_error(
                list.name(),
                SdkError::MemberTypeMismatch {
                    name: dep.name.to_owned(),
                    member_type: list.member_type().name().to_owned(),
                    module_type: dep.module.module_type().to_owned(),
                },
            );
            continue;
        }
        if dep.module.as_sdk_aware().is_some() {
            ctx.make_member_of(dep.id, &my_ref);
        }
    }
}

/// Parses the visited SDK's name and applies the naming rules. Every
/// violation is reported on `name`; `None` means at least one was found.
fn checked_sdk_ref(ctx: &mut TopDownContext<'_>, snapshot: bool) -> Option<SdkRef> {
    const NAME: &str = "name";
    let my_ref = match SdkRef::parse(ctx.module_name()) {
        Ok(r) => r,
        Err(e) => {
            ctx.property_error(NAME, e);
            return None;
        }
    };
    let mut ok = true;
    if snapshot && my_ref.is_unversioned() {
        ctx.property_error(NAME, SdkError::SnapshotNameUnversioned);
        ok = false;
    }
    if !snapshot && !my_ref.is_unversioned() {
        ctx.property_error(NAME, SdkError::SdkNameVersioned);
        ok = false;
    }
    if let Err(e) = my_ref.checked_version() {
        ctx.property_error(NAME, e);
        ok = false;
    }
    ok.then_some(my_ref)
}
