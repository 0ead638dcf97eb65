// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passes 3 and 5: linking frozen members to their in-development copy and
//! swapping them in where their version is required.
use crate::context::BottomUpContext;
use crate::diagnostics::SdkError;
use crate::module::SdkAware;
use crate::sdk_ref::SdkRef;
use crate::tag::DependencyTag;

/// The visited module's SDK state when it is a member of a specific version.
fn versioned_membership<'a>(ctx: &BottomUpContext<'a>) -> Option<(&'a dyn SdkAware, &'a SdkRef)> {
    let aware = ctx.module().as_sdk_aware()?;
    let sdk = aware.containing_sdk()?;
    (!sdk.is_unversioned()).then_some((aware, sdk))
}

/// Pass 3: adds `member → this` under a versioned-member tag, where `member`
/// is the in-development module of the same member name and variant.
///
/// Every frozen copy thereby becomes reachable from the shared definition, so
/// consumers pinned to different versions each get their own copy.
pub fn member_inter_version_mutator(ctx: &mut BottomUpContext<'_>) {
    let Some((aware, sdk)) = versioned_membership(ctx) else {
        return;
    };
    let member = aware.member_name(ctx.module_name());
    if member == ctx.module_name() {
        return;
    }
    let Some(from) = ctx.view().lookup(member, ctx.variant()) else {
        ctx.module_error(SdkError::UndefinedModule(member.to_owned()));
        return;
    };
    let tag = DependencyTag::VersionedMember {
        member: member.to_owned(),
        version: sdk.version.clone(),
    };
    ctx.add_reverse_dependency(from, tag);
}

/// Pass 5: when a frozen member's own required set contains its SDK, every
/// same-variant edge to the in-development member is pointed at it instead.
pub fn sdk_deps_replace_mutator(ctx: &mut BottomUpContext<'_>) {
    let Some((aware, sdk)) = versioned_membership(ctx) else {
        return;
    };
    if !aware.required_sdks().contains(sdk) {
        return;
    }
    let member = aware.member_name(ctx.module_name());
    if member != ctx.module_name() {
        ctx.replace_dependencies(member);
    }
}
