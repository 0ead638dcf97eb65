// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The six SDK mutators and their registration.
//!
//! | # | name                     | order     | phase     |
//! |---|--------------------------|-----------|-----------|
//! | 1 | `SdkMember`              | bottom-up | pre-deps  |
//! | 2 | `SdkMember_deps`         | top-down  | pre-deps  |
//! | 3 | `SdkMemberInterVersion`  | bottom-up | pre-deps  |
//! | 4 | `SdkDepsMutator`         | top-down  | post-deps |
//! | 5 | `SdkDepsReplaceMutator`  | bottom-up | post-deps |
//! | 6 | `SdkRequirementCheck`    | top-down  | post-deps |
//!
//! The post-deps mutators read required sets written by packaging roots, so
//! the packaging subsystem's own post-deps mutators must be registered first
//! (see [`crate::module::register_packaging_mutators`]).
use std::sync::Arc;

use crate::context::{BottomUpContext, TopDownContext};
use crate::member_list::MemberListRegistry;
use crate::traversal::{MutatorRegistry, Phase};

mod membership;
mod requirements;
mod versions;

pub use membership::{member_deps_mutator, member_mutator};
pub use requirements::{sdk_deps_mutator, sdk_requirements_mutator};
pub use versions::{member_inter_version_mutator, sdk_deps_replace_mutator};

/// Registration name of pass 1.
pub const SDK_MEMBER: &str = "SdkMember";
/// Registration name of pass 2.
pub const SDK_MEMBER_DEPS: &str = "SdkMember_deps";
/// Registration name of pass 3.
pub const SDK_MEMBER_INTER_VERSION: &str = "SdkMemberInterVersion";
/// Registration name of pass 4.
pub const SDK_DEPS: &str = "SdkDepsMutator";
/// Registration name of pass 5.
pub const SDK_DEPS_REPLACE: &str = "SdkDepsReplaceMutator";
/// Registration name of pass 6.
pub const SDK_REQUIREMENT_CHECK: &str = "SdkRequirementCheck";

/// Registers passes 1 to 3.
pub fn register_pre_deps_mutators(registry: &mut MutatorRegistry, lists: &Arc<MemberListRegistry>) {
    let for_members = Arc::clone(lists);
    registry
        .bottom_up(Phase::PreDeps, SDK_MEMBER, move |ctx: &mut BottomUpContext<'_>| {
            member_mutator(ctx, &for_members);
        })
        .parallel();
    let for_deps = Arc::clone(lists);
    registry
        .top_down(Phase::PreDeps, SDK_MEMBER_DEPS, move |ctx: &mut TopDownContext<'_>| {
            member_deps_mutator(ctx, &for_deps);
        })
        .parallel();
    registry
        .bottom_up(
            Phase::PreDeps,
            SDK_MEMBER_INTER_VERSION,
            member_inter_version_mutator,
        )
        .parallel();
}

/// Registers passes 4 to 6.
pub fn register_post_deps_mutators(registry: &mut MutatorRegistry) {
    registry
        .top_down(Phase::PostDeps, SDK_DEPS, sdk_deps_mutator)
        .parallel();
    registry
        .bottom_up(Phase::PostDeps, SDK_DEPS_REPLACE, sdk_deps_replace_mutator)
        .parallel();
    registry
        .top_down(Phase::PostDeps, SDK_REQUIREMENT_CHECK, sdk_requirements_mutator)
        .parallel();
}
