// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Passes 4 and 6: requirement propagation and the requirement check.
use crate::context::TopDownContext;
use crate::diagnostics::SdkError;
use crate::sdk_ref::display_opt;

/// Pass 4: unions the visited module's required set into every SDK-aware
/// direct dependency.
///
/// Top-down waves guarantee a module's set is final before its dependencies
/// are visited, so one sweep carries requirements to the whole subtree.
pub fn sdk_deps_mutator(ctx: &mut TopDownContext<'_>) {
    let Some(aware) = ctx.module().as_sdk_aware() else {
        return;
    };
    let required = aware.required_sdks();
    if required.is_empty() {
        return;
    }
    let deps: Vec<_> = ctx.direct_deps().collect();
    for dep in deps {
        if dep.module.as_sdk_aware().is_some() {
            ctx.build_with_sdks(dep.id, required);
        }
    }
}

/// Pass 6: every SDK-aware dependency that is not co-packaged with the
/// visited module must come from one of its required SDKs.
///
/// Edges to defaults modules are always allowed. A dependency in no SDK at
/// all is a violation too.
pub fn sdk_requirements_mutator(ctx: &mut TopDownContext<'_>) {
    let module = ctx.module();
    let (Some(aware), Some(boundary)) = (module.as_sdk_aware(), module.as_package_boundary())
    else {
        return;
    };
    let required = aware.required_sdks();
    if required.is_empty() {
        return;
    }
    let deps: Vec<_> = ctx.direct_deps().collect();
    for dep in deps {
        if dep.tag.is_defaults() {
            continue;
        }
        let Some(dep_aware) = dep.module.as_sdk_aware() else {
            continue;
        };
        let containing = dep_aware.containing_sdk();
        if !boundary.dep_is_in_same_package(&dep) && !required.contains_opt(containing) {
            ctx.module_error(SdkError::RequirementViolation {
                dep: dep.name.to_owned(),
                sdk: display_opt(containing),
                allowed: required.clone(),
            });
        }
    }
}
