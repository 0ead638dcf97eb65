// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `sdk_defaults`: shared member lists inherited by `sdk` modules.
use crate::module::Module;
use crate::sdk::SdkProperties;

/// Module type name.
pub const SDK_DEFAULTS_MODULE_TYPE: &str = "sdk_defaults";

/// Holds member lists that `sdk` modules naming it in `defaults` inherit.
#[derive(Clone, Debug, Default)]
pub struct SdkDefaultsModule {
    properties: SdkProperties,
}

impl SdkDefaultsModule {
    /// Defaults carrying `properties`.
    #[must_use]
    pub fn new(properties: SdkProperties) -> Self {
        Self { properties }
    }
}

impl Module for SdkDefaultsModule {
    fn module_type(&self) -> &str {
        SDK_DEFAULTS_MODULE_TYPE
    }

    fn as_sdk_defaults(&self) -> Option<&SdkProperties> {
        Some(&self.properties)
    }
}
