// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use std::fmt;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

/// Canonical 256-bit hash used for addressing modules.
pub type Hash = [u8; 32];

/// Strongly typed identifier for one module variant in the graph.
///
/// A `ModuleId` is derived from `(name, variant)` via [`make_module_id`], so
/// two variants of the same module never collide and the same declaration
/// always maps to the same id across runs. Ordering by `ModuleId` is the
/// canonical application order for wave deltas.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub Hash);

impl ModuleId {
    /// Short hex prefix for logs.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.short())
    }
}

/// Build configuration a module variant was split for (e.g. one per APEX).
///
/// The empty variant is the core variant: the one every module has before any
/// packaging subsystem splits it.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant(String);

impl Variant {
    /// The core (unsplit) variant.
    #[must_use]
    pub fn core() -> Self {
        Self(String::new())
    }

    /// A named variant.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns `true` for the core variant.
    #[must_use]
    pub fn is_core(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw label (empty for the core variant).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_core() {
            f.write_str("core")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Produces a stable, domain‑separated module identifier (prefix `b"module:"`) using BLAKE3.
///
/// The name and variant are separated by a NUL byte so `("ab", "c")` and
/// `("a", "bc")` hash differently.
pub fn make_module_id(name: &str, variant: &Variant) -> ModuleId {
    let mut hasher = Hasher::new();
    hasher.update(b"module:");
    hasher.update(name.as_bytes());
    hasher.update(b"\0");
    hasher.update(variant.as_str().as_bytes());
    ModuleId(hasher.finalize().into())
}
