// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! SDK references: `(name, version)` pairs and sets of them.
//!
//! A reference is written `name@version`. The version is either the literal
//! `current` or a non-negative integer; an absent version means the
//! in-development (unversioned) copy of the SDK. All version tokens are checked
//! through [`validate_version`] so reference parsing and SDK name validation
//! can never disagree.
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the SDK name and its version.
pub const SDK_VERSION_SEPARATOR: char = '@';

/// Version token naming the latest frozen snapshot.
pub const CURRENT_VERSION: &str = "current";

/// Errors produced while parsing or validating SDK references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkRefError {
    /// The string contains more than one separator or has an empty name.
    #[error("{0:?} does not follow name@version syntax")]
    Syntax(String),
    /// The version is neither `current` nor a non-negative integer.
    #[error("version {0:?} is neither a number nor \"current\"")]
    InvalidVersion(String),
}

/// A validated, non-empty version token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SdkVersion {
    /// `current`.
    Current,
    /// A numbered frozen snapshot.
    Numbered(u64),
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str(CURRENT_VERSION),
            Self::Numbered(n) => write!(f, "{n}"),
        }
    }
}

/// Validates a non-empty version token.
///
/// This is the only place version syntax is decided.
pub fn validate_version(token: &str) -> Result<SdkVersion, SdkRefError> {
    if token == CURRENT_VERSION {
        return Ok(SdkVersion::Current);
    }
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SdkRefError::InvalidVersion(token.to_owned()));
    }
    token
        .parse::<u64>()
        .map(SdkVersion::Numbered)
        .map_err(|_| SdkRefError::InvalidVersion(token.to_owned()))
}

/// Identity of one SDK at one version.
///
/// An empty `version` denotes the unversioned (in-development) SDK.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SdkRef {
    /// SDK name.
    pub name: String,
    /// Version token, empty when unversioned.
    pub version: String,
}

impl SdkRef {
    /// Builds a reference without validating the version token.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Reference to the in-development copy of `name`.
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Splits `name@version` without validating the version token.
    ///
    /// Used for module names, where the version is validated separately so the
    /// naming rules can be reported first.
    pub fn parse(text: &str) -> Result<Self, SdkRefError> {
        let mut parts = text.split(SDK_VERSION_SEPARATOR);
        let name = parts.next().unwrap_or_default();
        let version = parts.next().unwrap_or_default();
        if name.is_empty() || parts.next().is_some() {
            return Err(SdkRefError::Syntax(text.to_owned()));
        }
        Ok(Self::new(name, version))
    }

    /// Splits `name@version` and validates a present version token.
    pub fn parse_validated(text: &str) -> Result<Self, SdkRefError> {
        let sdk = Self::parse(text)?;
        sdk.checked_version()?;
        Ok(sdk)
    }

    /// Returns `true` for the in-development copy.
    #[must_use]
    pub fn is_unversioned(&self) -> bool {
        self.version.is_empty()
    }

    /// Validated version, or `None` when unversioned.
    pub fn checked_version(&self) -> Result<Option<SdkVersion>, SdkRefError> {
        if self.is_unversioned() {
            Ok(None)
        } else {
            validate_version(&self.version).map(Some)
        }
    }
}

impl fmt::Display for SdkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unversioned() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}{SDK_VERSION_SEPARATOR}{}", self.name, self.version)
        }
    }
}

impl TryFrom<String> for SdkRef {
    type Error = SdkRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_validated(&value)
    }
}

impl From<SdkRef> for String {
    fn from(value: SdkRef) -> Self {
        value.to_string()
    }
}

/// Ordered set of SDK references.
///
/// Sets only grow through [`SdkRefs::union_with`]; nothing in the pipeline
/// removes an element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SdkRefs(BTreeSet<SdkRef>);

impl SdkRefs {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, sdk: &SdkRef) -> bool {
        self.0.contains(sdk)
    }

    /// Membership test for an optional reference; `None` is never contained.
    #[must_use]
    pub fn contains_opt(&self, sdk: Option<&SdkRef>) -> bool {
        sdk.is_some_and(|s| self.contains(s))
    }

    /// Adds one reference, returning `true` if it was new.
    pub fn insert(&mut self, sdk: SdkRef) -> bool {
        self.0.insert(sdk)
    }

    /// Unions `other` into `self`, returning `true` if anything was added.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.0.len();
        self.0.extend(other.0.iter().cloned());
        self.0.len() != before
    }

    /// Returns `true` if `self` contains every element of `other`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        self.0.is_superset(&other.0)
    }

    /// Number of references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> btree_set::Iter<'_, SdkRef> {
        self.0.iter()
    }
}

impl FromIterator<SdkRef> for SdkRefs {
    fn from_iter<T: IntoIterator<Item = SdkRef>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SdkRefs {
    type Item = &'a SdkRef;
    type IntoIter = btree_set::Iter<'a, SdkRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for SdkRefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, sdk) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{sdk}")?;
        }
        f.write_str("]")
    }
}

/// Renders an optional containing SDK for diagnostics.
pub(crate) fn display_opt(sdk: Option<&SdkRef>) -> String {
    sdk.map_or_else(|| "<none>".to_owned(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn parse_splits_name_and_version() {
        let sdk = SdkRef::parse("mysdk@11").unwrap();
        assert_eq!(sdk, SdkRef::new("mysdk", "11"));
        assert!(!sdk.is_unversioned());
        assert_eq!(sdk.to_string(), "mysdk@11");

        let bare = SdkRef::parse("mysdk").unwrap();
        assert!(bare.is_unversioned());
        assert_eq!(bare.to_string(), "mysdk");
    }

    #[test]
    fn parse_rejects_extra_separators_and_empty_names() {
        assert_eq!(
            SdkRef::parse("a@1@2"),
            Err(SdkRefError::Syntax("a@1@2".into()))
        );
        assert!(matches!(SdkRef::parse("@1"), Err(SdkRefError::Syntax(_))));
        assert!(matches!(SdkRef::parse(""), Err(SdkRefError::Syntax(_))));
    }

    #[test]
    fn version_tokens() {
        assert_eq!(validate_version("current"), Ok(SdkVersion::Current));
        assert_eq!(validate_version("0"), Ok(SdkVersion::Numbered(0)));
        assert_eq!(validate_version("12"), Ok(SdkVersion::Numbered(12)));
        for bad in ["7x", "-1", "+3", "Current", " 1", ""] {
            assert_eq!(
                validate_version(bad),
                Err(SdkRefError::InvalidVersion(bad.into())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_version_message_matches_build_output() {
        let err = SdkRef::parse_validated("mysdk@7x").unwrap_err();
        assert_eq!(
            err.to_string(),
            "version \"7x\" is neither a number nor \"current\""
        );
    }

    #[test]
    fn union_is_monotone_and_reports_growth() {
        let mut a: SdkRefs = [SdkRef::new("x", "1")].into_iter().collect();
        let b: SdkRefs = [SdkRef::new("x", "1"), SdkRef::new("y", "2")]
            .into_iter()
            .collect();
        let before = a.clone();
        assert!(a.union_with(&b));
        assert!(a.is_superset(&before));
        assert!(a.is_superset(&b));
        assert!(!a.union_with(&b));
        assert_eq!(a.to_string(), "[x@1, y@2]");
    }

    #[test]
    fn unset_reference_is_never_contained() {
        let set: SdkRefs = [SdkRef::new("x", "1")].into_iter().collect();
        assert!(!set.contains_opt(None));
        assert!(set.contains_opt(Some(&SdkRef::new("x", "1"))));
        assert_eq!(display_opt(None), "<none>");
    }

    #[test]
    fn serde_uses_the_textual_form() {
        let sdk: SdkRef = serde_json::from_str("\"mysdk@current\"").unwrap();
        assert_eq!(sdk, SdkRef::new("mysdk", "current"));
        assert_eq!(serde_json::to_string(&sdk).unwrap(), "\"mysdk@current\"");
        assert!(serde_json::from_str::<SdkRef>("\"mysdk@7x\"").is_err());
    }
}
