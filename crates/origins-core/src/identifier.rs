//! Namespaced identifiers for origins and power types.
//!
//! An [`Identifier`] has the textual form `namespace:path`. When the namespace
//! is omitted, [`DEFAULT_NAMESPACE`] is assumed. Identifiers are the stable,
//! persisted names of registry entries; at runtime the registry interns them
//! into compact index ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::OriginsError;

/// Namespace assumed when a raw identifier has no `:` separator.
pub const DEFAULT_NAMESPACE: &str = "origins";

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// A validated `namespace:path` identifier.
///
/// Namespaces may contain `[a-z0-9_.-]`, paths may additionally contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    namespace: String,
    path: String,
}

impl Identifier {
    /// Build an identifier from its parts, validating both.
    pub fn new(namespace: &str, path: &str) -> Result<Self, OriginsError> {
        let raw = format!("{namespace}:{path}");
        if namespace.is_empty() || !namespace.chars().all(is_namespace_char) {
            return Err(OriginsError::InvalidIdentifier {
                raw,
                reason: "namespace must be non-empty and match [a-z0-9_.-]",
            });
        }
        if path.is_empty() || !path.chars().all(is_path_char) {
            return Err(OriginsError::InvalidIdentifier {
                raw,
                reason: "path must be non-empty and match [a-z0-9_.-/]",
            });
        }
        Ok(Self {
            namespace: namespace.to_owned(),
            path: path.to_owned(),
        })
    }

    /// Build from parts known to be valid at compile time.
    pub(crate) fn new_unchecked(namespace: &str, path: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            path: path.to_owned(),
        }
    }

    /// Parse `raw`, returning `None` when it is malformed.
    pub fn try_parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    /// The part before the colon.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The part after the colon.
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_namespace_char(c: char) -> bool {
    matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-')
}

fn is_path_char(c: char) -> bool {
    is_namespace_char(c) || c == '/'
}

impl FromStr for Identifier {
    type Err = OriginsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once(':') {
            Some((namespace, path)) => Self::new(namespace, path),
            None => Self::new(DEFAULT_NAMESPACE, raw),
        }
    }
}

impl TryFrom<String> for Identifier {
    type Error = OriginsError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.to_string()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_namespaced() {
        let id: Identifier = "origins:elytrian".parse().unwrap();
        assert_eq!(id.namespace(), "origins");
        assert_eq!(id.path(), "elytrian");
        assert_eq!(id.to_string(), "origins:elytrian");
    }

    #[test]
    fn missing_namespace_uses_default() {
        let id = Identifier::try_parse("human").unwrap();
        assert_eq!(id.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(id.to_string(), "origins:human");
    }

    #[test]
    fn paths_may_contain_slashes() {
        let id = Identifier::try_parse("mymod:powers/water_breathing").unwrap();
        assert_eq!(id.path(), "powers/water_breathing");
    }

    #[test]
    fn malformed_identifiers_rejected() {
        assert!(Identifier::try_parse("").is_none());
        assert!(Identifier::try_parse("Origins:Human").is_none());
        assert!(Identifier::try_parse("origins:").is_none());
        assert!(Identifier::try_parse(":human").is_none());
        assert!(Identifier::try_parse("a:b:c").is_none());
        assert!(Identifier::try_parse("ns/x:path").is_none());
    }

    #[test]
    fn serde_uses_string_form() {
        let id = Identifier::new("origins", "merling").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"origins:merling\"");
        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Identifier>("\"BAD ID\"").is_err());
    }
}
