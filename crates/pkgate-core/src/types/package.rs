//! Package name type.
//!
//! Wraps an npm package name and knows how to place it in registry URLs.

use crate::error::{GatewayError, GatewayResult};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters escaped when a name is placed in a URL path segment.
/// Matches JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// An npm package name, either scoped (`@scope/pkg`) or unscoped (`pkg`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a package name, rejecting values that cannot form a registry URL
    pub fn new(name: impl Into<String>) -> GatewayResult<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(GatewayError::InvalidPackageName {
                name,
                reason: "name is empty".to_string(),
            });
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(GatewayError::InvalidPackageName {
                name,
                reason: "name contains whitespace or control characters".to_string(),
            });
        }

        if let Some(rest) = name.strip_prefix('@') {
            match rest.split_once('/') {
                Some((scope, pkg)) if !scope.is_empty() && !pkg.is_empty() => {}
                _ => {
                    return Err(GatewayError::InvalidPackageName {
                        name,
                        reason: "scoped names must look like @scope/name".to_string(),
                    });
                }
            }
        }

        Ok(Self(name))
    }

    /// The name exactly as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a scoped (`@scope/pkg`) name
    pub fn is_scoped(&self) -> bool {
        self.0.starts_with('@')
    }

    /// The `@scope` part of a scoped name
    pub fn scope(&self) -> Option<&str> {
        if self.is_scoped() {
            self.0.split_once('/').map(|(scope, _)| scope)
        } else {
            None
        }
    }

    /// Name with the scope stripped, used in public tarball filenames
    pub fn unscoped(&self) -> &str {
        if self.is_scoped() {
            self.0.split('/').nth(1).unwrap_or(&self.0)
        } else {
            &self.0
        }
    }

    /// Percent-encode the name for a metadata URL path.
    ///
    /// `@scope/pkg` becomes `@scope%2Fpkg`: the leading `@` stays literal and
    /// only the remainder is encoded. Unscoped names are encoded wholesale.
    pub fn encoded(&self) -> String {
        match self.0.strip_prefix('@') {
            Some(rest) => format!("@{}", utf8_percent_encode(rest, URI_COMPONENT)),
            None => utf8_percent_encode(&self.0, URI_COMPONENT).to_string(),
        }
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PackageName {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageName {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(name: PackageName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unscoped_name() {
        let name: PackageName = "react".parse().unwrap();
        assert!(!name.is_scoped());
        assert_eq!(name.scope(), None);
        assert_eq!(name.unscoped(), "react");
        assert_eq!(name.encoded(), "react");
    }

    #[test]
    fn test_scoped_name() {
        let name: PackageName = "@babel/core".parse().unwrap();
        assert!(name.is_scoped());
        assert_eq!(name.scope(), Some("@babel"));
        assert_eq!(name.unscoped(), "core");
        assert_eq!(name.encoded(), "@babel%2Fcore");
    }

    #[test]
    fn test_unscoped_name_is_encoded_wholesale() {
        let name = PackageName::new("odd+name/x").unwrap();
        assert_eq!(name.encoded(), "odd%2Bname%2Fx");
    }

    #[test]
    fn test_uri_component_marks_stay_literal() {
        let name = PackageName::new("a.b_c-d~e!f*g'h(i)").unwrap();
        assert_eq!(name.encoded(), "a.b_c-d~e!f*g'h(i)");
    }

    #[test]
    fn test_invalid_names() {
        assert!(PackageName::new("").is_err());
        assert!(PackageName::new("has space").is_err());
        assert!(PackageName::new("@scope").is_err());
        assert!(PackageName::new("@/pkg").is_err());
        assert!(PackageName::new("@scope/").is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let name = PackageName::new("@types/node").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"@types/node\"");

        let back: PackageName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
        assert!(serde_json::from_str::<PackageName>("\"\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_scoped_encoding_keeps_at_and_hides_slash(
            scope in "[a-z0-9][a-z0-9._-]{0,12}",
            pkg in "[a-z0-9][a-z0-9._-]{0,12}",
        ) {
            let name = PackageName::new(format!("@{}/{}", scope, pkg)).unwrap();
            let encoded = name.encoded();
            prop_assert!(encoded.starts_with('@'));
            prop_assert!(!encoded.contains('/'));
            prop_assert_eq!(encoded, format!("@{}%2F{}", scope, pkg));
        }

        #[test]
        fn prop_encoded_names_have_no_reserved_characters(raw in "[a-z0-9/?#%+&=.-]{1,20}") {
            let name = PackageName::new(raw).unwrap();
            let encoded = name.encoded();
            prop_assert!(!encoded.contains('/'));
            prop_assert!(!encoded.contains('?'));
            prop_assert!(!encoded.contains('#'));
        }
    }
}
