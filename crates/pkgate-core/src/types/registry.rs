//! Registry classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which upstream registry owns a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryClass {
    /// Internal registry, selected by private scope tokens
    Private,
    /// Internet-facing registry
    Public,
}

impl RegistryClass {
    /// Lowercase label used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryClass::Private => "private",
            RegistryClass::Public => "public",
        }
    }
}

impl fmt::Display for RegistryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
