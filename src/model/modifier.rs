//! Declaration modifiers.

use serde::Serialize;
use std::fmt;

/// A modifier attached to a definition.
///
/// Known keywords and decorators are normalised into dedicated variants;
/// anything else (custom annotations, uncommon keywords) is carried verbatim
/// in [`Modifier::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum Modifier {
    Public,
    Protected,
    PackagePrivate,
    Private,
    Static,
    ClassMethod,
    Abstract,
    Default,
    Final,
    Override,
    Custom(String),
}

impl Modifier {
    /// Look up a modifier by its keyword, falling back to [`Modifier::Custom`].
    pub fn named(text: &str) -> Self {
        match text.trim() {
            "abstract" => Modifier::Abstract,
            "classmethod" => Modifier::ClassMethod,
            "default" => Modifier::Default,
            "final" => Modifier::Final,
            "override" => Modifier::Override,
            "package-private" => Modifier::PackagePrivate,
            "private" => Modifier::Private,
            "protected" => Modifier::Protected,
            "public" => Modifier::Public,
            "static" => Modifier::Static,
            other => Modifier::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::PackagePrivate => "package-private",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::ClassMethod => "classmethod",
            Modifier::Abstract => "abstract",
            Modifier::Default => "default",
            Modifier::Final => "final",
            Modifier::Override => "override",
            Modifier::Custom(text) => text,
        }
    }

    /// Whether this modifier states an access level.
    pub fn is_access(&self) -> bool {
        matches!(
            self,
            Modifier::Public | Modifier::Protected | Modifier::PackagePrivate | Modifier::Private
        )
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Modifier> for String {
    fn from(modifier: Modifier) -> Self {
        modifier.as_str().to_string()
    }
}
