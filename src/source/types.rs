//! Type references as they appear in source units.
//!
//! A type string such as `*models.User`, `[]string` or `...int` is parsed into a
//! [`TypeRef`]. The package prefix is resolved against the unit's import list so
//! the resolver can later find the directory that declares the named record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Package identity used to locate record declarations across units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Import {
    /// Local name the package is referred to by (`models` in `models.User`)
    pub alias: String,
    /// Full import path (`example.com/shop/models`)
    pub path: String,
    /// Directory holding the package's source units, when it belongs to the project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Import {
    pub fn new(alias: impl Into<String>, path: impl Into<String>, dir: Option<PathBuf>) -> Self {
        Import {
            alias: alias.into(),
            path: path.into(),
            dir,
        }
    }

    /// Alias implied by an import path: its last segment.
    pub fn default_alias(path: &str) -> &str {
        path.rsplit('/').next().unwrap_or(path)
    }
}

/// A parsed reference to a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Bare type name without package prefix or modifiers
    pub qualifier: String,
    /// Package alias as written (`context` in `context.Context`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default)]
    pub pointer: bool,
    #[serde(default)]
    pub array: bool,
    #[serde(default)]
    pub variadic: bool,
    /// Resolved import, if the package is known or the type was fixed up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<Import>,
}

impl TypeRef {
    /// Parse a type string, resolving its package alias against `imports`.
    ///
    /// `context` is always known, even when the unit does not list it.
    pub fn parse(raw: &str, imports: &[Import]) -> Self {
        let compact: String = raw.split_whitespace().collect();
        let mut rest = compact.as_str();
        let mut variadic = false;
        let mut array = false;
        let mut pointer = false;

        if let Some(stripped) = rest.strip_prefix("...") {
            variadic = true;
            rest = stripped;
        }
        loop {
            if let Some(stripped) = rest.strip_prefix("[]") {
                array = true;
                rest = stripped;
            } else if let Some(stripped) = rest.strip_prefix('*') {
                pointer = true;
                rest = stripped;
            } else {
                break;
            }
        }
        let (package, qualifier) = match rest.rsplit_once('.') {
            Some((pkg, name)) => (Some(pkg.to_string()), name.to_string()),
            None => (None, rest.to_string()),
        };

        let import = package.as_deref().and_then(|pkg| {
            imports
                .iter()
                .find(|i| i.alias == pkg)
                .cloned()
                .or_else(|| (pkg == "context").then(|| Import::new("context", "context", None)))
        });

        TypeRef {
            qualifier,
            package,
            pointer,
            array,
            variadic,
            import,
        }
    }

    /// Whether the bare type name is exported (starts with an uppercase letter).
    pub fn is_exported(&self) -> bool {
        is_exported(&self.qualifier)
    }

    pub fn is_context(&self) -> bool {
        self.package.as_deref() == Some("context") && self.qualifier == "Context"
    }

    pub fn is_error(&self) -> bool {
        self.package.is_none()
            && self.qualifier == "error"
            && !self.pointer
            && !self.array
            && !self.variadic
    }

    /// `[]byte`, which maps to a single bytes value rather than a repeated field.
    pub fn is_byte_slice(&self) -> bool {
        self.array && self.package.is_none() && self.qualifier == "byte"
    }

    /// Import path this type belongs to, if known.
    pub fn import_path(&self) -> Option<&str> {
        self.import.as_ref().map(|i| i.path.as_str())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variadic {
            f.write_str("...")?;
        }
        if self.array {
            f.write_str("[]")?;
        }
        if self.pointer {
            f.write_str("*")?;
        }
        if let Some(pkg) = &self.package {
            write!(f, "{pkg}.")?;
        }
        f.write_str(&self.qualifier)
    }
}

/// Exported names start with an uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
