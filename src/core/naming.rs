//! core::naming
//!
//! Identifier tokens and display-name resolution.
//!
//! # Tokens
//!
//! A token is a string safe to use as a single parsable name, following the
//! netCDF object-name convention restricted to ASCII: it starts with a
//! letter or digit, and continues with letters, digits, `_`, `.`, `+`, `-`
//! or `@`.
//!
//! # Name Resolution
//!
//! A record's display name is the first usable candidate from a
//! prioritised list (standard name, long name, variable name, ...),
//! falling back to a default. See [`resolve_name`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The fall-back name used when no candidate is available.
pub const DEFAULT_NAME: &str = "unknown";

/// The attribute key consulted as a cube naming fallback.
pub const STASH_ATTRIBUTE: &str = "STASH";

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.+\-@]*$").expect("token regex is valid")
});

/// Check whether a name is a valid token.
///
/// # Example
///
/// ```
/// use dimmeta::core::naming::is_token;
///
/// assert!(is_token("air_temperature"));
/// assert!(is_token("m01s00i004"));
/// assert!(is_token("x.y+z-w@v"));
/// assert!(!is_token("_private"));
/// assert!(!is_token("has space"));
/// assert!(!is_token(""));
/// ```
pub fn is_token(name: &str) -> bool {
    TOKEN_PATTERN.is_match(name)
}

/// Return the name if it is a valid token, otherwise `None`.
///
/// `None` input yields `None`.
///
/// # Example
///
/// ```
/// use dimmeta::core::naming::token;
///
/// assert_eq!(token(Some("ok_name")), Some("ok_name"));
/// assert_eq!(token(Some("bad name")), None);
/// assert_eq!(token(None), None);
/// ```
pub fn token(name: Option<&str>) -> Option<&str> {
    name.filter(|n| is_token(n))
}

/// Naming defaults applied during name resolution.
///
/// The built-in policy uses [`DEFAULT_NAME`] and [`STASH_ATTRIBUTE`];
/// alternative policies are normally loaded through
/// [`Config`](crate::core::config::Config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPolicy {
    /// Name returned when no candidate is usable
    pub default_name: String,
    /// Attribute key used as the cube naming fallback
    pub stash_attribute: String,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_NAME.to_string(),
            stash_attribute: STASH_ATTRIBUTE.to_string(),
        }
    }
}

/// Resolve a display name from prioritised candidates.
///
/// Candidates are tried in order; the first that is present and non-empty
/// (and, when `require_token` is set, a valid token) wins. Otherwise the
/// default is checked the same way. Without `require_token` the default is
/// returned as-is, even if empty.
///
/// Returns `None` only when `require_token` is set and nothing qualifies.
///
/// # Example
///
/// ```
/// use dimmeta::core::naming::resolve_name;
///
/// let candidates = [None, Some("bad name"), Some("ok_name")];
/// assert_eq!(resolve_name(candidates, "unknown", false), Some("bad name".to_string()));
/// assert_eq!(resolve_name(candidates, "unknown", true), Some("ok_name".to_string()));
/// assert_eq!(resolve_name([None::<&str>], "", true), None);
/// ```
pub fn resolve_name<'a, I>(candidates: I, default: &str, require_token: bool) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let check = |name: &'a str| -> Option<&'a str> {
        if require_token {
            token(Some(name))
        } else {
            Some(name)
        }
    };

    for candidate in candidates.into_iter().flatten() {
        if let Some(name) = check(candidate).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
    }

    if require_token {
        token(Some(default)).map(str::to_string)
    } else {
        Some(default.to_string())
    }
}
