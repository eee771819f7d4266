//! Error types for route registration and path matching.
//!
//! Registration failures ([`RouteError`]) are returned to the caller and must
//! not be ignored: a failed `add` or `group` call leaves the published route
//! table untouched. Match failures ([`MatchError`]) never leave the router;
//! [`Router::dispatch`](crate::router::Router::dispatch) turns each of them
//! into a fixed HTTP response.

use std::fmt;

/// Error returned when a route or group cannot be registered.
#[derive(Debug, Clone)]
pub enum RouteError {
    /// The regular expression in a `{name: pattern}` segment failed to compile.
    PatternCompile {
        /// The offending segment, as written by the caller
        segment: String,
        /// Compiler diagnostic from the `regex` crate
        source: regex::Error,
    },
    /// The caller used the reserved `*` segment.
    ReservedToken {
        /// The full path that was rejected
        path: String,
    },
    /// A wildcard slot is already occupied by a differently named or
    /// differently constrained wildcard.
    ///
    /// Accepting the registration would silently rename the parameter seen by
    /// existing handlers, so it is refused instead.
    WildcardConflict {
        /// Template of the wildcard already in the tree
        existing: String,
        /// Template the caller asked for
        requested: String,
    },
    /// A segment opens `{` without closing it, or names no parameter.
    InvalidTemplate {
        /// The malformed segment
        segment: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::PatternCompile { segment, source } => {
                write!(f, "invalid wildcard pattern in '{segment}': {source}")
            }
            RouteError::ReservedToken { path } => {
                write!(
                    f,
                    "path '{path}' uses the reserved '*' segment; use '{{name}}' for wildcards \
                     or '^' for a catch-all"
                )
            }
            RouteError::WildcardConflict {
                existing,
                requested,
            } => {
                write!(
                    f,
                    "wildcard '{requested}' conflicts with '{existing}' already registered at the \
                     same position"
                )
            }
            RouteError::InvalidTemplate { segment } => {
                write!(f, "malformed path segment '{segment}'")
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::PatternCompile { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Outcome of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// No structural match for the path.
    NotFound,
    /// The path would match if its trailing slash were added or removed.
    RedirectSlash,
    /// The path matched, but nothing is registered for the request method.
    MethodNotImplemented,
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::NotFound => write!(f, "no route matches the path"),
            MatchError::RedirectSlash => {
                write!(f, "route exists with the opposite trailing slash")
            }
            MatchError::MethodNotImplemented => {
                write!(f, "route exists but not for this method")
            }
        }
    }
}

impl std::error::Error for MatchError {}
