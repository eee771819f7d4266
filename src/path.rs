//! Path helpers shared by registration and dispatch.
//!
//! Paths are `/`-delimited. A leading slash is stripped before splitting, so
//! `"/"` is the single empty segment `[""]` and a trailing slash shows up as a
//! final empty segment (`"/a/b/"` → `["a", "b", ""]`). The empty path `""`
//! has no segments and addresses the root of a tree; it only occurs for
//! paths that have been trimmed relative to a group.
//!
//! Template syntax:
//!
//! | Segment          | Meaning                                         |
//! |------------------|-------------------------------------------------|
//! | `users`          | literal, matched verbatim                       |
//! | `{id}`           | wildcard binding `id` to one segment            |
//! | `{id: ^[0-9]+$}` | wildcard constrained by an anchored regex       |
//! | `^`              | catch-all, absorbs the rest of the path         |
//! | `*`              | reserved, rejected at registration              |

use smallvec::SmallVec;

use crate::error::RouteError;

/// Catch-all segment.
pub const CATCH_ALL: &str = "^";

/// Internal wildcard marker. Callers may not register it.
pub const RESERVED_WILDCARD: &str = "*";

/// Borrowed segments of a path; most paths fit inline.
pub type Segments<'a> = SmallVec<[&'a str; 8]>;

/// Parsed form of a single template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind<'a> {
    Literal(&'a str),
    Wildcard {
        name: &'a str,
        pattern: Option<&'a str>,
    },
    CatchAll,
}

impl<'a> SegmentKind<'a> {
    /// Classify a registration segment.
    ///
    /// `*` is not accepted here; [`parse_template`] rejects it for the whole
    /// path before segments are classified.
    pub fn parse(segment: &'a str) -> Result<Self, RouteError> {
        if segment == CATCH_ALL {
            return Ok(SegmentKind::CatchAll);
        }
        if segment == RESERVED_WILDCARD {
            return Err(RouteError::ReservedToken {
                path: segment.to_string(),
            });
        }
        if !segment.starts_with('{') {
            return Ok(SegmentKind::Literal(segment));
        }
        let inner = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| RouteError::InvalidTemplate {
                segment: segment.to_string(),
            })?;
        let (name, pattern) = match inner.split_once(':') {
            Some((name, pattern)) => (name.trim(), Some(pattern.trim())),
            None => (inner.trim(), None),
        };
        if name.is_empty() || pattern.is_some_and(str::is_empty) {
            return Err(RouteError::InvalidTemplate {
                segment: segment.to_string(),
            });
        }
        Ok(SegmentKind::Wildcard { name, pattern })
    }
}

/// True if `segment` denotes a wildcard slot in an explicit (template) walk.
#[inline]
#[must_use]
pub fn is_wildcard_token(segment: &str) -> bool {
    segment == RESERVED_WILDCARD || (segment.starts_with('{') && segment.ends_with('}'))
}

/// Split a path into segments (see module docs for the conventions).
#[must_use]
pub fn split(path: &str) -> Segments<'_> {
    if path.is_empty() {
        return Segments::new();
    }
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

/// Rebuild a path from segments; the inverse of [`split`].
#[must_use]
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment.as_ref());
    }
    out
}

/// Canonical form of a request path.
///
/// Collapses repeated separators, resolves `.` and `..`, guarantees a
/// leading slash, and keeps a trailing slash when the input had one.
#[must_use]
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    let trailing = path.len() > 1 && path.ends_with('/');
    let mut kept: Segments<'_> = Segments::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                kept.pop();
            }
            s => kept.push(s),
        }
    }
    if kept.is_empty() {
        return "/".to_string();
    }
    let mut cleaned = join_segments(&kept);
    if trailing {
        cleaned.push('/');
    }
    cleaned
}

/// The same path with its trailing slash toggled, or `None` for the root.
#[must_use]
pub fn flip_trailing_slash(path: &str) -> Option<String> {
    if path == "/" || path.is_empty() {
        return None;
    }
    match path.strip_suffix('/') {
        Some(stripped) => Some(stripped.to_string()),
        None => Some(format!("{path}/")),
    }
}

/// Append `relative` to a group's absolute path.
#[must_use]
pub fn join(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return if base.is_empty() {
            "/".to_string()
        } else {
            base.to_string()
        };
    }
    if relative.starts_with('/') {
        format!("{base}{relative}")
    } else {
        format!("{base}/{relative}")
    }
}

/// A registration path reduced to the segments the tree stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<String>,
    /// Segments that followed a catch-all and were discarded.
    pub dropped: Vec<String>,
}

impl Template {
    /// Absolute template path, e.g. `/users/{id}`.
    #[must_use]
    pub fn path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        join_segments(&self.segments)
    }

    #[must_use]
    pub fn as_strs(&self) -> Segments<'_> {
        self.segments.iter().map(String::as_str).collect()
    }
}

/// Clean and validate a route path.
///
/// Rejects the reserved `*` segment and malformed braces, and truncates
/// everything after a catch-all.
pub fn parse_template(path: &str) -> Result<Template, RouteError> {
    let cleaned = clean_path(path);
    let mut segments = Vec::new();
    let mut dropped = Vec::new();
    let mut terminated = false;
    for segment in split(&cleaned) {
        if terminated {
            dropped.push(segment.to_string());
            continue;
        }
        match SegmentKind::parse(segment) {
            Ok(SegmentKind::CatchAll) => terminated = true,
            Ok(_) => {}
            Err(RouteError::ReservedToken { .. }) => {
                return Err(RouteError::ReservedToken {
                    path: path.to_string(),
                })
            }
            Err(e) => return Err(e),
        }
        segments.push(segment.to_string());
    }
    Ok(Template { segments, dropped })
}

/// Clean and validate a group prefix.
///
/// Same as [`parse_template`], but the catch-all itself is dropped along with
/// what follows it, and a single trailing slash is removed. The root group
/// path comes back with no segments.
pub fn parse_group_template(path: &str) -> Result<Template, RouteError> {
    let mut template = parse_template(path)?;
    if template.segments.last().map(String::as_str) == Some(CATCH_ALL) {
        template.segments.pop();
    }
    if template.segments.last().is_some_and(String::is_empty) {
        template.segments.pop();
    }
    Ok(template)
}
