use http::{Extensions, HeaderMap, Method};
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 wildcards (e.g. /users/{id}/posts/{post_id}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Names are `Arc<str>` because they come from the route tree, which is
/// built once; cloning one is an atomic increment. Values are per-request.
/// Order follows the path, left to right.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// An inbound request as seen by plugins and handlers.
#[derive(Debug, Default)]
pub struct Request {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Raw query string (without the leading `?`)
    pub query: Option<String>,
    /// Request headers
    pub headers: HeaderMap,
    /// Wildcard bindings from the matched route
    params: ParamVec,
    /// Typed values shared between plugins of one request
    pub extensions: Extensions,
}

impl Request {
    /// Build a request from a method and a request target such as
    /// `/users/42?verbose=1`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            ..Self::default()
        }
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: if duplicate parameter names exist
    /// at different path depths (e.g. `/org/{id}/user/{id}`), returns the last
    /// occurrence.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// All parameters in path order
    #[inline]
    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Replace the parameter set. Called by the router before the chain runs.
    pub fn set_params(&mut self, params: ParamVec) {
        self.params = params;
    }

    /// Path plus query string, as it would appear in a request line.
    #[must_use]
    pub fn target(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}
