use arc_swap::ArcSwap;
use http::{Method, StatusCode};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::group::Group;
use crate::config::RouterConfig;
use crate::context::{ParamVec, Request, Response};
use crate::error::{MatchError, RouteError};
use crate::middleware::{CompiledChain, Handler, Plugin};
use crate::path::{
    clean_path, flip_trailing_slash, join, join_segments, parse_group_template, parse_template,
    split,
};

/// Matches slower than this are logged at warn level.
const SLOW_MATCH: Duration = Duration::from_millis(1);

/// Result of a successful lookup.
///
/// Owns everything it needs, so it stays valid after later registrations
/// publish a new route table.
#[derive(Clone)]
pub struct RouteMatch {
    /// Method the endpoint was registered for
    pub method: Method,
    /// Absolute template of the endpoint, e.g. `/users/{id}`
    pub path: String,
    /// Absolute prefix of the innermost group; empty for the root
    pub group: String,
    /// Parameters bound along the way, outermost group first
    pub params: ParamVec,
    chain: CompiledChain,
}

impl RouteMatch {
    /// Last value bound to `name`, if any.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.as_str())
    }

    /// The full chain that would run: global, groups, local, handler.
    #[must_use]
    pub fn chain(&self) -> &CompiledChain {
        &self.chain
    }

    /// Bind the parameters into `req` and run the chain.
    pub fn run(self, req: &mut Request, resp: &mut Response) {
        req.set_params(self.params);
        self.chain.run(req, resp);
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("group", &self.group)
            .field("params", &self.params)
            .field("plugins", &self.chain.len())
            .finish()
    }
}

/// One registered endpoint, as listed by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    /// Absolute template path
    pub path: String,
    /// Absolute prefix of the owning group; empty for the root
    pub group: String,
    /// Plugins in the compiled chain, not counting the handler
    pub plugins: usize,
    /// Plugins registered on the endpoint itself
    pub local_plugins: usize,
}

/// Everything dispatch reads. Published as a whole.
#[derive(Clone)]
struct RouterState {
    root: Group,
    not_found: Option<Handler>,
}

/// Path router with composable plugin chains.
///
/// Registration methods take `&self`: they are serialized by an internal
/// mutex, applied to a private copy of the route table and published with a
/// single pointer swap. [`Router::dispatch`] reads whichever table is
/// current and never blocks on registration.
pub struct Router {
    config: RouterConfig,
    registration: Mutex<()>,
    published: ArcSwap<RouterState>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("routes", &self.routes().len())
            .finish()
    }
}

impl Router {
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        info!(
            strict = config.strict,
            redirect_fixed_path = config.redirect_fixed_path,
            "Router created"
        );
        Self {
            config,
            registration: Mutex::new(()),
            published: ArcSwap::from_pointee(RouterState {
                root: Group::root(),
                not_found: None,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Apply `f` to a copy of the current table and publish it if `f`
    /// succeeds. On error the published table is left as it was.
    ///
    /// Cold path: each call clones every group tree, so registering n routes
    /// costs O(n^2) overall. Dispatch only pays for an `ArcSwap` load.
    fn update<R>(
        &self,
        f: impl FnOnce(&mut RouterState) -> Result<R, RouteError>,
    ) -> Result<R, RouteError> {
        let _serialized = self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = RouterState::clone(&self.published.load());
        let out = f(&mut next)?;
        self.published.store(Arc::new(next));
        Ok(out)
    }

    /// Handle to the root group.
    #[must_use]
    pub fn root(&self) -> GroupRef<'_> {
        GroupRef {
            router: self,
            path: String::new(),
        }
    }

    /// Append a plugin to the global chain.
    pub fn use_plugin<P: Plugin + 'static>(&self, plugin: P) -> &Self {
        self.root().use_plugin(plugin);
        self
    }

    /// Find or create the group at `path`.
    pub fn group(&self, path: &str) -> Result<GroupRef<'_>, RouteError> {
        self.create_group(path)
    }

    /// Register `handler` for `method` at `path`.
    pub fn add<H>(&self, method: Method, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.register(method, path, Arc::new(handler))
    }

    pub fn get<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::GET, path, handler)
    }

    pub fn post<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::POST, path, handler)
    }

    pub fn put<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::PUT, path, handler)
    }

    pub fn patch<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::PATCH, path, handler)
    }

    pub fn delete<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::DELETE, path, handler)
    }

    pub fn head<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::HEAD, path, handler)
    }

    pub fn options<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'_>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::OPTIONS, path, handler)
    }

    /// Replace the handler run when nothing matches. The default answers
    /// 404 with `Not Found.`.
    pub fn not_found<H>(&self, handler: H)
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        match self.update(|state| {
            state.not_found = Some(handler);
            Ok(())
        }) {
            Ok(()) => debug!("Custom not-found handler installed"),
            Err(e) => error!(error = %e, "Failed to install not-found handler"),
        }
    }

    fn register(&self, method: Method, path: &str, handler: Handler) -> Result<EndpointRef<'_>, RouteError> {
        let template = parse_template(path).inspect_err(|e| {
            error!(method = %method, path = %path, error = %e, "Route registration rejected");
        })?;
        if !template.dropped.is_empty() {
            warn!(
                method = %method,
                path = %path,
                dropped = ?template.dropped,
                "Segments after catch-all ignored"
            );
        }

        let template_path = template.path();
        let segments = template.as_strs();
        let replaced = self
            .update(|state| state.root.add(method.clone(), &segments, &template_path, handler))
            .inspect_err(|e| {
                error!(method = %method, path = %template_path, error = %e, "Route registration rejected");
            })?;

        if replaced {
            info!(method = %method, path = %template_path, "Route handler replaced");
        } else {
            info!(method = %method, path = %template_path, "Route registered");
        }
        Ok(EndpointRef {
            router: self,
            method,
            path: template_path,
        })
    }

    fn create_group(&self, path: &str) -> Result<GroupRef<'_>, RouteError> {
        let template = parse_group_template(path).inspect_err(|e| {
            error!(path = %path, error = %e, "Group registration rejected");
        })?;
        let segments = template.as_strs();
        let group_path = join_segments(&segments);
        if segments.is_empty() {
            return Ok(self.root());
        }
        // An existing group may spell its wildcards differently; hand back
        // the registered spelling so relative routes line up with it.
        let registered = self
            .update(|state| {
                state.root.ensure_group(&segments)?;
                Ok(state
                    .root
                    .group_mut(&segments)
                    .map(|group| group.full_path().to_string()))
            })
            .inspect_err(|e| {
                error!(path = %group_path, error = %e, "Group registration rejected");
            })?;
        Ok(GroupRef {
            router: self,
            path: registered.unwrap_or(group_path),
        })
    }

    /// Look up `method` + `path` without running anything.
    ///
    /// `path` is matched as given; cleaning is up to the caller. A path that
    /// matches with no endpoint for `method` yields
    /// [`MatchError::MethodNotImplemented`].
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch, MatchError> {
        let state = self.published.load();
        Self::lookup(&state, method, path)
    }

    fn lookup(state: &RouterState, method: &Method, path: &str) -> Result<RouteMatch, MatchError> {
        debug!(method = %method, path = %path, "Route match attempt");
        let started = Instant::now();
        let segments = split(path);
        let outcome = state
            .root
            .resolve(&segments)
            .and_then(|(group, routes, params)| {
                let endpoint = routes.get(method).ok_or(MatchError::MethodNotImplemented)?;
                Ok(RouteMatch {
                    method: endpoint.method.clone(),
                    path: endpoint.path.clone(),
                    group: group.full_path().to_string(),
                    params,
                    chain: endpoint.compiled().clone(),
                })
            });
        let elapsed = started.elapsed();

        match &outcome {
            Ok(found) if elapsed > SLOW_MATCH => warn!(
                method = %method,
                path = %path,
                route_pattern = %found.path,
                path_params = ?found.params,
                duration_us = elapsed.as_micros(),
                "Slow route matching detected"
            ),
            Ok(found) => debug!(
                method = %method,
                path = %path,
                route_pattern = %found.path,
                path_params = ?found.params,
                duration_us = elapsed.as_micros(),
                "Route matched"
            ),
            Err(e) => debug!(
                method = %method,
                path = %path,
                outcome = %e,
                duration_us = elapsed.as_micros(),
                "No route matched"
            ),
        }
        outcome
    }

    /// Serve one request.
    ///
    /// Non-canonical paths are redirected to their cleaned form (or matched
    /// in cleaned form when `redirect_fixed_path` is off). A match binds the
    /// parameters into `req` and runs global plugins, group plugins from
    /// outermost to innermost, endpoint plugins, then the handler. Failures
    /// map to the not-found handler, a trailing-slash redirect (non-strict
    /// only) or 501.
    pub fn dispatch(&self, req: &mut Request, resp: &mut Response) {
        let cleaned = clean_path(&req.path);
        if cleaned != req.path {
            if self.config.redirect_fixed_path {
                let location = with_query(&cleaned, req.query.as_deref());
                debug!(from = %req.path, to = %location, "Redirecting to cleaned path");
                resp.redirect(&location);
                return;
            }
            req.path = cleaned;
        }

        let state = self.published.load_full();
        match Self::lookup(&state, &req.method, &req.path) {
            Ok(found) => found.run(req, resp),
            Err(MatchError::RedirectSlash) if !self.config.strict => {
                match flip_trailing_slash(&req.path) {
                    Some(flipped) => {
                        let location = with_query(&flipped, req.query.as_deref());
                        debug!(from = %req.path, to = %location, "Trailing slash redirect");
                        resp.redirect(&location);
                    }
                    None => Self::respond_not_found(&state, req, resp),
                }
            }
            Err(MatchError::MethodNotImplemented) => {
                warn!(method = %req.method, path = %req.path, "Method not implemented for path");
                resp.text(StatusCode::NOT_IMPLEMENTED, "Not Implemented.");
            }
            Err(MatchError::NotFound | MatchError::RedirectSlash) => {
                warn!(method = %req.method, path = %req.path, "No route matched");
                Self::respond_not_found(&state, req, resp);
            }
        }
    }

    fn respond_not_found(state: &RouterState, req: &mut Request, resp: &mut Response) {
        match &state.not_found {
            Some(handler) => handler(req, resp),
            None => resp.text(StatusCode::NOT_FOUND, "Not Found."),
        }
    }

    /// Every endpoint, breadth first within each group.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        let state = self.published.load();
        let mut endpoints = Vec::new();
        state.root.collect(&mut endpoints);
        endpoints
            .into_iter()
            .map(|(group, endpoint)| RouteInfo {
                method: endpoint.method.clone(),
                path: endpoint.path.clone(),
                group: group.full_path().to_string(),
                plugins: endpoint.compiled().len(),
                local_plugins: endpoint.local_len(),
            })
            .collect()
    }

    /// Print all registered routes to stdout.
    pub fn dump_routes(&self) {
        let routes = self.routes();
        println!(
            "[routes] count={} strict={}",
            routes.len(),
            self.config.strict
        );
        for route in routes {
            let group = if route.group.is_empty() { "/" } else { route.group.as_str() };
            println!(
                "[route] {} {} group={} plugins={}",
                route.method, route.path, group, route.plugins
            );
        }
    }
}

fn with_query(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

/// Handle to a registered group.
///
/// Paths given to a group handle are relative to the group's prefix.
#[derive(Clone)]
pub struct GroupRef<'r> {
    router: &'r Router,
    /// Absolute template; empty for the root
    path: String,
}

impl fmt::Debug for GroupRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRef").field("path", &self.full_path()).finish()
    }
}

impl<'r> GroupRef<'r> {
    /// Absolute prefix of the group, `/` for the root.
    #[must_use]
    pub fn full_path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }

    /// Append a plugin to this group's chain. Every endpoint beneath the
    /// group picks it up, including ones registered earlier.
    pub fn use_plugin<P: Plugin + 'static>(&self, plugin: P) -> &Self {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        let segments = split(&self.path);
        let attached = self.router.update(|state| {
            Ok(match state.root.group_mut(&segments) {
                Some(group) => {
                    group.use_plugin(plugin);
                    Some(group.compiled().len())
                }
                None => None,
            })
        });
        match attached {
            Ok(Some(chain_len)) => {
                debug!(group = %self.full_path(), chain_len, "Plugin attached to group");
            }
            _ => error!(group = %self.full_path(), "Group not found while attaching plugin"),
        }
        self
    }

    /// Find or create a group nested under this one.
    pub fn group(&self, path: &str) -> Result<GroupRef<'r>, RouteError> {
        self.router.create_group(&join(&self.path, path))
    }

    /// Register `handler` at `path` relative to this group.
    pub fn add<H>(&self, method: Method, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.router
            .register(method, &join(&self.path, path), Arc::new(handler))
    }

    pub fn get<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::GET, path, handler)
    }

    pub fn post<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::POST, path, handler)
    }

    pub fn put<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::PUT, path, handler)
    }

    pub fn patch<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::PATCH, path, handler)
    }

    pub fn delete<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::DELETE, path, handler)
    }

    pub fn head<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::HEAD, path, handler)
    }

    pub fn options<H>(&self, path: &str, handler: H) -> Result<EndpointRef<'r>, RouteError>
    where
        H: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.add(Method::OPTIONS, path, handler)
    }
}

/// Handle to a registered endpoint.
#[derive(Debug, Clone)]
pub struct EndpointRef<'r> {
    router: &'r Router,
    method: Method,
    path: String,
}

impl EndpointRef<'_> {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute template path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append a plugin to this endpoint's own chain, after every group
    /// plugin.
    pub fn use_plugin<P: Plugin + 'static>(self, plugin: P) -> Self {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        let path = self.path.clone();
        let segments = split(&path);
        let method = &self.method;
        let attached = self
            .router
            .update(|state| Ok(state.root.use_endpoint_plugin(method, &segments, plugin)));
        match attached {
            Ok(true) => debug!(method = %self.method, path = %self.path, "Plugin attached to endpoint"),
            _ => error!(method = %self.method, path = %self.path, "Endpoint not found while attaching plugin"),
        }
        self
    }
}
