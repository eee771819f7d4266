//! TOML route tables.
//!
//! A route file describes a router without any code, which is what the
//! `chainroute` binary inspects:
//!
//! ```toml
//! [router]
//! strict = false
//!
//! [[routes]]
//! method = "GET"
//! path = "/api/users/{id: ^[0-9]+$}"
//! name = "get_user"
//!
//! [[groups]]
//! path = "/api"
//! tag = "api"
//! ```
//!
//! Every route is bound to an echo handler that answers with its name and
//! the bound parameters as JSON. A group `tag` installs a plugin that appends
//! the tag to the `x-chainroute-trace` response header, which makes chain
//! order visible from outside. Routes are registered before groups, so
//! groups absorb the routes beneath them.

use anyhow::{Context, Result};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderName, Method};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::config::RouterConfig;
use crate::context::{Request, Response};
use crate::middleware::{plugin_fn, Plugin};
use crate::router::Router;

/// Response header that group plugins append their tag to.
pub const TRACE_HEADER: HeaderName = HeaderName::from_static("x-chainroute-trace");

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutesFile {
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    pub path: String,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RouteEntry {
    /// `name`, or `"METHOD path"` when unnamed.
    pub fn handler_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method.to_uppercase(), self.path))
    }

    pub fn method(&self) -> Result<Method> {
        Method::from_bytes(self.method.to_uppercase().as_bytes())
            .with_context(|| format!("invalid HTTP method '{}'", self.method))
    }
}

impl RoutesFile {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse route table")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read route table {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("in {}", path.display()))
    }

    /// Build a router using the file's own `[router]` settings.
    pub fn build(&self) -> Result<Router> {
        self.build_with(self.router)
    }

    /// Build a router with `config` in place of the file's settings.
    pub fn build_with(&self, config: RouterConfig) -> Result<Router> {
        let router = Router::new(config);
        for route in &self.routes {
            let method = route.method()?;
            router
                .add(method, &route.path, echo_handler(route.handler_name()))
                .with_context(|| format!("Failed to register {} {}", route.method, route.path))?;
        }
        for group in &self.groups {
            let handle = router
                .group(&group.path)
                .with_context(|| format!("Failed to register group {}", group.path))?;
            if let Some(tag) = &group.tag {
                handle.use_plugin(tag_plugin(tag)?);
            }
        }
        info!(
            routes = self.routes.len(),
            groups = self.groups.len(),
            "Route table built"
        );
        Ok(router)
    }
}

/// Handler answering with its name and the request's parameters.
pub fn echo_handler(name: String) -> impl Fn(&mut Request, &mut Response) + Send + Sync + 'static {
    move |req: &mut Request, resp: &mut Response| {
        let mut params = serde_json::Map::new();
        for (key, value) in req.params() {
            params.insert(key.to_string(), serde_json::Value::String(value.clone()));
        }
        let body = serde_json::json!({ "handler": name, "params": params });
        resp.body = body.to_string();
        resp.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
}

fn tag_plugin(tag: &str) -> Result<impl Plugin> {
    let value = HeaderValue::from_str(tag).with_context(|| format!("invalid group tag '{tag}'"))?;
    Ok(plugin_fn(move |req, resp, next| {
        resp.headers.append(TRACE_HEADER, value.clone());
        next.run(req, resp);
    }))
}
