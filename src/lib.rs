//! # chainroute
//!
//! **chainroute** is a path router whose routes, groups and plugins compose
//! into one ordered chain per endpoint.
//!
//! ## Overview
//!
//! - Routes are templates over `/`-delimited segments: literals, wildcards
//!   (`{id}`), regex-constrained wildcards (`{id: ^[0-9]+$}`) and a trailing
//!   catch-all (`^`).
//! - Groups own a path prefix and a plugin chain. Groups nest, and a group
//!   created over routes that already exist adopts them.
//! - Every request runs global plugins, then group plugins from the
//!   outermost group inwards, then the endpoint's own plugins, then the
//!   handler. Any plugin may end the request early by not calling `next`.
//!
//! ## Modules
//!
//! - **[`router`]** - the [`Router`] front end, group and endpoint handles
//! - **[`middleware`]** - the [`Plugin`] trait, chains and a tracing plugin
//! - **[`context`]** - the request and response handles passed through chains
//! - **[`path`]** - path cleaning and template parsing
//! - **[`config`]** - [`RouterConfig`]
//! - **[`routes_file`]** and **[`cli`]** - TOML route tables and the
//!   `chainroute` inspection binary
//! - **[`logging`]** - subscriber setup for applications
//!
//! ## Example
//!
//! ```rust
//! use chainroute::middleware::plugin_fn;
//! use chainroute::{Request, Response, Router};
//! use http::{Method, StatusCode};
//!
//! # fn main() -> Result<(), chainroute::RouteError> {
//! let router = Router::default();
//!
//! let admin = router.group("/admin")?;
//! admin.use_plugin(plugin_fn(|req, resp, next| {
//!     if req.headers.contains_key("x-admin-token") {
//!         next.run(req, resp);
//!     } else {
//!         resp.text(StatusCode::UNAUTHORIZED, "Unauthorized.");
//!     }
//! }));
//! admin.get("/stats", |_req: &mut Request, resp: &mut Response| {
//!     resp.body.push_str("ok");
//! })?;
//!
//! let mut req = Request::new(Method::GET, "/admin/stats");
//! let mut resp = Response::new();
//! router.dispatch(&mut req, &mut resp);
//! assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! A [`Router`] is `Send + Sync`. Registration may happen while requests are
//! being served: each registration call builds a new route table off to the
//! side and publishes it atomically, so a request sees either the table from
//! before the call or the one after, never a partial restructuring.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod path;
pub mod router;
pub mod routes_file;

pub use config::RouterConfig;
pub use context::{Request, Response};
pub use error::{MatchError, RouteError};
pub use middleware::{plugin_fn, Handler, Next, Plugin, PluginChain, TracingPlugin};
pub use router::{EndpointRef, GroupRef, RouteInfo, RouteMatch, Router};
