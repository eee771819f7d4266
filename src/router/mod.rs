//! # Router Module
//!
//! Path matching, route groups and dispatch.
//!
//! ## Overview
//!
//! - `tree` holds a segment trie per group. Literal segments beat
//!   wildcards and wildcards beat a catch-all; lookup never backtracks.
//! - `group` owns prefixes and their plugin chains. Creating a group over
//!   routes that already exist moves them under the new group without
//!   changing what any request resolves to.
//! - [`Router`] is the thread-safe front end. Registration is serialized and
//!   publishes a new immutable route table; dispatch reads the current table
//!   without locking.
//!
//! ## Example
//!
//! ```rust
//! use chainroute::context::{Request, Response};
//! use chainroute::router::Router;
//! use http::Method;
//!
//! # fn main() -> Result<(), chainroute::RouteError> {
//! let router = Router::default();
//! let api = router.group("/api")?;
//! api.get("/users/{id: ^[0-9]+$}", |req: &mut Request, resp: &mut Response| {
//!     let id = req.param("id").unwrap_or_default().to_string();
//!     resp.body.push_str(&id);
//! })?;
//!
//! let mut req = Request::new(Method::GET, "/api/users/42");
//! let mut resp = Response::new();
//! router.dispatch(&mut req, &mut resp);
//! assert_eq!(resp.body, "42");
//! # Ok(())
//! # }
//! ```

mod core;
mod group;
mod tree;
#[cfg(test)]
mod tests;

pub use core::{EndpointRef, GroupRef, RouteInfo, RouteMatch, Router};
