//! # Middleware Module
//!
//! Plugins are the middleware of this router: callables of the form
//! `(request, response, next)` that run in a fixed order around the terminal
//! handler. The order for any route is
//!
//! 1. global plugins (registered on the router),
//! 2. group plugins, outermost group first,
//! 3. plugins registered on the endpoint itself,
//! 4. the handler.
//!
//! [`PluginChain`] is the builder each router, group and endpoint owns;
//! [`CompiledChain`] is the frozen concatenation that requests actually run.

mod core;
mod tracing;

pub use core::{plugin_fn, CompiledChain, Handler, Next, Plugin, PluginChain};
pub use tracing::TracingPlugin;
