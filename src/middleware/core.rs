use std::fmt;
use std::sync::Arc;

use crate::context::{Request, Response};

/// Terminal request handler registered at a method + path.
pub type Handler = Arc<dyn Fn(&mut Request, &mut Response) + Send + Sync>;

/// A step in a plugin chain.
///
/// A plugin may work before and/or after calling `next.run(req, resp)`, or
/// drop `next` to end the request without reaching the handler. Plugins are
/// shared between every compiled chain they appear in and between threads, so
/// any state they hold must be internally synchronized.
pub trait Plugin: Send + Sync {
    fn call(&self, req: &mut Request, resp: &mut Response, next: Next<'_>);
}

impl<F> Plugin for F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync,
{
    fn call(&self, req: &mut Request, resp: &mut Response, next: Next<'_>) {
        self(req, resp, next)
    }
}

/// Pins a closure to the plugin signature so its argument types are inferred.
///
/// ```
/// use chainroute::middleware::plugin_fn;
///
/// let log = plugin_fn(|req, resp, next| {
///     next.run(req, resp);
///     println!("{} -> {}", req.path, resp.status);
/// });
/// # let _ = log;
/// ```
pub fn plugin_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, &mut Response, Next<'_>) + Send + Sync + 'static,
{
    f
}

/// Continuation handed to each plugin.
///
/// Holds the steps after the current one plus the terminal handler. `run`
/// consumes it, so a plugin can advance the chain at most once.
#[must_use = "dropping `next` ends the chain without reaching the handler"]
pub struct Next<'a> {
    steps: &'a [Arc<dyn Plugin>],
    terminal: Option<&'a Handler>,
}

impl<'a> Next<'a> {
    fn new(steps: &'a [Arc<dyn Plugin>], terminal: Option<&'a Handler>) -> Self {
        Self { steps, terminal }
    }

    /// Invoke the next step, or the terminal handler once the steps run out.
    pub fn run(self, req: &mut Request, resp: &mut Response) {
        match self.steps.split_first() {
            Some((head, rest)) => head.call(req, resp, Next::new(rest, self.terminal)),
            None => {
                if let Some(handler) = self.terminal {
                    handler(req, resp);
                }
            }
        }
    }

    /// Plugins still ahead of this point, not counting the handler.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

/// Mutable, ordered list of plugins owned by a group or endpoint.
///
/// This is the registration-side value. Serving never reads it directly: it
/// is copied into a [`CompiledChain`] whenever it changes.
#[derive(Clone, Default)]
pub struct PluginChain {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin at the tail.
    pub fn push(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Remove and return the tail plugin.
    pub fn pop(&mut self) -> Option<Arc<dyn Plugin>> {
        self.plugins.pop()
    }

    /// A new chain with its own list wrapping the same plugin instances.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self {
            plugins: self.plugins.iter().map(Arc::clone).collect(),
        }
    }

    /// Splice `other` onto the tail, consuming it.
    pub fn link(&mut self, other: PluginChain) {
        self.plugins.extend(other.plugins);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run the plugins in order. The implicit final `next` does nothing.
    pub fn run(&self, req: &mut Request, resp: &mut Response) {
        Next::new(&self.plugins, None).run(req, resp);
    }

    /// Freeze into an immutable snapshot ending in `terminal`.
    #[must_use]
    pub fn freeze(self, terminal: Option<Handler>) -> CompiledChain {
        CompiledChain {
            steps: self.plugins.into(),
            terminal,
        }
    }
}

impl fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginChain")
            .field("len", &self.plugins.len())
            .finish()
    }
}

/// Frozen chain presented to requests.
///
/// Cloning shares the step slice; nothing can append to it afterwards, so a
/// request that picked up a chain keeps running exactly that chain even if a
/// registration publishes a new one meanwhile.
#[derive(Clone)]
pub struct CompiledChain {
    steps: Arc<[Arc<dyn Plugin>]>,
    terminal: Option<Handler>,
}

impl Default for CompiledChain {
    fn default() -> Self {
        PluginChain::new().freeze(None)
    }
}

impl CompiledChain {
    /// Run every step, then the terminal handler.
    pub fn run(&self, req: &mut Request, resp: &mut Response) {
        Next::new(&self.steps, self.terminal.as_ref()).run(req, resp);
    }

    /// Number of plugins, not counting the terminal handler.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Back to a builder holding the same plugin instances, without the
    /// terminal handler. Used as the inherited prefix of nested chains.
    #[must_use]
    pub fn to_chain(&self) -> PluginChain {
        PluginChain {
            plugins: self.steps.iter().map(Arc::clone).collect(),
        }
    }
}

impl fmt::Debug for CompiledChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledChain")
            .field("len", &self.steps.len())
            .field("terminal", &self.terminal.is_some())
            .finish()
    }
}
