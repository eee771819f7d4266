//! Route groups and endpoints.
//!
//! A [`Group`] owns a path prefix, a plugin chain and its own [`Tree`] of
//! entries addressed relative to that prefix. The router's root is a group
//! with an empty prefix, whose chain is the global chain. An entry is either
//! the set of endpoints registered at one path (one per method) or a nested
//! group.
//!
//! A group node is always a leaf of its parent's tree with respect to
//! payloads: anything registered beneath it lives in the group's own tree.
//! Creating a group over existing entries moves those entries into the new
//! group (subsumption) so the invariant keeps holding.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::tree::{MatchMode, NodeId, Prefix, Tree};
use crate::context::ParamVec;
use crate::error::{MatchError, RouteError};
use crate::middleware::{CompiledChain, Handler, Plugin, PluginChain};
use crate::path::{join_segments, split};

/// Payload of a tree node.
#[derive(Clone)]
pub(crate) enum Entry {
    Routes(RouteSet),
    Group(Box<Group>),
}

/// Endpoints registered at one path, keyed by method.
#[derive(Clone, Default)]
pub(crate) struct RouteSet {
    endpoints: HashMap<Method, Endpoint>,
}

impl RouteSet {
    pub fn get(&self, method: &Method) -> Option<&Endpoint> {
        self.endpoints.get(method)
    }

    /// Endpoints sorted by method name, for stable listings.
    pub fn sorted(&self) -> Vec<&Endpoint> {
        let mut endpoints: Vec<&Endpoint> = self.endpoints.values().collect();
        endpoints.sort_by(|a, b| a.method.as_str().cmp(b.method.as_str()));
        endpoints
    }
}

/// A handler bound to its compiled chain.
#[derive(Clone)]
pub(crate) struct Endpoint {
    pub method: Method,
    /// Absolute template path as registered
    pub path: String,
    handler: Handler,
    chain: PluginChain,
    compiled: CompiledChain,
}

impl Endpoint {
    fn new(method: Method, path: &str, handler: Handler, inherited: &CompiledChain) -> Self {
        let mut endpoint = Self {
            method,
            path: path.to_string(),
            handler,
            chain: PluginChain::new(),
            compiled: CompiledChain::default(),
        };
        endpoint.recompile(inherited);
        endpoint
    }

    /// compiled = inherited ++ local ++ handler
    fn recompile(&mut self, inherited: &CompiledChain) {
        let mut chain = inherited.to_chain();
        chain.link(self.chain.deep_copy());
        self.compiled = chain.freeze(Some(Arc::clone(&self.handler)));
    }

    pub fn compiled(&self) -> &CompiledChain {
        &self.compiled
    }

    pub fn local_len(&self) -> usize {
        self.chain.len()
    }
}

/// A path prefix with its own plugin chain and subtree.
#[derive(Clone)]
pub(crate) struct Group {
    /// Template relative to the parent group, e.g. `/v1`
    prefix: String,
    /// Absolute template, e.g. `/api/v1`; empty for the root
    full_path: String,
    chain: PluginChain,
    /// Compiled chain of the parent group
    inherited: CompiledChain,
    /// inherited ++ chain
    compiled: CompiledChain,
    tree: Tree<Entry>,
}

impl Group {
    pub fn root() -> Self {
        Self::new(String::new(), String::new())
    }

    fn new(prefix: String, full_path: String) -> Self {
        Self {
            prefix,
            full_path,
            chain: PluginChain::new(),
            inherited: CompiledChain::default(),
            compiled: CompiledChain::default(),
            tree: Tree::new(),
        }
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn compiled(&self) -> &CompiledChain {
        &self.compiled
    }

    /// Append to the local chain and rebuild every chain beneath.
    pub fn use_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.chain.push(plugin);
        let inherited = self.inherited.clone();
        self.recompile(inherited);
    }

    /// Rebuild this group's chain on top of `inherited`, then every
    /// descendant endpoint and group.
    fn recompile(&mut self, inherited: CompiledChain) {
        let mut chain = inherited.to_chain();
        chain.link(self.chain.deep_copy());
        self.compiled = chain.freeze(None);
        self.inherited = inherited;

        let compiled = &self.compiled;
        for entry in self.tree.payloads_mut() {
            match entry {
                Entry::Routes(routes) => {
                    for endpoint in routes.endpoints.values_mut() {
                        endpoint.recompile(compiled);
                    }
                }
                Entry::Group(group) => group.recompile(compiled.clone()),
            }
        }
    }

    /// Point this group (and nested groups) at a new location.
    fn rebase(&mut self, prefix: String, parent_full_path: &str) {
        self.full_path = format!("{parent_full_path}{prefix}");
        self.prefix = prefix;
        let full_path = &self.full_path;
        for entry in self.tree.payloads_mut() {
            if let Entry::Group(group) = entry {
                let prefix = std::mem::take(&mut group.prefix);
                group.rebase(prefix, full_path);
            }
        }
    }

    /// The nested group whose node lies on `segments`, if any, as
    /// `(node, segments consumed)`.
    fn inner_group(&self, segments: &[&str], mode: MatchMode) -> Option<(NodeId, usize)> {
        match self.tree.longest_prefix_match(segments, mode) {
            Some(Prefix {
                node,
                data: Entry::Group(_),
                depth,
                ..
            }) if depth > 0 => Some((node, depth)),
            _ => None,
        }
    }

    /// Walk nested groups along a template, returning the node of each group
    /// entered and the number of segments they consumed.
    fn locate(&self, segments: &[&str]) -> (Vec<NodeId>, usize) {
        let mut route = Vec::new();
        let mut consumed = 0;
        let mut group = self;
        while let Some((node, depth)) = group.inner_group(&segments[consumed..], MatchMode::Explicit) {
            let Some(Entry::Group(inner)) = group.tree.payload(node) else {
                break;
            };
            route.push(node);
            consumed += depth;
            group = &**inner;
        }
        (route, consumed)
    }

    fn descend_mut(&mut self, route: &[NodeId]) -> Option<&mut Group> {
        match route.split_first() {
            None => Some(self),
            Some((node, rest)) => match self.tree.payload_mut(*node)? {
                Entry::Group(inner) => inner.descend_mut(rest),
                Entry::Routes(_) => None,
            },
        }
    }

    /// The group registered exactly at `segments`.
    pub fn group_mut(&mut self, segments: &[&str]) -> Option<&mut Group> {
        let (route, consumed) = self.locate(segments);
        if consumed != segments.len() {
            return None;
        }
        self.descend_mut(&route)
    }

    /// Register `handler` for `method` at `segments` (absolute template
    /// `path`), inside the deepest group that owns the path.
    ///
    /// Re-registering an existing method + path swaps the handler and keeps
    /// the endpoint's plugins. Returns whether an endpoint was replaced.
    pub fn add(
        &mut self,
        method: Method,
        segments: &[&str],
        path: &str,
        handler: Handler,
    ) -> Result<bool, RouteError> {
        if let Some((node, depth)) = self.inner_group(segments, MatchMode::Explicit) {
            // The walk above ignores wildcard names; the group's own
            // parameters must be spelled the same way.
            self.tree.check(&segments[..depth])?;
            if let Some(Entry::Group(inner)) = self.tree.payload_mut(node) {
                return inner.add(method, &segments[depth..], path, handler);
            }
        }

        let id = self.tree.node_for(segments)?;
        let compiled = &self.compiled;
        let slot = self.tree.slot_mut(id);
        match slot {
            Some(Entry::Routes(routes)) => match routes.endpoints.get_mut(&method) {
                Some(endpoint) => {
                    endpoint.handler = handler;
                    endpoint.recompile(compiled);
                    Ok(true)
                }
                None => {
                    let endpoint = Endpoint::new(method.clone(), path, handler, compiled);
                    routes.endpoints.insert(method, endpoint);
                    Ok(false)
                }
            },
            Some(Entry::Group(inner)) => inner.add(method, &[], path, handler),
            None => {
                let mut routes = RouteSet::default();
                let endpoint = Endpoint::new(method.clone(), path, handler, compiled);
                routes.endpoints.insert(method, endpoint);
                *slot = Some(Entry::Routes(routes));
                Ok(false)
            }
        }
    }

    /// Append `plugin` to the endpoint at `method` + `segments`. Returns
    /// false if no such endpoint exists.
    pub fn use_endpoint_plugin(
        &mut self,
        method: &Method,
        segments: &[&str],
        plugin: Arc<dyn Plugin>,
    ) -> bool {
        let (route, consumed) = self.locate(segments);
        let Some(group) = self.descend_mut(&route) else {
            return false;
        };
        let Some(id) = group.tree.find(&segments[consumed..]) else {
            return false;
        };
        let compiled = &group.compiled;
        match group.tree.payload_mut(id) {
            Some(Entry::Routes(routes)) => match routes.endpoints.get_mut(method) {
                Some(endpoint) => {
                    endpoint.chain.push(plugin);
                    endpoint.recompile(compiled);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Find or create the group at `segments`, relative to this group.
    ///
    /// An existing group at the same shape is reused; wildcard names do not
    /// take part in that comparison. A new group absorbs every entry of this
    /// group's tree whose path starts with `segments`. Returns the number of
    /// entries absorbed.
    pub fn ensure_group(&mut self, segments: &[&str]) -> Result<usize, RouteError> {
        if segments.is_empty() {
            return Ok(0);
        }
        if let Some((node, depth)) = self.inner_group(segments, MatchMode::Explicit) {
            if depth < segments.len() {
                self.tree.check(&segments[..depth])?;
            }
            if let Some(Entry::Group(inner)) = self.tree.payload_mut(node) {
                return inner.ensure_group(&segments[depth..]);
            }
        }

        // Refuse before anything moves: once the subtree is dropped a failed
        // insert would lose the absorbed routes.
        self.tree.check(segments)?;

        let prefix = join_segments(segments);
        let full_path = format!("{}{}", self.full_path, prefix);
        self.tree.apply_at(segments, |relative, entry| {
            let kind = match entry {
                Entry::Routes(_) => "routes",
                Entry::Group(_) => "group",
            };
            debug!(group = %full_path, entry = %relative, kind, "Absorbing entry into new group");
        });

        let absorbed = self.tree.drop_at(segments);
        let count = absorbed.len();
        let mut group = Group::new(prefix, full_path);
        for (relative, entry) in absorbed {
            group.adopt(&relative, entry).inspect_err(|e| {
                error!(group = %group.full_path, entry = %relative, error = %e, "Failed to re-home absorbed entry");
            })?;
        }
        group.recompile(self.compiled.clone());

        info!(
            group = %group.full_path,
            parent = %self.full_path,
            absorbed = count,
            "Group created"
        );
        self.tree.insert(segments, Entry::Group(Box::new(group)))?;
        Ok(count)
    }

    /// Insert an entry taken from the parent's tree at `relative`.
    fn adopt(&mut self, relative: &str, entry: Entry) -> Result<(), RouteError> {
        let entry = match entry {
            Entry::Group(mut group) => {
                group.rebase(relative.to_string(), &self.full_path);
                Entry::Group(group)
            }
            routes @ Entry::Routes(_) => routes,
        };
        self.tree.insert(&split(relative), entry)?;
        Ok(())
    }

    /// Request-time lookup: descend through groups by longest prefix, then
    /// match exactly in the innermost group.
    pub fn resolve<'g>(
        &'g self,
        segments: &[&str],
    ) -> Result<(&'g Group, &'g RouteSet, ParamVec), MatchError> {
        let mut group = self;
        let mut rest = segments;
        let mut params = ParamVec::new();
        loop {
            match group.tree.longest_prefix_match(rest, MatchMode::Request) {
                Some(Prefix {
                    data: Entry::Group(inner),
                    depth,
                    params: bound,
                    ..
                }) if depth > 0 => {
                    params.extend(bound);
                    rest = &rest[depth..];
                    group = &**inner;
                }
                _ => break,
            }
        }
        let found = group.tree.match_path(rest, MatchMode::Request)?;
        match found.data {
            Entry::Routes(routes) => {
                params.extend(found.params);
                Ok((group, routes, params))
            }
            Entry::Group(_) => Err(MatchError::NotFound),
        }
    }

    /// Every endpoint beneath this group, breadth first per group.
    pub fn collect<'g>(&'g self, out: &mut Vec<(&'g Group, &'g Endpoint)>) {
        for (_, entry) in self.tree.entries() {
            match entry {
                Entry::Routes(routes) => out.extend(routes.sorted().into_iter().map(|e| (self, e))),
                Entry::Group(group) => group.collect(out),
            }
        }
    }

    #[cfg(test)]
    pub fn entry_count(&self) -> usize {
        self.tree.len()
    }
}
