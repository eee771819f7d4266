//! Segment trie used for route matching.
//!
//! Each node stands for one path segment position. Nodes live in an arena and
//! refer to each other by index, so the parent link needed for removal is a
//! plain `NodeId` rather than a second owner.
//!
//! A node has at most one wildcard child and at most one catch-all child, in
//! addition to any number of literal children keyed by their text. Lookup is
//! greedy and never backtracks:
//!
//! - a literal child always wins over the wildcard child,
//! - the wildcard child wins over the catch-all child,
//! - a catch-all ends the walk and matches whatever is left.
//!
//! Two walk modes exist. [`MatchMode::Request`] matches a concrete request
//! path, checking wildcard constraints and recording parameters.
//! [`MatchMode::Explicit`] walks a template: `{...}` (or the internal `*`)
//! steps into the wildcard slot whatever its name, `^` steps into the
//! catch-all slot, and everything else must match a literal child. It is used
//! to find an already registered node by its shape.

use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::context::ParamVec;
use crate::error::{MatchError, RouteError};
use crate::path::{is_wildcard_token, SegmentKind, CATCH_ALL};

/// Stable index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchMode {
    Request,
    Explicit,
}

#[derive(Debug, Clone)]
struct Pattern {
    source: Box<str>,
    regex: Regex,
}

#[derive(Debug, Clone)]
struct Wildcard {
    name: Arc<str>,
    pattern: Option<Pattern>,
}

impl Wildcard {
    fn accepts(&self, segment: &str) -> bool {
        !segment.is_empty()
            && self
                .pattern
                .as_ref()
                .map_or(true, |p| p.regex.is_match(segment))
    }

    fn same_slot(&self, other: &Wildcard) -> bool {
        self.name == other.name
            && self.pattern.as_ref().map(|p| &p.source) == other.pattern.as_ref().map(|p| &p.source)
    }

    fn template(&self) -> String {
        match &self.pattern {
            Some(p) => format!("{{{}: {}}}", self.name, p.source),
            None => format!("{{{}}}", self.name),
        }
    }
}

#[derive(Debug, Clone)]
enum Key {
    Root,
    Literal(Box<str>),
    Wildcard(Wildcard),
    CatchAll,
}

impl Key {
    /// Compile one registration segment.
    fn parse(segment: &str) -> Result<Self, RouteError> {
        Ok(match SegmentKind::parse(segment)? {
            SegmentKind::Literal(text) => Key::Literal(text.into()),
            SegmentKind::CatchAll => Key::CatchAll,
            SegmentKind::Wildcard { name, pattern } => {
                let pattern = match pattern {
                    Some(source) => {
                        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
                            RouteError::PatternCompile {
                                segment: segment.to_string(),
                                source: e,
                            }
                        })?;
                        Some(Pattern {
                            source: source.into(),
                            regex,
                        })
                    }
                    None => None,
                };
                Key::Wildcard(Wildcard {
                    name: name.into(),
                    pattern,
                })
            }
        })
    }

    fn template(&self) -> String {
        match self {
            Key::Root => String::new(),
            Key::Literal(text) => text.to_string(),
            Key::Wildcard(w) => w.template(),
            Key::CatchAll => CATCH_ALL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Node<T> {
    key: Key,
    children: HashMap<Box<str>, NodeId>,
    wildcard: Option<NodeId>,
    catch_all: Option<NodeId>,
    data: Option<T>,
    parent: Option<NodeId>,
}

impl<T> Node<T> {
    fn new(key: Key, parent: Option<NodeId>) -> Self {
        Self {
            key,
            children: HashMap::new(),
            wildcard: None,
            catch_all: None,
            data: None,
            parent,
        }
    }
}

/// Successful exact lookup.
pub(crate) struct Found<'t, T> {
    pub data: &'t T,
    pub params: ParamVec,
}

/// Deepest payload-bearing node along a path.
pub(crate) struct Prefix<'t, T> {
    pub node: NodeId,
    pub data: &'t T,
    /// Number of segments consumed to reach `node`.
    pub depth: usize,
    pub params: ParamVec,
}

/// Arena-backed segment trie.
#[derive(Clone)]
pub(crate) struct Tree<T> {
    nodes: Vec<Node<T>>,
    free: Vec<NodeId>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Key::Root, None)],
            free: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, key: Key, parent: NodeId) -> NodeId {
        let node = Node::new(key, Some(parent));
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Compile `segments` and check them against the nodes that already
    /// exist, without changing anything. Stops after a catch-all.
    fn prepare(&self, segments: &[&str]) -> Result<Vec<Key>, RouteError> {
        let mut keys = Vec::with_capacity(segments.len());
        let mut cursor = Some(ROOT);
        for segment in segments {
            let key = Key::parse(segment)?;
            let next = cursor.and_then(|id| {
                let node = self.node(id);
                match &key {
                    Key::Literal(text) => node.children.get(text).copied(),
                    Key::Wildcard(_) => node.wildcard,
                    Key::CatchAll | Key::Root => node.catch_all,
                }
            });
            if let (Some(id), Key::Wildcard(requested)) = (next, &key) {
                if let Key::Wildcard(existing) = &self.node(id).key {
                    if !existing.same_slot(requested) {
                        return Err(RouteError::WildcardConflict {
                            existing: existing.template(),
                            requested: requested.template(),
                        });
                    }
                }
            }
            let terminal = matches!(key, Key::CatchAll);
            keys.push(key);
            if terminal {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    /// Resolve or create the node for `segments`.
    ///
    /// Fails without touching the tree if a pattern does not compile or a
    /// wildcard slot is taken by a different wildcard. Segments after a
    /// catch-all are ignored.
    pub fn node_for(&mut self, segments: &[&str]) -> Result<NodeId, RouteError> {
        let keys = self.prepare(segments)?;
        let mut id = ROOT;
        for key in keys {
            let existing = {
                let node = self.node(id);
                match &key {
                    Key::Literal(text) => node.children.get(text).copied(),
                    Key::Wildcard(_) => node.wildcard,
                    Key::CatchAll | Key::Root => node.catch_all,
                }
            };
            id = match existing {
                Some(next) => next,
                None => {
                    let next = self.alloc(key.clone(), id);
                    let parent = self.node_mut(id);
                    match key {
                        Key::Literal(text) => {
                            parent.children.insert(text, next);
                        }
                        Key::Wildcard(_) => parent.wildcard = Some(next),
                        Key::CatchAll | Key::Root => parent.catch_all = Some(next),
                    }
                    next
                }
            };
        }
        Ok(id)
    }

    /// Attach `payload` at `segments`, returning whatever was there before.
    pub fn insert(&mut self, segments: &[&str], payload: T) -> Result<Option<T>, RouteError> {
        let id = self.node_for(segments)?;
        Ok(self.node_mut(id).data.replace(payload))
    }

    /// Validate `segments` for insertion without changing the tree.
    pub fn check(&self, segments: &[&str]) -> Result<(), RouteError> {
        self.prepare(segments).map(|_| ())
    }

    pub fn payload(&self, id: NodeId) -> Option<&T> {
        self.node(id).data.as_ref()
    }

    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id).data.as_mut()
    }

    /// The payload slot itself, for callers that fill it lazily.
    pub fn slot_mut(&mut self, id: NodeId) -> &mut Option<T> {
        &mut self.node_mut(id).data
    }

    /// Every payload, in arena order.
    pub fn payloads_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.nodes.iter_mut().filter_map(|n| n.data.as_mut())
    }

    /// Number of nodes carrying a payload.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.data.is_some()).count()
    }

    /// Nodes currently allocated, including the root.
    #[cfg(test)]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// One step of a walk. Records a parameter when a wildcard is taken in
    /// request mode.
    fn step(
        &self,
        id: NodeId,
        segment: &str,
        mode: MatchMode,
        params: &mut ParamVec,
    ) -> Option<NodeId> {
        let node = self.node(id);
        match mode {
            MatchMode::Explicit => {
                if segment == CATCH_ALL {
                    node.catch_all
                } else if is_wildcard_token(segment) {
                    node.wildcard
                } else {
                    node.children.get(segment).copied()
                }
            }
            MatchMode::Request => {
                if let Some(next) = node.children.get(segment) {
                    return Some(*next);
                }
                let wild = node.wildcard?;
                match &self.node(wild).key {
                    Key::Wildcard(w) if w.accepts(segment) => {
                        params.push((Arc::clone(&w.name), segment.to_string()));
                        Some(wild)
                    }
                    _ => None,
                }
            }
        }
    }

    fn catch_all_payload(&self, id: NodeId) -> Option<NodeId> {
        let ca = self.node(id).catch_all?;
        self.node(ca).data.as_ref().map(|_| ca)
    }

    /// True if the node reached by `previous`, or the wildcard sibling that
    /// would also accept `previous`, carries a payload.
    fn slash_less_match(&self, id: NodeId, previous: Option<&str>) -> bool {
        let node = self.node(id);
        if node.data.is_some() {
            return true;
        }
        let (Some(parent), Some(previous)) = (node.parent, previous) else {
            return false;
        };
        match self.node(parent).wildcard {
            Some(wild) if wild != id => {
                let sibling = self.node(wild);
                sibling.data.is_some()
                    && matches!(&sibling.key, Key::Wildcard(w) if w.accepts(previous))
            }
            _ => false,
        }
    }

    /// Exact lookup.
    ///
    /// A request path that runs off the tree, or stops on a node without a
    /// payload, falls back to the deepest catch-all passed on the way, with
    /// the parameters bound above it. Otherwise fails with
    /// [`MatchError::RedirectSlash`] when the path would match with its
    /// trailing slash added or removed, and [`MatchError::NotFound`] if not.
    pub fn match_path(&self, segments: &[&str], mode: MatchMode) -> Result<Found<'_, T>, MatchError> {
        let mut id = ROOT;
        let mut params = ParamVec::new();
        let mut fallback: Option<(NodeId, usize)> = None;
        let mut stopped_at = None;
        for (i, segment) in segments.iter().enumerate() {
            if mode == MatchMode::Request {
                if let Some(ca) = self.catch_all_payload(id) {
                    fallback = Some((ca, params.len()));
                }
            }
            match self.step(id, segment, mode, &mut params) {
                Some(next) => id = next,
                None => {
                    stopped_at = Some(i);
                    break;
                }
            }
        }

        let node = self.node(id);
        if stopped_at.is_none() {
            if let Some(data) = node.data.as_ref() {
                return Ok(Found { data, params });
            }
        }
        if let Some((ca, kept)) = fallback {
            if let Some(data) = self.node(ca).data.as_ref() {
                params.truncate(kept);
                return Ok(Found { data, params });
            }
        }

        match stopped_at {
            Some(i) => {
                let last = i + 1 == segments.len();
                let previous = i.checked_sub(1).map(|p| segments[p]);
                if last && segments[i].is_empty() && self.slash_less_match(id, previous) {
                    Err(MatchError::RedirectSlash)
                } else {
                    Err(MatchError::NotFound)
                }
            }
            None => {
                let slashed = node
                    .children
                    .get("")
                    .is_some_and(|child| self.node(*child).data.is_some());
                if slashed {
                    Err(MatchError::RedirectSlash)
                } else {
                    Err(MatchError::NotFound)
                }
            }
        }
    }

    /// Payload of the deepest node along `segments` that has one, including
    /// the root. Never fails on a partial walk; stops where the walk stops.
    ///
    /// In request mode a catch-all passed on the way counts as covering the
    /// whole path, unless a payload was found below the node that owns it.
    pub fn longest_prefix_match(&self, segments: &[&str], mode: MatchMode) -> Option<Prefix<'_, T>> {
        let mut id = ROOT;
        let mut params = ParamVec::new();
        let mut best = self.node(ROOT).data.as_ref().map(|_| (ROOT, 0, 0));
        let mut fallback: Option<(NodeId, usize, usize)> = None;
        for (i, segment) in segments.iter().enumerate() {
            if mode == MatchMode::Request {
                if let Some(ca) = self.catch_all_payload(id) {
                    fallback = Some((ca, i, params.len()));
                }
            }
            match self.step(id, segment, mode, &mut params) {
                Some(next) => {
                    id = next;
                    if self.node(id).data.is_some() {
                        best = Some((id, i + 1, params.len()));
                    }
                }
                None => break,
            }
        }
        if let Some((ca, owner_depth, kept)) = fallback {
            if best.map_or(true, |(_, depth, _)| depth <= owner_depth) {
                best = Some((ca, segments.len(), kept));
            }
        }
        let (node, depth, kept) = best?;
        params.truncate(kept);
        let data = self.node(node).data.as_ref()?;
        Some(Prefix {
            node,
            data,
            depth,
            params,
        })
    }

    /// Explicit walk to the node shaped like `segments`.
    pub fn find(&self, segments: &[&str]) -> Option<NodeId> {
        let mut params = ParamVec::new();
        segments.iter().try_fold(ROOT, |id, segment| {
            self.step(id, segment, MatchMode::Explicit, &mut params)
        })
    }

    /// Breadth-first walk of the subtree at `id`, yielding each node with its
    /// template path relative to `id`.
    fn walk(&self, id: NodeId) -> Vec<(NodeId, String)> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([(id, String::new())]);
        while let Some((current, path)) = queue.pop_front() {
            let node = self.node(current);
            let mut children: Vec<NodeId> = node.children.values().copied().collect();
            children.sort_by(|a, b| self.node(*a).key.template().cmp(&self.node(*b).key.template()));
            children.extend(node.wildcard);
            children.extend(node.catch_all);
            for child in children {
                let child_path = format!("{path}/{}", self.node(child).key.template());
                queue.push_back((child, child_path));
            }
            out.push((current, path));
        }
        out
    }

    /// Apply `f` to every payload under `segments` (explicit walk), breadth
    /// first. Literal siblings are visited in lexical order.
    pub fn apply_at<F>(&self, segments: &[&str], mut f: F)
    where
        F: FnMut(&str, &T),
    {
        let Some(start) = self.find(segments) else {
            return;
        };
        for (id, path) in self.walk(start) {
            if let Some(data) = self.node(id).data.as_ref() {
                f(&path, data);
            }
        }
    }

    /// Every payload with its template path, breadth first from the root.
    pub fn entries(&self) -> Vec<(String, &T)> {
        self.walk(ROOT)
            .into_iter()
            .filter_map(|(id, path)| self.node(id).data.as_ref().map(|data| (path, data)))
            .collect()
    }

    /// Remove the subtree at `segments` (explicit walk) and hand back its
    /// payloads, breadth first, each with its template path relative to the
    /// removed node. Dropping the root empties the tree.
    pub fn drop_at(&mut self, segments: &[&str]) -> Vec<(String, T)> {
        let Some(start) = self.find(segments) else {
            return Vec::new();
        };
        let order = self.walk(start);
        let mut removed = Vec::new();
        for (id, path) in &order {
            if let Some(data) = self.node_mut(*id).data.take() {
                removed.push((path.clone(), data));
            }
        }

        match self.node(start).parent {
            Some(parent) => {
                let parent_node = self.node_mut(parent);
                if parent_node.wildcard == Some(start) {
                    parent_node.wildcard = None;
                } else if parent_node.catch_all == Some(start) {
                    parent_node.catch_all = None;
                } else {
                    parent_node.children.retain(|_, child| *child != start);
                }
                for (id, _) in order {
                    *self.node_mut(id) = Node::new(Key::Root, None);
                    self.free.push(id);
                }
            }
            None => {
                for (id, _) in order.into_iter().skip(1) {
                    *self.node_mut(id) = Node::new(Key::Root, None);
                    self.free.push(id);
                }
                let root = self.node_mut(ROOT);
                root.children.clear();
                root.wildcard = None;
                root.catch_all = None;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::split;

    fn tree_with(routes: &[(&str, &'static str)]) -> Tree<&'static str> {
        let mut tree = Tree::new();
        for (path, payload) in routes {
            tree.insert(&split(path), *payload).unwrap();
        }
        tree
    }

    fn lookup(tree: &Tree<&'static str>, path: &str) -> Result<(&'static str, Vec<(String, String)>), MatchError> {
        tree.match_path(&split(path), MatchMode::Request).map(|found| {
            let params = found
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            (*found.data, params)
        })
    }

    fn param(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn test_literal_round_trip() {
        let tree = tree_with(&[("/", "root"), ("/a/b/c", "abc"), ("/a", "a")]);
        assert_eq!(lookup(&tree, "/a/b/c"), Ok(("abc", vec![])));
        assert_eq!(lookup(&tree, "/a"), Ok(("a", vec![])));
        assert_eq!(lookup(&tree, "/"), Ok(("root", vec![])));
        assert_eq!(lookup(&tree, "/a/b"), Err(MatchError::NotFound));
        assert_eq!(lookup(&tree, "/zzz"), Err(MatchError::NotFound));
    }

    #[test]
    fn test_wildcard_extraction() {
        let tree = tree_with(&[("/user/{name}", "user")]);
        assert_eq!(lookup(&tree, "/user/gordon"), Ok(("user", vec![param("name", "gordon")])));
        assert_eq!(lookup(&tree, "/user/gordon/profile"), Err(MatchError::NotFound));
    }

    #[test]
    fn test_params_follow_path_order() {
        let tree = tree_with(&[("/{org}/teams/{team}/members/{member}", "member")]);
        let (_, params) = lookup(&tree, "/acme/teams/red/members/7").unwrap();
        assert_eq!(
            params,
            vec![param("org", "acme"), param("team", "red"), param("member", "7")]
        );
    }

    #[test]
    fn test_regex_constraint() {
        let tree = tree_with(&[("/id/{n: ^[0-9]+$}", "id")]);
        assert_eq!(lookup(&tree, "/id/abc"), Err(MatchError::NotFound));
        assert_eq!(lookup(&tree, "/id/42"), Ok(("id", vec![param("n", "42")])));
    }

    #[test]
    fn test_unanchored_pattern_is_anchored() {
        let tree = tree_with(&[("/v/{n: [0-9]+}", "v")]);
        assert_eq!(lookup(&tree, "/v/a1"), Err(MatchError::NotFound));
        assert!(lookup(&tree, "/v/11").is_ok());
    }

    #[test]
    fn test_invalid_pattern_is_rejected_without_side_effects() {
        let mut tree: Tree<&str> = Tree::new();
        let before = tree.node_count();
        let err = tree.insert(&split("/x/y/{n: [0-9}"), "bad").unwrap_err();
        assert!(matches!(err, RouteError::PatternCompile { .. }));
        assert_eq!(tree.node_count(), before);
    }

    #[test]
    fn test_literal_beats_wildcard_beats_catch_all() {
        let tree = tree_with(&[
            ("/files/readme", "literal"),
            ("/files/{name}", "wildcard"),
            ("/files/^", "catch_all"),
        ]);
        assert_eq!(lookup(&tree, "/files/readme").unwrap().0, "literal");
        assert_eq!(lookup(&tree, "/files/other").unwrap().0, "wildcard");
        assert_eq!(lookup(&tree, "/files/a/b/c").unwrap().0, "catch_all");
    }

    #[test]
    fn test_catch_all_covers_dead_ends_below_it() {
        let tree = tree_with(&[
            ("/files/{name}/meta", "meta"),
            ("/files/list/all", "list"),
            ("/files/^", "rest"),
        ]);
        assert_eq!(lookup(&tree, "/files/a/meta").unwrap().0, "meta");
        // Wildcard taken, then a dead end: the parameter bound below the
        // catch-all is not reported.
        let (tag, params) = lookup(&tree, "/files/a/other").unwrap();
        assert_eq!(tag, "rest");
        assert!(params.is_empty());
        // Literal taken, walk ends on a node without a payload.
        assert_eq!(lookup(&tree, "/files/list").unwrap().0, "rest");
        assert_eq!(lookup(&tree, "/files/list/all/").unwrap().0, "rest");

        let prefix = tree
            .longest_prefix_match(&split("/files/a/other"), MatchMode::Request)
            .unwrap();
        assert_eq!(*prefix.data, "rest");
        assert_eq!(prefix.depth, 3);
    }

    #[test]
    fn test_no_backtracking_after_literal() {
        let tree = tree_with(&[("/a/x/y", "deep"), ("/a/{id}", "wild")]);
        assert_eq!(lookup(&tree, "/a/z").unwrap().0, "wild");
        assert_eq!(lookup(&tree, "/a/x"), Err(MatchError::NotFound));
    }

    #[test]
    fn test_catch_all_is_terminal() {
        let mut tree = tree_with(&[("/files/^", "all"), ("/files/list", "list")]);
        assert_eq!(lookup(&tree, "/files/list").unwrap().0, "list");
        assert_eq!(lookup(&tree, "/files/x/y/z").unwrap().0, "all");
        assert_eq!(lookup(&tree, "/files/").unwrap().0, "all");

        // Segments after the catch-all are discarded.
        tree.insert(&split("/files/^/more"), "replaced").unwrap();
        assert_eq!(lookup(&tree, "/files/x/more").unwrap().0, "replaced");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_trailing_slash_redirects() {
        let tree = tree_with(&[("/a/b", "ab"), ("/c/", "c_slash")]);
        assert_eq!(lookup(&tree, "/a/b/"), Err(MatchError::RedirectSlash));
        assert_eq!(lookup(&tree, "/c"), Err(MatchError::RedirectSlash));
        assert_eq!(lookup(&tree, "/a/"), Err(MatchError::NotFound));
    }

    #[test]
    fn test_trailing_slash_via_wildcard_sibling() {
        let tree = tree_with(&[("/u/{id}", "user"), ("/u/new/form", "form")]);
        assert_eq!(lookup(&tree, "/u/42/"), Err(MatchError::RedirectSlash));
        // `new` is a literal without payload, but the wildcard sibling accepts it.
        assert_eq!(lookup(&tree, "/u/new/"), Err(MatchError::RedirectSlash));
    }

    #[test]
    fn test_wildcard_conflict() {
        let mut tree = tree_with(&[("/u/{id}/posts", "posts")]);
        let err = tree.insert(&split("/u/{uid}/comments"), "comments").unwrap_err();
        match err {
            RouteError::WildcardConflict { existing, requested } => {
                assert_eq!(existing, "{id}");
                assert_eq!(requested, "{uid}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        let err = tree.insert(&split("/u/{id: [0-9]+}"), "digits").unwrap_err();
        assert!(matches!(err, RouteError::WildcardConflict { .. }));
        // Same name and constraint share the slot.
        tree.insert(&split("/u/{id}/comments"), "comments").unwrap();
        assert_eq!(lookup(&tree, "/u/9/comments").unwrap().0, "comments");
    }

    #[test]
    fn test_reinsert_overwrites_without_restructuring() {
        let mut tree = tree_with(&[("/a/b", "first")]);
        let nodes = tree.node_count();
        let previous = tree.insert(&split("/a/b"), "second").unwrap();
        assert_eq!(previous, Some("first"));
        assert_eq!(tree.node_count(), nodes);
        assert_eq!(lookup(&tree, "/a/b").unwrap().0, "second");
    }

    #[test]
    fn test_explicit_mode_matches_template_shape() {
        let tree = tree_with(&[("/id/{n: ^[0-9]+$}", "id"), ("/f/^", "files")]);
        let found = tree.match_path(&split("/id/{other}"), MatchMode::Explicit).unwrap();
        assert_eq!(*found.data, "id");
        assert!(found.params.is_empty());
        assert!(tree.match_path(&split("/id/*"), MatchMode::Explicit).is_ok());
        // A concrete value does not reach a wildcard in explicit mode.
        assert_eq!(
            tree.match_path(&split("/id/42"), MatchMode::Explicit).err(),
            Some(MatchError::NotFound)
        );
        assert!(tree.find(&split("/f/^")).is_some());
    }

    #[test]
    fn test_longest_prefix_match() {
        let mut tree: Tree<&str> = Tree::new();
        assert!(tree.longest_prefix_match(&split("/a"), MatchMode::Request).is_none());
        tree.insert(&[], "root").unwrap();
        tree.insert(&split("/api"), "api").unwrap();
        tree.insert(&split("/api/{v}/users"), "users").unwrap();

        let p = tree.longest_prefix_match(&split("/api/v1/users/7"), MatchMode::Request).unwrap();
        assert_eq!((*p.data, p.depth), ("users", 3));
        assert_eq!(p.params.len(), 1);

        let p = tree.longest_prefix_match(&split("/api/v1/orders"), MatchMode::Request).unwrap();
        assert_eq!((*p.data, p.depth), ("api", 1));
        assert!(p.params.is_empty());

        let p = tree.longest_prefix_match(&split("/other"), MatchMode::Request).unwrap();
        assert_eq!((*p.data, p.depth), ("root", 0));
    }

    #[test]
    fn test_apply_at_is_breadth_first() {
        let tree = tree_with(&[
            ("/a/b/c", "abc"),
            ("/a/x", "ax"),
            ("/a/b", "ab"),
            ("/a/{id}", "aid"),
            ("/z", "z"),
        ]);
        let mut seen = Vec::new();
        tree.apply_at(&split("/a"), |path, data| seen.push((path.to_string(), *data)));
        assert_eq!(
            seen,
            vec![
                ("/b".to_string(), "ab"),
                ("/x".to_string(), "ax"),
                ("/{id}".to_string(), "aid"),
                ("/b/c".to_string(), "abc"),
            ]
        );
    }

    #[test]
    fn test_drop_at_removes_subtree() {
        let mut tree = tree_with(&[("/a/b/c", "abc"), ("/a/b", "ab"), ("/a/d", "ad")]);
        let removed = tree.drop_at(&split("/a/b"));
        assert_eq!(
            removed,
            vec![(String::new(), "ab"), ("/c".to_string(), "abc")]
        );
        assert_eq!(lookup(&tree, "/a/b/c"), Err(MatchError::NotFound));
        assert_eq!(lookup(&tree, "/a/d").unwrap().0, "ad");
        assert_eq!(tree.len(), 1);

        // Freed slots are reused.
        let nodes = tree.node_count();
        tree.insert(&split("/a/b"), "again").unwrap();
        assert_eq!(tree.node_count(), nodes + 1);
        assert!(tree.drop_at(&split("/missing")).is_empty());
    }

    #[test]
    fn test_drop_wildcard_slot_allows_rename() {
        let mut tree = tree_with(&[("/u/{id}/posts", "posts")]);
        let removed = tree.drop_at(&split("/u/{uid}"));
        assert_eq!(removed, vec![("/posts".to_string(), "posts")]);
        tree.insert(&split("/u/{uid}"), "renamed").unwrap();
        assert_eq!(lookup(&tree, "/u/3"), Ok(("renamed", vec![param("uid", "3")])));
    }
}
