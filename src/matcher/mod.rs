//! Selector matching against tree nodes.
//!
//! A [`Matcher`] belongs to exactly one traversal of one tree. It memoizes
//! both direct matches and "some strict ancestor matches" per
//! (selector, node) pair, so shared sub-selectors and repeated ancestor
//! searches are computed once. Sub-selectors are identified by address,
//! which is why the matcher borrows the selectors for its whole lifetime.

pub mod attribute;

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::selector::{Selector, SelectorKind};
use crate::tree::{NodeId, Tree, ValueRef};

type CacheKey = (usize, NodeId);

fn selector_key(selector: &Selector) -> usize {
    std::ptr::from_ref(selector) as usize
}

/// Per-traversal memo tables. Dropped with the traversal.
#[derive(Debug, Default)]
pub struct MatchCache<'s> {
    direct: HashMap<CacheKey, bool>,
    ancestor: HashMap<CacheKey, bool>,
    _selectors: PhantomData<&'s Selector>,
}

impl MatchCache<'_> {
    /// Number of memoized (direct, ancestor) results.
    pub fn len(&self) -> (usize, usize) {
        (self.direct.len(), self.ancestor.len())
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.ancestor.is_empty()
    }

    pub fn clear(&mut self) {
        self.direct.clear();
        self.ancestor.clear();
    }
}

pub struct Matcher<'s, 't> {
    tree: &'t Tree,
    cache: MatchCache<'s>,
}

impl<'s, 't> Matcher<'s, 't> {
    pub fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            cache: MatchCache::default(),
        }
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn cache(&self) -> &MatchCache<'s> {
        &self.cache
    }

    pub fn is_match(&mut self, selector: &'s Selector, node: NodeId) -> bool {
        let key = (selector_key(selector), node);
        if let Some(&hit) = self.cache.direct.get(&key) {
            return hit;
        }
        let result = self.evaluate(selector, node);
        self.cache.direct.insert(key, result);
        result
    }

    /// Whether `selector` matches any strict ancestor of `node`.
    ///
    /// Walks the parent chain iteratively and stops at the first match, a
    /// memoized ancestor or the root. Every node visited on the way gets
    /// the same answer recorded.
    pub fn is_any_ancestor_match(&mut self, selector: &'s Selector, node: NodeId) -> bool {
        let key = selector_key(selector);
        let mut pending = Vec::new();
        let mut current = node;

        let result = loop {
            if let Some(&hit) = self.cache.ancestor.get(&(key, current)) {
                break hit;
            }
            pending.push(current);
            let Some(parent) = self.tree.parent(current) else {
                break false;
            };
            if self.is_match(selector, parent) {
                break true;
            }
            current = parent;
        };

        for visited in pending {
            self.cache.ancestor.insert((key, visited), result);
        }
        result
    }

    fn evaluate(&mut self, selector: &'s Selector, node: NodeId) -> bool {
        match &selector.kind {
            SelectorKind::Identifier(name) => self.tree.kind(node) == name,
            SelectorKind::Wildcard => true,
            SelectorKind::Field(path) => field_matches(self.tree, path, node),
            SelectorKind::Attribute(attr) => attribute::matches(self.tree, attr, node),
            SelectorKind::Child { left, right } => {
                if !self.is_match(right, node) {
                    return false;
                }
                match self.tree.parent(node) {
                    Some(parent) => self.is_match(left, parent),
                    None => false,
                }
            }
            SelectorKind::Descendant { left, right } => {
                self.is_match(right, node) && self.is_any_ancestor_match(left, node)
            }
            SelectorKind::Compound(items) => items.iter().all(|item| self.is_match(item, node)),
            SelectorKind::Matches(items) => items.iter().any(|item| self.is_match(item, node)),
        }
    }
}

/// `.a.b`: climb one ancestor per segment, then follow the segments back
/// down. Arrays along the way are searched element by element. Matches iff
/// `node` itself is reached.
fn field_matches(tree: &Tree, path: &[String], node: NodeId) -> bool {
    if path.is_empty() {
        return false;
    }
    let Some(start) = tree.ancestors(node).nth(path.len() - 1) else {
        return false;
    };

    let mut stack = vec![(ValueRef::Node(start), 0)];
    while let Some((current, depth)) = stack.pop() {
        if depth == path.len() {
            if current == ValueRef::Node(node) {
                return true;
            }
            continue;
        }
        match tree.lookup(current, &path[depth]) {
            Some(ValueRef::Array(items)) => {
                stack.extend(items.iter().rev().map(|item| (item.as_value_ref(), depth + 1)));
            }
            Some(next) => stack.push((next, depth + 1)),
            None => {}
        }
    }
    false
}
