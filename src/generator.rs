//! Node event generator.
//!
//! Patterns are parsed and partitioned once, at construction. Each tree is
//! then walked through a [`Traversal`], which owns the match caches for
//! that walk and emits the registered pattern text whenever a selector
//! matches the node being entered (or left, for `:exit` patterns).

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::emitter::Emitter;
use crate::matcher::Matcher;
use crate::selector::{Selector, SelectorError, TypeHint, parse, type_hint};
use crate::tree::{NodeId, Tree, Visit};

pub const EXIT_SUFFIX: &str = ":exit";

/// Split a registration string into the selector text and whether it
/// fires on leave.
pub fn parse_registration(raw: &str) -> (&str, bool) {
    match raw.strip_suffix(EXIT_SUFFIX) {
        Some(text) => (text, true),
        None => (raw, false),
    }
}

#[derive(Debug, Error)]
#[error("invalid selector `{pattern}`: {source}")]
pub struct RegistrationError {
    pub pattern: String,
    #[source]
    pub source: SelectorError,
}

#[derive(Debug)]
pub struct RegisteredSelector {
    raw: String,
    selector: Selector,
    is_exit: bool,
    hint: TypeHint,
}

impl RegisteredSelector {
    /// The pattern as registered; this is the emitted event name.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn is_exit(&self) -> bool {
        self.is_exit
    }

    pub fn hint(&self) -> &TypeHint {
        &self.hint
    }
}

#[derive(Debug, Default)]
pub struct NodeEventGenerator {
    entries: Vec<RegisteredSelector>,
    /// Entry indices per node type, registration order.
    by_type: HashMap<String, Vec<usize>>,
    /// Entries without a type hint; checked on every node.
    general: Vec<usize>,
}

impl NodeEventGenerator {
    /// Parse and index `patterns`. Duplicates are registered once. Fails on
    /// the first pattern that does not parse.
    pub fn new<I, S>(patterns: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut generator = Self::default();
        let mut seen = HashSet::new();

        for raw in patterns {
            let raw = raw.as_ref();
            if !seen.insert(raw.to_string()) {
                continue;
            }
            let (text, is_exit) = parse_registration(raw);
            let selector = parse(text).map_err(|source| RegistrationError {
                pattern: raw.to_string(),
                source,
            })?;
            let hint = type_hint(&selector);

            let index = generator.entries.len();
            match &hint {
                Some(types) => {
                    for kind in types {
                        generator.by_type.entry(kind.clone()).or_default().push(index);
                    }
                }
                None => generator.general.push(index),
            }
            generator.entries.push(RegisteredSelector {
                raw: raw.to_string(),
                selector,
                is_exit,
                hint,
            });
        }

        tracing::debug!(
            selectors = generator.entries.len(),
            node_types = generator.by_type.len(),
            general = generator.general.len(),
            "registered selectors"
        );
        Ok(generator)
    }

    pub fn selectors(&self) -> &[RegisteredSelector] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selectors that could match a node of type `kind`: those hinted for
    /// it, then the general ones.
    pub fn candidates<'g>(&'g self, kind: &str) -> impl Iterator<Item = &'g RegisteredSelector> {
        let hinted = self.by_type.get(kind).map(Vec::as_slice).unwrap_or_default();
        hinted
            .iter()
            .chain(&self.general)
            .map(|&index| &self.entries[index])
    }

    /// Start a walk over `tree` with fresh caches.
    pub fn traversal<'g, 't>(&'g self, tree: &'t Tree) -> Traversal<'g, 't> {
        Traversal {
            generator: self,
            matcher: Matcher::new(tree),
        }
    }

    /// Walk all of `tree`, emitting into `emitter`.
    pub fn run<E: Emitter + ?Sized>(&self, tree: &Tree, emitter: &mut E) {
        let mut driver = Driver {
            traversal: self.traversal(tree),
            emitter,
        };
        tree.walk(&mut driver);

        let (direct, ancestor) = driver.traversal.matcher().cache().len();
        tracing::trace!(nodes = tree.len(), direct, ancestor, "traversal finished");
    }
}

/// One walk of one tree. Call `enter_node` / `leave_node` in depth-first
/// pre- and post-order.
pub struct Traversal<'g, 't> {
    generator: &'g NodeEventGenerator,
    matcher: Matcher<'g, 't>,
}

impl<'g, 't> Traversal<'g, 't> {
    pub fn enter_node<E: Emitter + ?Sized>(&mut self, node: NodeId, emitter: &mut E) {
        self.dispatch(node, false, emitter);
    }

    pub fn leave_node<E: Emitter + ?Sized>(&mut self, node: NodeId, emitter: &mut E) {
        self.dispatch(node, true, emitter);
    }

    pub fn matcher(&self) -> &Matcher<'g, 't> {
        &self.matcher
    }

    fn dispatch<E: Emitter + ?Sized>(&mut self, node: NodeId, exit: bool, emitter: &mut E) {
        let generator = self.generator;
        let kind = self.matcher.tree().kind(node);
        for entry in generator.candidates(kind) {
            if entry.is_exit == exit && self.matcher.is_match(&entry.selector, node) {
                emitter.emit(&entry.raw, node);
            }
        }
    }
}

struct Driver<'a, 'g, 't, E: ?Sized> {
    traversal: Traversal<'g, 't>,
    emitter: &'a mut E,
}

impl<E: Emitter + ?Sized> Visit for Driver<'_, '_, '_, E> {
    fn enter_node(&mut self, node: NodeId) {
        self.traversal.enter_node(node, &mut *self.emitter);
    }

    fn leave_node(&mut self, node: NodeId) {
        self.traversal.leave_node(node, &mut *self.emitter);
    }
}
