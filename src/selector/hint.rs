//! Type hints: the set of node types a selector could possibly match.
//!
//! Used by the event generator to skip selectors that cannot match a node of
//! a given type. `None` means "no narrowing possible", i.e. check the
//! selector against every node. A hint is only ever an optimization; it
//! never changes whether a selector matches.

use std::collections::BTreeSet;

use super::ast::{Selector, SelectorKind};

pub type TypeHint = Option<BTreeSet<String>>;

pub fn type_hint(selector: &Selector) -> TypeHint {
    match &selector.kind {
        SelectorKind::Identifier(name) => Some(BTreeSet::from([name.clone()])),

        // The combinator's matched node is always the right-hand one.
        SelectorKind::Child { right, .. } | SelectorKind::Descendant { right, .. } => {
            type_hint(right)
        }

        // Members without a hint impose no restriction.
        SelectorKind::Compound(items) => items
            .iter()
            .filter_map(type_hint)
            .reduce(|acc, hint| acc.intersection(&hint).cloned().collect()),

        // One unhinted alternative makes the whole union unhinted.
        SelectorKind::Matches(items) => {
            let mut union = BTreeSet::new();
            for item in items {
                union.extend(type_hint(item)?);
            }
            Some(union)
        }

        SelectorKind::Wildcard | SelectorKind::Field(_) | SelectorKind::Attribute(_) => None,
    }
}
