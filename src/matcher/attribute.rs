//! Attribute tests: `[path]`, `[path op value]`.
//!
//! Values coming out of a tree are loosely typed, so comparisons follow the
//! conventions of the languages these trees describe: equality against a
//! literal compares string forms, relational operators coerce mixed
//! operands to numbers, and anything absent simply fails to match.

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::selector::{AttrOp, AttrRegex, AttrValue, Attribute, Literal};
use crate::tree::{NodeId, Tree, ValueRef};

pub(crate) fn matches(tree: &Tree, attr: &Attribute, node: NodeId) -> bool {
    let value = tree.resolve(node, &attr.path);
    let Some(test) = &attr.test else {
        return is_truthy(value);
    };

    match (&test.value, test.operator) {
        (AttrValue::Literal(literal), AttrOp::Eq) => string_form(value) == literal_form(literal),
        (AttrValue::Literal(literal), AttrOp::NotEq) => string_form(value) != literal_form(literal),
        (AttrValue::Literal(literal), op) => relational(value, literal, op),
        (AttrValue::Regex(re), AttrOp::Eq) => regex_matches(re, value),
        (AttrValue::Regex(re), AttrOp::NotEq) => !regex_matches(re, value),
        (AttrValue::Type(name), AttrOp::Eq) => type_name(value) == name,
        (AttrValue::Type(name), AttrOp::NotEq) => type_name(value) != name,
        (other, op) => panic!(
            "attribute operator `{op}` cannot be applied to `{other}` in [{}]",
            attr.path.join(".")
        ),
    }
}

pub fn is_truthy(value: Option<ValueRef<'_>>) -> bool {
    match value {
        None | Some(ValueRef::Null) => false,
        Some(ValueRef::Bool(b)) => b,
        Some(ValueRef::Number(n)) => n != 0.0 && !n.is_nan(),
        Some(ValueRef::Str(s)) => !s.is_empty(),
        Some(ValueRef::Array(items)) => !items.is_empty(),
        Some(ValueRef::Object(_) | ValueRef::Node(_)) => true,
    }
}

/// Name used by `type(...)`.
pub fn type_name(value: Option<ValueRef<'_>>) -> &'static str {
    match value {
        None => "undefined",
        Some(ValueRef::Bool(_)) => "boolean",
        Some(ValueRef::Number(_)) => "number",
        Some(ValueRef::Str(_)) => "string",
        Some(ValueRef::Null | ValueRef::Array(_) | ValueRef::Object(_) | ValueRef::Node(_)) => {
            "object"
        }
    }
}

fn write_number(out: &mut String, n: f64) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if n == 0.0 {
        out.push('0');
    } else {
        let _ = write!(out, "{n}");
    }
}

fn write_form(out: &mut String, value: ValueRef<'_>, in_array: bool) {
    match value {
        // Array elements that are null render empty.
        ValueRef::Null if in_array => {}
        ValueRef::Null => out.push_str("null"),
        ValueRef::Bool(b) => out.push_str(if b { "true" } else { "false" }),
        ValueRef::Number(n) => write_number(out, n),
        ValueRef::Str(s) => out.push_str(s),
        ValueRef::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_form(out, item.as_value_ref(), true);
            }
        }
        ValueRef::Object(_) | ValueRef::Node(_) => out.push_str("[object Object]"),
    }
}

/// The string a value is compared as by `=` and `!=`.
pub fn string_form(value: Option<ValueRef<'_>>) -> String {
    let mut out = String::new();
    match value {
        None => out.push_str("undefined"),
        Some(value) => write_form(&mut out, value, false),
    }
    out
}

fn literal_form(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => s.clone(),
        Literal::Number(n) => {
            let mut out = String::new();
            write_number(&mut out, *n);
            out
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse().ok()
}

fn to_number(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Number(n) => Some(n),
        ValueRef::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        ValueRef::Str(s) => parse_number(s),
        _ => None,
    }
}

fn ordering(value: Option<ValueRef<'_>>, literal: &Literal) -> Option<Ordering> {
    match (value?, literal) {
        (ValueRef::Str(a), Literal::String(b)) => Some(a.cmp(b.as_str())),
        (value, Literal::Number(b)) => to_number(value)?.partial_cmp(b),
        (value, Literal::String(b)) => to_number(value)?.partial_cmp(&parse_number(b)?),
    }
}

fn relational(value: Option<ValueRef<'_>>, literal: &Literal, op: AttrOp) -> bool {
    let Some(order) = ordering(value, literal) else {
        return false;
    };
    match op {
        AttrOp::Lt => order.is_lt(),
        AttrOp::Le => order.is_le(),
        AttrOp::Gt => order.is_gt(),
        AttrOp::Ge => order.is_ge(),
        AttrOp::Eq | AttrOp::NotEq => panic!("`{op}` is not a relational operator"),
    }
}

/// Only strings can match a regex. `!=` negates this, so a number, an
/// object or an absent value always satisfies `[x!=/re/]`.
fn regex_matches(re: &AttrRegex, value: Option<ValueRef<'_>>) -> bool {
    let Some(ValueRef::Str(s)) = value else {
        return false;
    };
    match re.regex.is_match(s) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!(pattern = %re.source, error = %e, "regex evaluation failed");
            false
        }
    }
}
