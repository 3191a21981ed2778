use std::fmt;

use crate::tree::{NodeId, Tree, ValueRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }

    pub fn from_str(s: &str) -> Option<Severity> {
        match s.to_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            "fatal" => Some(Severity::Fatal),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// 1-indexed line number, 0 when the node carries no position
    pub line: usize,
    /// 0-indexed column
    pub column: usize,
}

fn position(value: Option<ValueRef<'_>>) -> Option<usize> {
    match value? {
        ValueRef::Number(n) if n >= 0.0 && n.fract() == 0.0 => Some(n as usize),
        _ => None,
    }
}

impl Location {
    /// Read `loc.start.line` / `loc.start.column` from an ESTree node.
    pub fn of_node(tree: &Tree, node: NodeId) -> Location {
        let line = position(tree.resolve(node, &["loc", "start", "line"]));
        let column = position(tree.resolve(node, &["loc", "start", "column"]));
        match line {
            Some(line) => Location {
                line,
                column: column.unwrap_or(0),
            },
            None => Location::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub path: String,
    pub location: Location,
    pub severity: Severity,
    pub rule_name: String,
    pub message: String,
}

impl Diagnostic {
    pub fn sort_key(&self) -> (&str, usize, usize) {
        (&self.path, self.location.line, self.location.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}: {}",
            self.path,
            self.location.line,
            self.location.column,
            self.severity,
            self.rule_name,
            self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diagnostic(path: &str, line: usize) -> Diagnostic {
        Diagnostic {
            path: path.to_string(),
            location: Location { line, column: 0 },
            severity: Severity::Warning,
            rule_name: "X".to_string(),
            message: "m".to_string(),
        }
    }

    #[test]
    fn severity_letters() {
        assert_eq!(Severity::Info.letter(), 'I');
        assert_eq!(Severity::Warning.letter(), 'W');
        assert_eq!(Severity::Error.letter(), 'E');
        assert_eq!(Severity::Fatal.letter(), 'F');
    }

    #[test]
    fn severity_from_str() {
        assert_eq!(Severity::from_str("info"), Some(Severity::Info));
        assert_eq!(Severity::from_str("Warning"), Some(Severity::Warning));
        assert_eq!(Severity::from_str("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::from_str("fatal"), Some(Severity::Fatal));
        assert_eq!(Severity::from_str("convention"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic {
            path: "src/a.json".to_string(),
            location: Location { line: 3, column: 5 },
            severity: Severity::Error,
            rule_name: "Style/NoVar".to_string(),
            message: "Unexpected var.".to_string(),
        };
        assert_eq!(
            format!("{d}"),
            "src/a.json:3:5: E: Style/NoVar: Unexpected var."
        );
    }

    #[test]
    fn diagnostic_sort_key() {
        let d1 = diagnostic("a.json", 1);
        let d2 = diagnostic("a.json", 2);
        let d3 = diagnostic("b.json", 1);
        assert!(d1.sort_key() < d2.sort_key());
        assert!(d2.sort_key() < d3.sort_key());
    }

    #[test]
    fn location_from_estree_loc() {
        let tree = Tree::from_json(&json!({
            "type": "Program",
            "loc": { "start": { "line": 4, "column": 2 }, "end": { "line": 9, "column": 0 } },
            "body": [{ "type": "EmptyStatement" }]
        }))
        .unwrap();
        assert_eq!(
            Location::of_node(&tree, tree.root()),
            Location { line: 4, column: 2 }
        );
        let empty = tree.children(tree.root())[0];
        assert_eq!(Location::of_node(&tree, empty), Location::default());
    }

    #[test]
    fn location_ignores_non_numeric_positions() {
        let tree = Tree::from_json(&json!({
            "type": "Program",
            "loc": { "start": { "line": "4", "column": -1 } }
        }))
        .unwrap();
        assert_eq!(Location::of_node(&tree, tree.root()), Location::default());
    }
}
