//! Building a [`Tree`] from ESTree-shaped JSON.
//!
//! Any JSON object with a string `type` member is a node; every other object
//! is plain data. A `parent` member in the input is dropped, since parents
//! are derived from nesting.

use serde_json::Value as Json;
use thiserror::Error;

use super::{NodeData, NodeId, Tree, Value};

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("root value is not a node (expected an object with a string `type` member)")]
    RootNotNode,
    #[error("tree has more than {} nodes", u32::MAX)]
    TooManyNodes,
}

struct Builder {
    nodes: Vec<NodeData>,
}

fn node_type(map: &serde_json::Map<String, Json>) -> Option<&str> {
    map.get("type").and_then(Json::as_str)
}

impl Builder {
    fn convert(&mut self, json: &Json, parent: Option<NodeId>) -> Result<Value, TreeError> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.convert(item, parent))
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(map) => match node_type(map) {
                Some(kind) => Value::Node(self.node(kind, map, parent)?),
                None => Value::Object(self.convert_fields(map, parent)?),
            },
        })
    }

    fn convert_fields(
        &mut self,
        map: &serde_json::Map<String, Json>,
        parent: Option<NodeId>,
    ) -> Result<Vec<(String, Value)>, TreeError> {
        map.iter()
            .filter(|(key, _)| key.as_str() != "parent")
            .map(|(key, value)| Ok((key.clone(), self.convert(value, parent)?)))
            .collect()
    }

    fn node(
        &mut self,
        kind: &str,
        map: &serde_json::Map<String, Json>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let index = u32::try_from(self.nodes.len()).map_err(|_| TreeError::TooManyNodes)?;
        let id = NodeId(index);
        self.nodes.push(NodeData {
            kind: kind.to_string(),
            fields: Vec::new(),
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        let fields = self.convert_fields(map, Some(id))?;
        self.nodes[id.index()].fields = fields;
        Ok(id)
    }
}

impl Tree {
    pub fn from_json(json: &Json) -> Result<Tree, TreeError> {
        let Json::Object(map) = json else {
            return Err(TreeError::RootNotNode);
        };
        let Some(kind) = node_type(map) else {
            return Err(TreeError::RootNotNode);
        };
        let mut builder = Builder { nodes: Vec::new() };
        let root = builder.node(kind, map, None)?;
        Ok(Tree {
            nodes: builder.nodes,
            root,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Tree, TreeError> {
        let json: Json = serde_json::from_str(text)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ValueRef;
    use serde_json::json;

    #[test]
    fn rejects_non_node_root() {
        assert!(matches!(
            Tree::from_json(&json!([1, 2])),
            Err(TreeError::RootNotNode)
        ));
        assert!(matches!(
            Tree::from_json(&json!({ "type": 3 })),
            Err(TreeError::RootNotNode)
        ));
    }

    #[test]
    fn rejects_invalid_json_text() {
        assert!(matches!(
            Tree::from_json_str("{ not json"),
            Err(TreeError::Json(_))
        ));
    }

    #[test]
    fn keeps_field_order() {
        let tree = Tree::from_json_str(
            r#"{"type":"FunctionDeclaration","id":{"type":"Identifier","name":"f"},
                "params":[],"body":{"type":"BlockStatement","body":[]}}"#,
        )
        .unwrap();
        let keys: Vec<&str> = tree
            .fields(tree.root())
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["type", "id", "params", "body"]);
        let kinds: Vec<&str> = tree
            .children(tree.root())
            .iter()
            .map(|&c| tree.kind(c))
            .collect();
        assert_eq!(kinds, vec!["Identifier", "BlockStatement"]);
    }

    #[test]
    fn drops_parent_member_and_links_through_plain_objects() {
        let tree = Tree::from_json(&json!({
            "type": "Outer",
            "parent": { "type": "Bogus" },
            "wrapper": { "inner": [{ "type": "Inner" }] }
        }))
        .unwrap();
        assert_eq!(tree.len(), 2);
        let inner = tree.children(tree.root())[0];
        assert_eq!(tree.kind(inner), "Inner");
        assert_eq!(tree.parent(inner), Some(tree.root()));
        assert_eq!(tree.field(tree.root(), "parent"), None);
        assert_eq!(
            tree.resolve(tree.root(), &["wrapper", "inner", "0"]),
            Some(ValueRef::Node(inner))
        );
    }

    #[test]
    fn scalar_values() {
        let tree = Tree::from_json(&json!({
            "type": "Literal", "a": null, "b": true, "c": 1.5, "d": "s"
        }))
        .unwrap();
        let root = tree.root();
        assert_eq!(tree.field(root, "a"), Some(ValueRef::Null));
        assert_eq!(tree.field(root, "b"), Some(ValueRef::Bool(true)));
        assert_eq!(tree.field(root, "c"), Some(ValueRef::Number(1.5)));
        assert_eq!(tree.field(root, "d"), Some(ValueRef::Str("s")));
    }
}
