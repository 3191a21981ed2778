//! Arena-backed syntax tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`], so
//! identity is an index rather than an address, and parent links are plain
//! data. Field values use a small closed [`Value`] type; attribute lookups
//! go through [`Tree::resolve`], which returns `None` for anything missing
//! instead of failing.

mod json;
mod walk;

pub use json::TreeError;
pub use walk::Visit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field value as stored in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    /// A plain (non-node) object, keys in source order.
    Object(Vec<(String, Value)>),
    Node(NodeId),
}

/// A borrowed view of a [`Value`], or a value synthesized by lookup
/// (`length`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'t> {
    Null,
    Bool(bool),
    Number(f64),
    Str(&'t str),
    Array(&'t [Value]),
    Object(&'t [(String, Value)]),
    Node(NodeId),
}

impl Value {
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Value::Null => ValueRef::Null,
            Value::Bool(b) => ValueRef::Bool(*b),
            Value::Number(n) => ValueRef::Number(*n),
            Value::String(s) => ValueRef::Str(s),
            Value::Array(items) => ValueRef::Array(items),
            Value::Object(fields) => ValueRef::Object(fields),
            Value::Node(id) => ValueRef::Node(*id),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    fields: Vec<(String, Value)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

fn find_field<'t>(fields: &'t [(String, Value)], name: &str) -> Option<ValueRef<'t>> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_value_ref())
}

impl Tree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in pre-order.
    pub fn node_ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    /// The node's type tag.
    pub fn kind(&self, id: NodeId) -> &str {
        &self.data(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Child nodes in field order, then array order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn fields(&self, id: NodeId) -> &[(String, Value)] {
        &self.data(id).fields
    }

    pub fn field(&self, id: NodeId, name: &str) -> Option<ValueRef<'_>> {
        find_field(self.fields(id), name)
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&p| self.parent(p))
    }

    /// One step of safe navigation. Nodes and objects look up fields;
    /// arrays accept an index or `length`; strings accept `length`.
    pub fn lookup<'t>(&'t self, from: ValueRef<'t>, segment: &str) -> Option<ValueRef<'t>> {
        match from {
            ValueRef::Node(id) => self.field(id, segment),
            ValueRef::Object(fields) => find_field(fields, segment),
            ValueRef::Array(items) => {
                if segment == "length" {
                    Some(ValueRef::Number(items.len() as f64))
                } else {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index).map(Value::as_value_ref)
                }
            }
            ValueRef::Str(s) if segment == "length" => {
                Some(ValueRef::Number(s.chars().count() as f64))
            }
            _ => None,
        }
    }

    /// Resolve a dotted accessor starting at `node`. `None` means absent.
    pub fn resolve<S: AsRef<str>>(&self, node: NodeId, path: &[S]) -> Option<ValueRef<'_>> {
        path.iter()
            .try_fold(ValueRef::Node(node), |value, segment| {
                self.lookup(value, segment.as_ref())
            })
    }
}
