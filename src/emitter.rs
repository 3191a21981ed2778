use crate::tree::NodeId;

/// Receives `(pattern, node)` events from a traversal. `name` is the
/// pattern exactly as registered, including any `:exit` suffix.
pub trait Emitter {
    fn emit(&mut self, name: &str, node: NodeId);
}

impl<F> Emitter for F
where
    F: FnMut(&str, NodeId),
{
    fn emit(&mut self, name: &str, node: NodeId) {
        self(name, node)
    }
}

/// Collects every event in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recorder {
    pub events: Vec<(String, NodeId)>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes emitted under `name`, in emission order.
    pub fn nodes_for(&self, name: &str) -> Vec<NodeId> {
        self.events
            .iter()
            .filter(|(n, _)| n == name)
            .map(|&(_, node)| node)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Emitter for Recorder {
    fn emit(&mut self, name: &str, node: NodeId) {
        self.events.push((name.to_string(), node));
    }
}
