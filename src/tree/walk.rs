use super::{NodeId, Tree};

/// Callbacks for a depth-first walk: `enter_node` in pre-order,
/// `leave_node` in post-order.
pub trait Visit {
    fn enter_node(&mut self, node: NodeId);

    #[allow(unused_variables)]
    fn leave_node(&mut self, node: NodeId) {}
}

impl Tree {
    /// Walk the whole tree depth-first. Uses an explicit stack, so deep
    /// trees do not recurse.
    pub fn walk<V: Visit + ?Sized>(&self, visitor: &mut V) {
        let mut stack = vec![(self.root(), false)];

        while let Some((node, leaving)) = stack.pop() {
            if leaving {
                visitor.leave_node(node);
                continue;
            }
            visitor.enter_node(node);
            stack.push((node, true));
            stack.extend(self.children(node).iter().rev().map(|&child| (child, false)));
        }
    }
}
