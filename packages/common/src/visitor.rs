use pagewright_model::BlockNode;

/// Visitor pattern for walking the derived block tree immutably
///
/// Default implementations walk the entire tree in pre-order. A sibling
/// group is the root list or one node's children; `parent` is `None` for
/// the roots.
pub trait Visitor: Sized {
    fn visit_roots(&mut self, roots: &[BlockNode]) {
        self.visit_siblings(None, roots);
    }

    fn visit_siblings(&mut self, parent: Option<&BlockNode>, siblings: &[BlockNode]) {
        walk_siblings(self, parent, siblings);
    }

    fn visit_node(&mut self, node: &BlockNode) {
        walk_node(self, node);
    }
}

/// Mutable visitor for rewriting nodes in place
///
/// Sibling groups are handed over as `Vec`s so a visitor may reorder them.
pub trait VisitorMut: Sized {
    fn visit_roots_mut(&mut self, roots: &mut Vec<BlockNode>) {
        self.visit_siblings_mut(roots);
    }

    fn visit_siblings_mut(&mut self, siblings: &mut Vec<BlockNode>) {
        walk_siblings_mut(self, siblings);
    }

    fn visit_node_mut(&mut self, node: &mut BlockNode) {
        walk_node_mut(self, node);
    }
}

pub fn walk_siblings<V: Visitor>(visitor: &mut V, _parent: Option<&BlockNode>, siblings: &[BlockNode]) {
    for node in siblings {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &BlockNode) {
    visitor.visit_siblings(Some(node), &node.children);
}

pub fn walk_siblings_mut<V: VisitorMut>(visitor: &mut V, siblings: &mut Vec<BlockNode>) {
    for node in siblings.iter_mut() {
        visitor.visit_node_mut(node);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut BlockNode) {
    visitor.visit_siblings_mut(&mut node.children);
}
