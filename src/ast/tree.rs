use crate::ast::{Annotations, GroupNode, NodeId, NodeKind, QueryNode, TermNode};

/// Arena-backed query tree.
///
/// Nodes own nothing; every link is an index. The root is always a group.
/// Detached nodes stay in the arena until the tree is dropped.
#[derive(Debug)]
pub struct QueryAst {
    nodes: Vec<QueryNode>,
    root: NodeId,
    annotations: Annotations,
}

impl Default for QueryAst {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryAst {
    /// Creates a tree holding a single empty root group.
    pub fn new() -> Self {
        QueryAst {
            nodes: vec![QueryNode::group(GroupNode::default())],
            root: NodeId(0),
            annotations: Annotations::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.root == id
    }

    /// Adds a detached node and returns its id.
    pub fn add(&mut self, node: QueryNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(QueryNode {
            parent: None,
            ..node
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &QueryNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut QueryNode {
        &mut self.nodes[id.0]
    }

    pub fn group(&self, id: NodeId) -> Option<&GroupNode> {
        self.node(id).as_group()
    }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut GroupNode> {
        self.node_mut(id).as_group_mut()
    }

    pub fn term(&self, id: NodeId) -> Option<&TermNode> {
        self.node(id).as_term()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.group(id).and_then(|group| group.left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.group(id).and_then(|group| group.right)
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    /// Sets the left slot of `group`, detaching whatever was there.
    pub fn set_left(&mut self, group: NodeId, child: Option<NodeId>) {
        self.set_slot(group, child, true);
    }

    /// Sets the right slot of `group`, detaching whatever was there.
    pub fn set_right(&mut self, group: NodeId, child: Option<NodeId>) {
        self.set_slot(group, child, false);
    }

    fn set_slot(&mut self, group: NodeId, child: Option<NodeId>, left: bool) {
        if self.group(group).is_none() {
            return;
        }
        if let Some(child) = child {
            self.detach(child);
        }
        let Some(slots) = self.group_mut(group) else {
            return;
        };
        let previous = if left {
            std::mem::replace(&mut slots.left, child)
        } else {
            std::mem::replace(&mut slots.right, child)
        };
        if let Some(previous) = previous {
            self.nodes[previous.0].parent = None;
        }
        if let Some(child) = child {
            self.nodes[child.0].parent = Some(group);
        }
    }

    /// Unlinks `id` from its current parent slot, if any.
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        if let Some(group) = self.group_mut(parent) {
            if group.left == Some(id) {
                group.left = None;
            } else if group.right == Some(id) {
                group.right = None;
            }
        }
    }

    /// Puts `replacement` into the slot `id` occupies and detaches `id`.
    ///
    /// Replacing the root makes `replacement` the new root.
    pub fn replace_self(&mut self, id: NodeId, replacement: NodeId) -> NodeId {
        if id == replacement {
            return id;
        }
        self.detach(replacement);
        match self.nodes[id.0].parent.take() {
            Some(parent) => {
                if let Some(group) = self.group_mut(parent) {
                    if group.left == Some(id) {
                        group.left = Some(replacement);
                    } else if group.right == Some(id) {
                        group.right = Some(replacement);
                    }
                }
                self.nodes[replacement.0].parent = Some(parent);
            }
            None if self.root == id => self.root = replacement,
            None => {}
        }
        replacement
    }

    /// Detaches `id` from its parent and returns the parent.
    ///
    /// The root cannot be removed; `None` is returned for it and for nodes
    /// that are already detached.
    pub fn remove_self(&mut self, id: NodeId) -> Option<NodeId> {
        if self.is_root(id) {
            return None;
        }
        let parent = self.nodes[id.0].parent;
        self.detach(id);
        parent
    }

    /// Wraps `id` in `wrapper` (a group), placing `id` in the wrapper's left
    /// slot. The wrapper takes over `id`'s position.
    pub fn wrap(&mut self, id: NodeId, wrapper: NodeId) -> NodeId {
        self.replace_self(id, wrapper);
        self.set_left(wrapper, Some(id));
        wrapper
    }

    /// Left and right slots of a group, in that order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + use<> {
        let (left, right) = match self.group(id) {
            Some(group) => (group.left, group.right),
            None => (None, None),
        };
        left.into_iter().chain(right)
    }

    /// Logical clause sequence of a group.
    ///
    /// Walks the right-leaning chain, stepping through plain link groups
    /// (no parens, field, negation or modifiers) so `a b c` yields three
    /// clauses rather than `a` and the group holding `b c`.
    pub fn sequence(&self, id: NodeId) -> Sequence<'_> {
        let mut pending = Vec::new();
        if let Some(group) = self.group(id) {
            pending.extend(group.right);
            pending.extend(group.left);
        }
        Sequence { ast: self, pending }
    }

    /// True for groups that only exist to link a sequence together.
    pub fn is_link_group(&self, id: NodeId) -> bool {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Group(group) => {
                !group.has_parens
                    && node.field.is_none()
                    && !node.negation.is_explicit()
                    && !node.has_modifiers()
                    && !self.is_root(id)
            }
            _ => false,
        }
    }

    /// Every id reachable from `id`, parents before children.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            let children: Vec<NodeId> = self.children(current).collect();
            stack.extend(children.into_iter().rev());
        }
        result
    }

    /// Copies the subtree at `id` into a fresh detached subtree of this tree.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        let (left, right) = match node.as_group_mut() {
            Some(group) => (group.left.take(), group.right.take()),
            None => (None, None),
        };
        let copy = self.add(node);
        if let Some(left) = left {
            let child = self.clone_subtree(left);
            self.set_left(copy, Some(child));
        }
        if let Some(right) = right {
            let child = self.clone_subtree(right);
            self.set_right(copy, Some(child));
        }
        copy
    }

    /// Copies the subtree at `id` of `other` into this tree, detached.
    ///
    /// Annotations are not carried over.
    pub fn import(&mut self, other: &QueryAst, id: NodeId) -> NodeId {
        let mut node = other.node(id).clone();
        let (left, right) = match node.as_group_mut() {
            Some(group) => (group.left.take(), group.right.take()),
            None => (None, None),
        };
        let copy = self.add(node);
        if let Some(left) = left {
            let child = self.import(other, left);
            self.set_left(copy, Some(child));
        }
        if let Some(right) = right {
            let child = self.import(other, right);
            self.set_right(copy, Some(child));
        }
        copy
    }
}

/// Iterator returned by [`QueryAst::sequence`].
pub struct Sequence<'a> {
    ast: &'a QueryAst,
    pending: Vec<NodeId>,
}

impl Iterator for Sequence<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.pending.pop() {
            if self.ast.is_link_group(id) {
                let group = self.ast.group(id)?;
                self.pending.extend(group.right);
                self.pending.extend(group.left);
                continue;
            }
            return Some(id);
        }
        None
    }
}
