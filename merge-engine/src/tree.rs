//! Core tree model for the merge engine.
//!
//! Source files are represented as featherweight syntax trees with two node
//! kinds: **terminals** (leaves carrying a raw source fragment, e.g. a whole
//! method declaration) and **non-terminals** (containers such as a class or
//! the compilation unit). Nodes live in an arena and reference each other by
//! index, which gives us stable identities for the merge bookkeeping and
//! sidesteps parent/child reference cycles.

use std::fmt;

/// Unique identifier of a node within a [`NodeArena`].
pub type NodeId = usize;

/// Which input revision a node was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Left,
    Base,
    Right,
}

/// Controls whether a terminal's body takes part in textual merging.
///
/// `Default` leaves (punctuation-like terminals, import declarations) are
/// matched by identity only and never merged textually; `ConflictMerge`
/// leaves (method bodies, field declarations) get their three contributions
/// spliced and handed to the textual merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergingMechanism {
    #[default]
    Default,
    ConflictMerge,
}

/// Payload distinguishing terminals from non-terminals.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Terminal {
        /// Main source fragment, e.g. a full method declaration.
        body: String,
        /// Special token prefix: comments and whitespace leading the fragment.
        prefix: String,
        mechanism: MergingMechanism,
    },
    NonTerminal {
        children: Vec<NodeId>,
    },
}

/// A single tree node. Identity for matching purposes is `(node_type, name)`.
#[derive(Debug, Clone)]
pub struct Node {
    pub node_type: String,
    pub name: String,
    /// Origin revision; `None` until stamped or inherited during
    /// superimposition.
    pub origin: Option<Origin>,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node_type, self.name)
    }
}

/// Arena owning every node of every tree in a merge run.
///
/// All three input trees, both superimposition passes and every clone they
/// spawn share one arena, so a [`NodeId`] is a run-wide stable identity.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

const NO_CHILDREN: &[NodeId] = &[];

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn new_terminal(
        &mut self,
        node_type: impl Into<String>,
        name: impl Into<String>,
        body: impl Into<String>,
        prefix: impl Into<String>,
        mechanism: MergingMechanism,
    ) -> NodeId {
        self.alloc(Node {
            node_type: node_type.into(),
            name: name.into(),
            origin: None,
            parent: None,
            kind: NodeKind::Terminal {
                body: body.into(),
                prefix: prefix.into(),
                mechanism,
            },
        })
    }

    pub fn new_non_terminal(
        &mut self,
        node_type: impl Into<String>,
        name: impl Into<String>,
    ) -> NodeId {
        self.alloc(Node {
            node_type: node_type.into(),
            name: name.into(),
            origin: None,
            parent: None,
            kind: NodeKind::NonTerminal {
                children: Vec::new(),
            },
        })
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.nodes[id].is_terminal()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id].kind {
            NodeKind::NonTerminal { children } => children,
            NodeKind::Terminal { .. } => NO_CHILDREN,
        }
    }

    /// Appends `child` to `parent`'s child list and links it back.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let NodeKind::NonTerminal { children } = &mut self.nodes[parent].kind {
            children.push(child);
        }
        self.nodes[child].parent = Some(parent);
    }

    /// Inserts `child` at `index` in `parent`'s child list.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let NodeKind::NonTerminal { children } = &mut self.nodes[parent].kind {
            let index = index.min(children.len());
            children.insert(index, child);
        }
        self.nodes[child].parent = Some(parent);
    }

    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Detaches `id` from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent {
            if let NodeKind::NonTerminal { children } = &mut self.nodes[parent].kind {
                children.retain(|&c| c != id);
            }
            self.nodes[id].parent = None;
        }
    }

    /// Walks the parent chain and reports whether `id` is still part of the
    /// tree rooted at `root`.
    pub fn is_attached_under(&self, id: NodeId, root: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == root {
                return true;
            }
            match self.nodes[cur].parent {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    pub fn body(&self, id: NodeId) -> &str {
        match &self.nodes[id].kind {
            NodeKind::Terminal { body, .. } => body,
            NodeKind::NonTerminal { .. } => "",
        }
    }

    pub fn set_body(&mut self, id: NodeId, new_body: impl Into<String>) {
        if let NodeKind::Terminal { body, .. } = &mut self.nodes[id].kind {
            *body = new_body.into();
        }
    }

    pub fn prefix(&self, id: NodeId) -> &str {
        match &self.nodes[id].kind {
            NodeKind::Terminal { prefix, .. } => prefix,
            NodeKind::NonTerminal { .. } => "",
        }
    }

    pub fn set_prefix(&mut self, id: NodeId, new_prefix: impl Into<String>) {
        if let NodeKind::Terminal { prefix, .. } = &mut self.nodes[id].kind {
            *prefix = new_prefix.into();
        }
    }

    pub fn mechanism(&self, id: NodeId) -> MergingMechanism {
        match &self.nodes[id].kind {
            NodeKind::Terminal { mechanism, .. } => *mechanism,
            NodeKind::NonTerminal { .. } => MergingMechanism::Default,
        }
    }

    /// Clones the node's scalar attributes into a fresh, unparented node.
    ///
    /// A terminal's body and prefix are scalars and survive the clone; a
    /// non-terminal's children do not.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId {
        let mut clone = self.nodes[id].clone();
        clone.parent = None;
        if let NodeKind::NonTerminal { children } = &mut clone.kind {
            children.clear();
        }
        self.alloc(clone)
    }

    /// Clones the whole subtree into fresh ids; the clone root is unparented.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let mut clone = self.nodes[id].clone();
        clone.parent = None;
        match &mut clone.kind {
            NodeKind::Terminal { .. } => self.alloc(clone),
            NodeKind::NonTerminal { children } => {
                let original_children = std::mem::take(children);
                let clone_id = self.alloc(clone);
                for child in original_children {
                    let child_clone = self.deep_clone(child);
                    self.add_child(clone_id, child_clone);
                }
                clone_id
            }
        }
    }

    /// Stamps `origin` on `id` and its whole subtree.
    pub fn set_origin_recursive(&mut self, id: NodeId, origin: Origin) {
        self.nodes[id].origin = Some(origin);
        let children = self.children(id).to_vec();
        for child in children {
            self.set_origin_recursive(child, origin);
        }
    }

    /// All terminal descendants of `id` in depth-first order (including `id`
    /// itself when it is a terminal).
    pub fn descendant_terminals(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_terminals(id, &mut out);
        out
    }

    fn collect_terminals(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if self.is_terminal(id) {
            out.push(id);
            return;
        }
        for &child in self.children(id) {
            self.collect_terminals(child, out);
        }
    }
}
