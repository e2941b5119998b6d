//! Node matching for superimposition.
//!
//! Two nodes correspond when they agree on structural *and* nominal identity:
//! same node type, same name. Child lookup is a linear first-match scan —
//! parents have few children and the placement heuristics in the
//! superimposer depend on child order being preserved.

use crate::tree::{NodeArena, NodeId};

/// Structural/nominal compatibility: equal `(node_type, name)`.
pub fn compatible(arena: &NodeArena, a: NodeId, b: NodeId) -> bool {
    let (na, nb) = (arena.node(a), arena.node(b));
    na.node_type == nb.node_type && na.name == nb.name
}

/// First child of `parent` compatible with `query`, if any.
pub fn get_compatible_child(arena: &NodeArena, parent: NodeId, query: NodeId) -> Option<NodeId> {
    arena
        .children(parent)
        .iter()
        .copied()
        .find(|&child| compatible(arena, child, query))
}

/// First child of `parent` with the same `(node_type, name)` as `reference`,
/// returned by position. Used to re-locate a node's counterpart after the
/// superimposer has rebuilt a child list from clones.
pub fn find_child_like(arena: &NodeArena, parent: NodeId, reference: NodeId) -> Option<usize> {
    arena
        .children(parent)
        .iter()
        .position(|&child| compatible(arena, child, reference))
}
