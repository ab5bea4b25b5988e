//! Parent/child hierarchy validation for requirements.
//!
//! Reparenting is validated by walking the ancestor chain of the proposed
//! parent. The walk carries an explicit visited set, so it terminates even
//! when the stored data already contains a cycle. A whole-workspace audit
//! built on `petgraph` reports any such pre-existing cycles.

use std::collections::HashSet;

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use thiserror::Error;

use crate::domain::ids::RequirementId;

/// Errors raised when a proposed parent link is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The requirement was proposed as its own parent.
    #[error("requirement {0} cannot be its own parent")]
    SelfParent(RequirementId),
    /// The requirement appears in the ancestor chain of the proposed parent.
    #[error("requirement {child} is an ancestor of {parent}; linking would create a cycle")]
    Cycle {
        /// The requirement being reparented.
        child: RequirementId,
        /// The proposed parent.
        parent: RequirementId,
    },
    /// The existing ancestor chain revisited a requirement — the stored
    /// hierarchy is already cyclic.
    #[error("ancestor chain of {0} revisits a requirement; stored hierarchy is corrupt")]
    CorruptChain(RequirementId),
}

/// Checks whether `child` may be reparented under `parent`.
///
/// `parent_of` resolves a requirement's current parent; returning `None`
/// ends the chain. Unknown ids resolve to `None`, so a dangling parent link
/// behaves like a root.
///
/// # Errors
///
/// Returns [`HierarchyError::SelfParent`] when `child == parent`,
/// [`HierarchyError::Cycle`] when `child` is found in the ancestor chain of
/// `parent`, and [`HierarchyError::CorruptChain`] when the existing chain
/// revisits a node.
pub fn check_reparent<P>(
    child: RequirementId,
    parent: RequirementId,
    parent_of: P,
) -> Result<(), HierarchyError>
where
    P: Fn(RequirementId) -> Option<RequirementId>,
{
    if child == parent {
        return Err(HierarchyError::SelfParent(child));
    }

    let mut visited = HashSet::new();
    let mut current = Some(parent);

    while let Some(ancestor) = current {
        if ancestor == child {
            return Err(HierarchyError::Cycle { child, parent });
        }
        if !visited.insert(ancestor) {
            return Err(HierarchyError::CorruptChain(parent));
        }
        current = parent_of(ancestor);
    }

    Ok(())
}

/// Reports all cycles among the given child→parent edges.
///
/// Each cycle is returned as a sorted list of the requirement ids involved.
/// The result itself is sorted, so the report is deterministic.
#[must_use]
pub fn audit<I>(edges: I) -> Vec<Vec<RequirementId>>
where
    I: IntoIterator<Item = (RequirementId, RequirementId)>,
{
    let mut graph: DiGraphMap<RequirementId, ()> = DiGraphMap::new();
    for (child, parent) in edges {
        graph.add_edge(child, parent, ());
    }

    let mut cycles = Vec::new();

    for component in tarjan_scc(&graph) {
        if component.len() > 1 {
            let mut ids = component;
            ids.sort_unstable();
            cycles.push(ids);
            continue;
        }

        let Some(&node) = component.first() else {
            continue;
        };

        if graph.contains_edge(node, node) {
            cycles.push(vec![node]);
        }
    }

    cycles.sort();
    cycles
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn id(raw: i64) -> RequirementId {
        RequirementId::new(raw)
    }

    fn lookup(parents: Vec<(i64, i64)>) -> impl Fn(RequirementId) -> Option<RequirementId> {
        let map: HashMap<i64, i64> = parents.into_iter().collect();
        move |r| map.get(&r.raw()).copied().map(RequirementId::new)
    }

    #[test]
    fn accepts_reparent_to_unrelated_requirement() {
        // B's parent is A; C is unrelated.
        let parent_of = lookup(vec![(2, 1)]);
        assert_eq!(check_reparent(id(3), id(2), parent_of), Ok(()));
    }

    #[test]
    fn rejects_self_parent() {
        let parent_of = lookup(Vec::new());
        assert_eq!(
            check_reparent(id(1), id(1), parent_of),
            Err(HierarchyError::SelfParent(id(1)))
        );
    }

    #[test]
    fn rejects_ancestor_cycle() {
        // Chain A→B→C: C's parent is B, B's parent is A.
        // Reparenting A under C would close the loop.
        let parent_of = lookup(vec![(3, 2), (2, 1)]);
        assert_eq!(
            check_reparent(id(1), id(3), parent_of),
            Err(HierarchyError::Cycle {
                child: id(1),
                parent: id(3),
            })
        );
    }

    #[test]
    fn deep_chains_are_walked_to_the_root() {
        let parents: Vec<(i64, i64)> = (2..=10_000).map(|n| (n, n - 1)).collect();
        let parent_of = lookup(parents);
        assert_eq!(check_reparent(id(20_000), id(10_000), parent_of), Ok(()));
    }

    #[test]
    fn terminates_on_pre_existing_corrupt_cycle() {
        // 2 and 3 already form a cycle that does not involve the child.
        let parent_of = lookup(vec![(2, 3), (3, 2)]);
        assert_eq!(
            check_reparent(id(1), id(2), parent_of),
            Err(HierarchyError::CorruptChain(id(2)))
        );
    }

    #[test]
    fn dangling_parent_ends_the_chain() {
        // 2's parent 99 does not exist.
        let parent_of = lookup(vec![(2, 99)]);
        assert_eq!(check_reparent(id(1), id(2), parent_of), Ok(()));
    }

    #[test]
    fn audit_finds_no_cycles_in_a_tree() {
        let cycles = audit([(id(2), id(1)), (id(3), id(1)), (id(4), id(2))]);
        assert!(cycles.is_empty());
    }

    #[test]
    fn audit_reports_cycle_members_sorted() {
        let cycles = audit([(id(3), id(2)), (id(2), id(3)), (id(5), id(5))]);
        assert_eq!(cycles, vec![vec![id(2), id(3)], vec![id(5)]]);
    }
}
