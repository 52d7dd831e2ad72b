//! Bayes-ball d-separation over a [`Digraph`] known to be a DAG.

use std::collections::VecDeque;

use crate::bitset::Bitset;
use crate::digraph::Digraph;

/// Ancestors of `x` within `dag`, including `x` itself.
fn ancestor_closure(dag: &Digraph, x: &Bitset) -> Bitset {
    let mut anc = *x;
    let mut queue: VecDeque<usize> = x.iter().collect();
    while let Some(v) = queue.pop_front() {
        for parent in dag.edges_in(v).iter() {
            if !anc.contains(parent) {
                anc.add(parent);
                queue.push_back(parent);
            }
        }
    }
    anc
}

/// `a ⟂ b | x` under `dag`'s d-separation semantics.
///
/// Implements the Bayes-ball active-trail search: a BFS over pairs
/// `(prev, cur)` meaning "arrived at `cur` having just come from `prev`".
/// From `(prev, cur)`:
/// - if the traversed edge is `prev -> cur` ("arrived going down"): may
///   continue to `cur`'s children unconditionally unless `cur` is
///   conditioned on (chain/fork continuation is blocked by conditioning);
///   may continue to `cur`'s other parents only if `cur` is an ancestor of
///   `x` (collider activated by conditioning on a descendant).
/// - if the traversed edge is `cur -> prev` ("arrived going up", i.e. `prev`
///   is a child of `cur`): may continue in both directions out of `cur`
///   (fork/chain continuation) unless `cur` is conditioned on.
///
/// `b` is reachable iff some active trail from `a` reaches it; `a` and `b`
/// are d-separated by `x` iff `b` is never reached.
pub fn d_separated(dag: &Digraph, a: usize, x: &Bitset, b: usize) -> bool {
    debug_assert_ne!(a, b);
    debug_assert!(!x.contains(a) && !x.contains(b));

    if dag.has_edge(a, b) || dag.has_edge(b, a) {
        return false;
    }

    let x_ancestors = ancestor_closure(dag, x);

    // visited[y] holds every `prev` for which the pair (prev, y) has been queued.
    let mut visited = vec![Bitset::empty(); dag.vert_count()];
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for y in dag.neighbors(a).iter() {
        if y == b {
            return false;
        }
        visited[y].add(a);
        queue.push_back((a, y));
    }

    while let Some((prev, cur)) = queue.pop_front() {
        let went_down = dag.has_edge(prev, cur);
        let went_up = dag.has_edge(cur, prev);

        let mut push = |dst: usize, visited: &mut Vec<Bitset>, queue: &mut VecDeque<(usize, usize)>| {
            if dst == prev || visited[dst].contains(cur) {
                return false;
            }
            visited[dst].add(cur);
            queue.push_back((cur, dst));
            dst == b
        };

        if went_down {
            if !x.contains(cur) {
                for z in dag.edges_out(cur).iter() {
                    if push(z, &mut visited, &mut queue) {
                        return false;
                    }
                }
            }
            if x_ancestors.contains(cur) {
                for z in dag.edges_in(cur).iter() {
                    if push(z, &mut visited, &mut queue) {
                        return false;
                    }
                }
            }
        }
        if went_up && !x.contains(cur) {
            for z in dag.neighbors(cur).iter() {
                if push(z, &mut visited, &mut queue) {
                    return false;
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dag_from_edges(n: usize, edges: &[(usize, usize)]) -> Digraph {
        let mut d = Digraph::empty(n);
        for &(a, b) in edges {
            d.add_edge(a, b);
        }
        d
    }

    #[test]
    fn adjacent_vertices_are_never_separated() {
        let dag = dag_from_edges(2, &[(0, 1)]);
        assert!(!d_separated(&dag, 0, &Bitset::empty(), 1));
    }

    #[test]
    fn v_structure_blocks_unconditionally_but_opens_on_collider() {
        // 0 -> 2 <- 1
        let dag = dag_from_edges(3, &[(0, 2), (1, 2)]);
        assert!(d_separated(&dag, 0, &Bitset::empty(), 1));
        assert!(!d_separated(&dag, 0, &Bitset::singleton(2), 1));
    }

    #[test]
    fn chain_is_blocked_by_conditioning_on_the_middle() {
        // 0 -> 1 -> 2
        let dag = dag_from_edges(3, &[(0, 1), (1, 2)]);
        assert!(!d_separated(&dag, 0, &Bitset::empty(), 2));
        assert!(d_separated(&dag, 0, &Bitset::singleton(1), 2));
    }

    #[test]
    fn fork_is_blocked_by_conditioning_on_the_common_cause() {
        // 0 <- 1 -> 2
        let dag = dag_from_edges(3, &[(1, 0), (1, 2)]);
        assert!(!d_separated(&dag, 0, &Bitset::empty(), 2));
        assert!(d_separated(&dag, 0, &Bitset::singleton(1), 2));
    }

    #[test]
    fn collider_opens_via_conditioned_descendant() {
        // 0 -> 2 <- 1, 2 -> 3
        let dag = dag_from_edges(4, &[(0, 2), (1, 2), (2, 3)]);
        assert!(d_separated(&dag, 0, &Bitset::empty(), 1));
        assert!(!d_separated(&dag, 0, &Bitset::singleton(3), 1));
    }

    #[test]
    fn diamond_separator_is_the_shared_parent_not_the_shared_child() {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let dag = dag_from_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        // 1 and 2 are not adjacent in the DAG, but an active fork through
        // their common parent 0 keeps them dependent when unconditioned.
        assert!(!d_separated(&dag, 1, &Bitset::empty(), 2));
        // conditioning on the shared parent blocks the fork; the only other
        // path goes through the collider at 3, which stays closed.
        assert!(d_separated(&dag, 1, &Bitset::singleton(0), 2));
        // conditioning on the shared child instead opens the collider too,
        // so 1 and 2 remain dependent.
        assert!(!d_separated(&dag, 1, &Bitset::singleton(3), 2));
    }
}
