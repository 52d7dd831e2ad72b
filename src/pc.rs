//! The PC algorithm: a baseline comparator consuming the same [`Oracle`]
//! interface as the treewidth-aware engine, included only so that
//! query-complexity comparisons have something na\u{ef}ve to compare against.
//! Unlike the treewidth engine it never computes a tree decomposition or a
//! treewidth number — it thins the complete graph directly.

use crate::bitset::Bitset;
use crate::cpdag::{orient_cpdag, Cpdag};
use crate::graph::Graph;
use crate::oracle::{Oracle, OracleError};
use crate::skeleton::EdgeSeparator;

/// Runs PC-stable skeleton discovery followed by the same v-structure +
/// Meek closure the treewidth engine uses, and returns the resulting CPDAG
/// and the separators that thinned the skeleton.
///
/// Starts from the complete graph; for increasing conditioning-set size `l
/// = 0, 1, 2, ...`, every still-adjacent pair `(a, b)` is tested against
/// every size-`l` subset of `adj(a) \ {b}` (the adjacency as of the start of
/// this round, per the PC-stable convention — edges removed mid-round do
/// not change other pairs' conditioning sets within the same round).
/// Stops once no remaining adjacency has at least `l` neighbors left to
/// condition on.
pub fn run_pc(oracle: &mut Oracle) -> Result<(Cpdag, Vec<EdgeSeparator>), OracleError> {
    let n = oracle.vert_count();
    let mut skeleton = Graph::complete(n);
    let mut separators = Vec::new();
    let mut l = 0usize;

    loop {
        let adjacency_snapshot: Vec<Bitset> = (0..n).map(|v| skeleton.neighbors(v)).collect();
        let mut any_pair_had_enough_neighbors = false;

        for a in 0..n {
            for b in (a + 1)..n {
                if !skeleton.has_edge(a, b) {
                    continue;
                }
                let candidates = adjacency_snapshot[a].without(b);
                if candidates.count() < l {
                    continue;
                }
                any_pair_had_enough_neighbors = true;

                for x in candidates.subsets_of_size(l) {
                    if oracle.ind_test(a, x, b)? {
                        skeleton.remove_edge(a, b);
                        separators.push(EdgeSeparator { a, b, x });
                        break;
                    }
                }
            }
        }

        if !any_pair_had_enough_neighbors {
            break;
        }
        l += 1;
    }

    log::info!("PC skeleton discovery finished at conditioning-set size {l}");
    let cpdag = orient_cpdag(&skeleton, &separators);
    Ok((cpdag, separators))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::digraph::Digraph;

    fn graphical_oracle(n: usize, edges: &[(usize, usize)]) -> Oracle {
        let mut dag = Digraph::empty(n);
        for &(a, b) in edges {
            dag.add_edge(a, b);
        }
        Oracle::new_graphical(dag, Duration::from_secs(30))
    }

    #[test]
    fn v_structure_skeleton_and_orientation() {
        let mut oracle = graphical_oracle(3, &[(0, 2), (1, 2)]);
        let (cpdag, separators) = run_pc(&mut oracle).unwrap();
        assert!(cpdag.has_directed_edge(0, 2));
        assert!(cpdag.has_directed_edge(1, 2));
        assert!(!cpdag.has_edge(0, 1) && !cpdag.has_edge(1, 0));
        assert_eq!(separators.len(), 1);
    }

    #[test]
    fn chain_stays_fully_bidirected() {
        let mut oracle = graphical_oracle(3, &[(0, 1), (1, 2)]);
        let (cpdag, _) = run_pc(&mut oracle).unwrap();
        assert!(cpdag.has_edge(0, 1) && cpdag.has_edge(1, 0));
        assert!(cpdag.has_edge(1, 2) && cpdag.has_edge(2, 1));
        assert!(!cpdag.has_edge(0, 2) && !cpdag.has_edge(2, 0));
    }

    #[test]
    fn disjoint_edges_are_independent_components() {
        let mut oracle = graphical_oracle(4, &[(0, 1), (2, 3)]);
        let (cpdag, _) = run_pc(&mut oracle).unwrap();
        assert!(cpdag.has_edge(0, 1) && cpdag.has_edge(1, 0));
        assert!(cpdag.has_edge(2, 3) && cpdag.has_edge(3, 2));
        assert!(!cpdag.has_edge(0, 2) && !cpdag.has_edge(1, 3));
    }
}
