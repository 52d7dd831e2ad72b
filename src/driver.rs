//! Top-level reconstruction driver: partitions vertices into
//! marginal-independence components, decomposes each with the treewidth
//! engine, extracts a skeleton, and orients the CPDAG.

use std::time::Duration;

use crate::bitset::Bitset;
use crate::cpdag::{orient_cpdag, Cpdag};
use crate::oracle::{Oracle, OracleError};
use crate::skeleton::{extract_skeleton, EdgeSeparator};
use crate::treewidth::{decompose_component, TreeDecomposition};

/// Run parameters for a reconstruction; the seam a CLI (out of scope here)
/// would populate.
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    pub time_limit: Duration,
}

impl RunConfig {
    pub fn new(time_limit: Duration) -> Self {
        RunConfig { time_limit }
    }
}

/// A completed structure-learning result.
#[derive(Clone, Debug)]
pub struct Reconstruction {
    pub cpdag: Cpdag,
    pub decompositions: Vec<TreeDecomposition>,
    pub separators: Vec<EdgeSeparator>,
    pub treewidth: usize,
}

/// The driver's own outcome type: callers distinguish a completed run from a
/// time-limit abort without matching on an `Err` for what is a normal,
/// policy-level outcome rather than a programming error.
#[derive(Clone, Debug)]
pub enum ReconstructOutcome {
    Success(Reconstruction),
    Timeout,
}

/// Partitions `0..oracle.vert_count()` into marginal-independence
/// components: `v` joins a component `c` iff `ind_test(v, ∅, u)` is false
/// (dependent) for some `u` already in `c`; components linked through `v`
/// are merged. Runs in `O(V^2)` marginal tests.
fn partition_components(oracle: &mut Oracle) -> Result<Vec<Bitset>, OracleError> {
    let n = oracle.vert_count();
    let mut components: Vec<Bitset> = Vec::new();

    for v in 0..n {
        let mut joined: Vec<usize> = Vec::new();
        for (i, comp) in components.iter().enumerate() {
            let mut dependent = false;
            for u in comp.iter() {
                if !oracle.ind_test(v.min(u), Bitset::empty(), v.max(u))? {
                    dependent = true;
                    break;
                }
            }
            if dependent {
                joined.push(i);
            }
        }

        let mut merged = Bitset::singleton(v);
        for &i in joined.iter().rev() {
            merged.union_with(&components.remove(i));
        }
        components.push(merged);
    }

    Ok(components)
}

/// Runs the full treewidth-aware reconstruction: partitions into
/// independent components, decomposes each, extracts the skeleton, and
/// closes the CPDAG. Returns [`ReconstructOutcome::Timeout`] instead of
/// propagating [`OracleError`] when the oracle's time limit is hit, since a
/// timeout is a normal (if incomplete) outcome, not a programming error.
pub fn reconstruct_bayesian_network(oracle: &mut Oracle) -> ReconstructOutcome {
    match reconstruct_inner(oracle) {
        Ok(r) => ReconstructOutcome::Success(r),
        Err(OracleError::TimeLimitExceeded) => ReconstructOutcome::Timeout,
    }
}

fn reconstruct_inner(oracle: &mut Oracle) -> Result<Reconstruction, OracleError> {
    let components = partition_components(oracle)?;
    log::info!("partitioned {} vertices into {} components", oracle.vert_count(), components.len());

    let mut decompositions = Vec::with_capacity(components.len());
    let mut treewidth = 0usize;
    for comp in &components {
        let (td, k) = decompose_component(oracle, *comp)?;
        log::info!("component {:?} decomposed at width {k}", comp);
        treewidth = treewidth.max(k);
        decompositions.push(td);
    }

    let (skeleton, separators) = extract_skeleton(oracle, &decompositions)?;
    let cpdag = orient_cpdag(&skeleton, &separators);

    Ok(Reconstruction { cpdag, decompositions, separators, treewidth })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digraph::Digraph;

    fn graphical_oracle(n: usize, edges: &[(usize, usize)]) -> Oracle {
        let mut dag = Digraph::empty(n);
        for &(a, b) in edges {
            dag.add_edge(a, b);
        }
        Oracle::new_graphical(dag, Duration::from_secs(30))
    }

    fn success(oracle: &mut Oracle) -> Reconstruction {
        match reconstruct_bayesian_network(oracle) {
            ReconstructOutcome::Success(r) => r,
            ReconstructOutcome::Timeout => panic!("expected success, got timeout"),
        }
    }

    #[test]
    fn scenario_1_single_edge_stays_bidirected() {
        let mut oracle = graphical_oracle(2, &[(0, 1)]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 1);
        assert!(r.cpdag.has_edge(0, 1) && r.cpdag.has_edge(1, 0));
        assert_eq!(oracle.query_count_by_separator_size()[0], 1);
    }

    #[test]
    fn scenario_2_v_structure_orients_both_edges() {
        let mut oracle = graphical_oracle(3, &[(0, 2), (1, 2)]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 2);
        assert!(r.cpdag.has_directed_edge(0, 2));
        assert!(r.cpdag.has_directed_edge(1, 2));
        assert!(!r.cpdag.has_edge(0, 1) && !r.cpdag.has_edge(1, 0));
        assert_eq!(r.separators.len(), 1);
        assert_eq!((r.separators[0].a, r.separators[0].b), (0, 1));
        assert!(r.separators[0].x.is_empty());
    }

    #[test]
    fn scenario_3_chain_has_no_v_structure() {
        let mut oracle = graphical_oracle(3, &[(0, 1), (1, 2)]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 1);
        assert!(r.cpdag.has_edge(0, 1) && r.cpdag.has_edge(1, 0));
        assert!(r.cpdag.has_edge(1, 2) && r.cpdag.has_edge(2, 1));
        assert!(!r.cpdag.has_edge(0, 2) && !r.cpdag.has_edge(2, 0));
        assert_eq!(r.separators.len(), 1);
        assert_eq!((r.separators[0].a, r.separators[0].b), (0, 2));
        assert!(r.separators[0].x.contains(1));
    }

    #[test]
    fn scenario_4_diamond_leaves_top_triangle_bidirected() {
        let mut oracle = graphical_oracle(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 2);
        assert!(r.cpdag.has_directed_edge(1, 3));
        assert!(r.cpdag.has_directed_edge(2, 3));
        assert!(r.cpdag.has_edge(0, 1) && r.cpdag.has_edge(1, 0));
        assert!(r.cpdag.has_edge(0, 2) && r.cpdag.has_edge(2, 0));
        assert!(!r.cpdag.has_edge(1, 2) && !r.cpdag.has_edge(2, 1));
    }

    #[test]
    fn scenario_5_disjoint_edges_become_two_components() {
        let mut oracle = graphical_oracle(4, &[(0, 1), (2, 3)]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 1);
        assert_eq!(r.decompositions.len(), 2);
        assert!(r.cpdag.has_edge(0, 1) && r.cpdag.has_edge(1, 0));
        assert!(r.cpdag.has_edge(2, 3) && r.cpdag.has_edge(3, 2));
        assert!(!r.cpdag.has_edge(0, 2) && !r.cpdag.has_edge(1, 3));
    }

    #[test]
    fn scenario_6_empty_dag_is_five_singleton_components() {
        let mut oracle = graphical_oracle(5, &[]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 0);
        assert_eq!(r.decompositions.len(), 5);
        for a in 0..5 {
            for b in 0..5 {
                if a != b {
                    assert!(!r.cpdag.has_edge(a, b));
                }
            }
        }
    }

    #[test]
    fn boundary_zero_vertices() {
        let mut oracle = graphical_oracle(0, &[]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 0);
        assert!(r.decompositions.is_empty());
    }

    #[test]
    fn boundary_one_vertex_needs_no_queries() {
        let mut oracle = graphical_oracle(1, &[]);
        let r = success(&mut oracle);
        assert_eq!(r.treewidth, 0);
        assert_eq!(r.decompositions.len(), 1);
        assert_eq!(oracle.query_count_by_separator_size().iter().sum::<u64>(), 0);
    }

    #[test]
    fn zero_time_limit_surfaces_as_timeout() {
        let mut oracle = graphical_oracle(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)]);
        // Replace with a zero-budget oracle over the same DAG.
        let mut dag = Digraph::empty(6);
        for &(a, b) in &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5)] {
            dag.add_edge(a, b);
        }
        let mut zero_budget = Oracle::new_graphical(dag, Duration::from_secs(0));
        match reconstruct_bayesian_network(&mut zero_budget) {
            ReconstructOutcome::Timeout => {}
            ReconstructOutcome::Success(_) => panic!("expected timeout with zero time budget"),
        }
        // The original oracle (generous budget) still succeeds, confirming
        // the timeout above came from the budget, not the input.
        let _ = success(&mut oracle);
    }

    #[test]
    fn separator_size_never_exceeds_treewidth_plus_one() {
        let mut oracle = graphical_oracle(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let r = success(&mut oracle);
        assert!(oracle.max_queried_separator_size() <= r.treewidth + 1);
    }

    #[test]
    fn idempotent_reconstruction_on_a_fresh_oracle() {
        let edges = [(0, 1), (0, 2), (1, 3), (2, 3)];
        let mut first = graphical_oracle(4, &edges);
        let mut second = graphical_oracle(4, &edges);
        let a = success(&mut first);
        let b = success(&mut second);
        assert_eq!(a.treewidth, b.treewidth);
        for x in 0..4 {
            for y in 0..4 {
                assert_eq!(a.cpdag.has_edge(x, y), b.cpdag.has_edge(x, y));
            }
        }
    }
}
