//! Recovers the undirected skeleton from a set of tree decompositions by
//! proposing an edge for every pair that ever shares a bag, then thinning
//! with minimal separator searches confined to bags.

use crate::bitset::Bitset;
use crate::graph::Graph;
use crate::oracle::{Oracle, OracleError};
use crate::treewidth::TreeDecomposition;

/// A non-adjacent pair certified by a conditioning set found within some
/// bag: `a ⟂ b | x`.
#[derive(Clone, Copy, Debug)]
pub struct EdgeSeparator {
    pub a: usize,
    pub b: usize,
    pub x: Bitset,
}

/// Keeps only bags that are not a subset (proper or equal-but-duplicate) of
/// any other bag in the list.
fn maximal_bags(bags: &[Bitset]) -> Vec<Bitset> {
    let mut maximal = Vec::new();
    'outer: for (i, &bag) in bags.iter().enumerate() {
        for (j, &other) in bags.iter().enumerate() {
            if i == j {
                continue;
            }
            let subsumed = bag.is_subset_of(&other) && (bag != other || j < i);
            if subsumed {
                continue 'outer;
            }
        }
        maximal.push(bag);
    }
    maximal
}

/// Recovers the undirected skeleton and the separators used to thin it.
///
/// For each proposed edge `(a, b)`, scans maximal bags containing `a` or
/// `b`; for the first bag whose `bag \ {a, b}` yields a nonempty subset `x`
/// with `ind_test(a, x, b)` true, the edge is deleted and `(a, b, x)`
/// recorded. Soundness relies on the tree-decomposition invariants: if `a`
/// and `b` are truly non-adjacent, some valid separator lies inside a bag
/// adjacent to (or shared with) both.
pub fn extract_skeleton(
    oracle: &mut Oracle,
    decompositions: &[TreeDecomposition],
) -> Result<(Graph, Vec<EdgeSeparator>), OracleError> {
    let bags: Vec<Bitset> = decompositions.iter().flat_map(|d| d.bags().copied()).collect();
    let maximal = maximal_bags(&bags);

    let mut skeleton = Graph::empty(oracle.vert_count());
    for bag in &maximal {
        let members: Vec<usize> = bag.iter().collect();
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                skeleton.add_edge(members[i], members[j]);
            }
        }
    }

    let mut separators = Vec::new();
    for (a, b) in skeleton.edges() {
        let mut removed = false;
        for bag in &maximal {
            if !bag.contains(a) && !bag.contains(b) {
                continue;
            }
            let candidates = bag.without(a).without(b);
            if candidates.is_empty() {
                continue;
            }
            for x in candidates.subsets() {
                if oracle.ind_test(a, x, b)? {
                    skeleton.remove_edge(a, b);
                    separators.push(EdgeSeparator { a, b, x });
                    removed = true;
                    break;
                }
            }
            if removed {
                break;
            }
        }
    }

    Ok((skeleton, separators))
}
