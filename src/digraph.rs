//! Directed graphs with independent in/out adjacency, used to represent both
//! true DAGs (graphical oracle back-end) and partially-oriented CPDAGs (the
//! output of [`crate::cpdag`]), where a *bidirected* pair stands in for an
//! as-yet-undirected edge.

use crate::bitset::Bitset;

/// A directed graph on vertices `0..vert_count`.
///
/// `has_edge(a, b)` means `a -> b` is present. A *bidirected* edge, i.e. both
/// `a -> b` and `b -> a` present, encodes "undirected but not yet oriented"
/// for the CPDAG representation; a DAG back-end never has bidirected edges.
#[derive(Clone, Debug)]
pub struct Digraph {
    vert_count: usize,
    out: Vec<Bitset>,
    inn: Vec<Bitset>,
}

impl Digraph {
    pub fn empty(vert_count: usize) -> Self {
        Digraph {
            vert_count,
            out: vec![Bitset::empty(); vert_count],
            inn: vec![Bitset::empty(); vert_count],
        }
    }

    #[inline]
    pub fn vert_count(&self) -> usize {
        self.vert_count
    }

    #[inline]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.out[a].contains(b)
    }

    /// Idempotent: adding `a -> b` twice has the same effect as once.
    pub fn add_edge(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b, "no self-loops");
        self.out[a].add(b);
        self.inn[b].add(a);
    }

    pub fn remove_edge(&mut self, a: usize, b: usize) {
        debug_assert_ne!(a, b, "no self-loops");
        self.out[a].del(b);
        self.inn[b].del(a);
    }

    /// `{ v : v -> a }`.
    #[inline]
    pub fn edges_in(&self, a: usize) -> Bitset {
        self.inn[a]
    }

    /// `{ v : a -> v }`.
    #[inline]
    pub fn edges_out(&self, a: usize) -> Bitset {
        self.out[a]
    }

    /// In-neighbors that are not also out-neighbors: `x -> a` oriented into `a`.
    #[inline]
    pub fn edges_only_in(&self, a: usize) -> Bitset {
        self.inn[a].minus(&self.out[a])
    }

    /// Out-neighbors that are not also in-neighbors: `a -> x` oriented out of `a`.
    #[inline]
    pub fn edges_only_out(&self, a: usize) -> Bitset {
        self.out[a].minus(&self.inn[a])
    }

    /// `in ∪ out`: every vertex adjacent to `a` regardless of direction.
    #[inline]
    pub fn neighbors(&self, a: usize) -> Bitset {
        self.inn[a].union(&self.out[a])
    }

    /// `in ∩ out`: vertices bidirected (undirected) with `a`.
    #[inline]
    pub fn bidir_neighbors(&self, a: usize) -> Bitset {
        self.inn[a].intersection(&self.out[a])
    }

    /// True iff `a -> b` is present and `b -> a` is not, i.e. the edge
    /// between `a` and `b` is oriented (not bidirected).
    #[inline]
    pub fn has_directed_edge(&self, a: usize, b: usize) -> bool {
        self.out[a].contains(b) && !self.inn[a].contains(b)
    }

    /// Make the undirected edge `{a, b}` bidirected (both `a -> b` and `b -> a`).
    pub fn add_undirected_edge(&mut self, a: usize, b: usize) {
        self.add_edge(a, b);
        self.add_edge(b, a);
    }
}
