//! Orients a learned skeleton into a CPDAG: v-structures first, then the
//! four Meek rules iterated to a fixpoint.

use crate::digraph::Digraph;
use crate::graph::Graph;
use crate::skeleton::EdgeSeparator;

/// A Completed Partially Directed Acyclic Graph, represented as a
/// [`Digraph`]: an edge present in only one direction is oriented, an edge
/// present in both directions is undirected. Well-formed CPDAGs have no
/// directed cycle and no v-structure absent from the skeleton; this
/// invariant holds by construction for the output of [`orient_cpdag`] when
/// fed a sound skeleton and separator set, but is not separately checked.
pub type Cpdag = Digraph;

/// Starts from the skeleton as a fully bidirected digraph, orients every
/// v-structure implied by an edge separator, then closes under Meek rules
/// 1-4 until no rule fires.
pub fn orient_cpdag(skeleton: &Graph, separators: &[EdgeSeparator]) -> Cpdag {
    let n = skeleton.vert_count();
    let mut cpdag = Digraph::empty(n);
    for (a, b) in skeleton.edges() {
        cpdag.add_undirected_edge(a, b);
    }

    orient_v_structures(&mut cpdag, skeleton, separators);
    apply_meek_rules(&mut cpdag);
    cpdag
}

/// For every edge separator `(a, b, x)` and every vertex `v` adjacent (in
/// the skeleton) to both `a` and `b` with `v ∉ x`: `a - v - b` is a
/// v-structure (`a` and `b` are non-adjacent by construction, since they
/// were separated), so orient `v -> a` and `v -> b`.
fn orient_v_structures(cpdag: &mut Digraph, skeleton: &Graph, separators: &[EdgeSeparator]) {
    for sep in separators {
        let shared = skeleton.neighbors(sep.a).intersection(&skeleton.neighbors(sep.b));
        for v in shared.iter() {
            if sep.x.contains(v) {
                continue;
            }
            // a -> v <- b: v is the collider. Keep a -> v and b -> v by
            // removing their reverse directions.
            cpdag.remove_edge(v, sep.a);
            cpdag.remove_edge(v, sep.b);
        }
    }
}

/// Iterates Meek rules 1-4 to a fixpoint. Each rule only ever deletes an
/// edge direction (never adds an undirected edge), so under a correct
/// oracle the process terminates with no directed cycles; this is not
/// assumed mid-iteration, only guaranteed at the fixpoint.
fn apply_meek_rules(cpdag: &mut Digraph) {
    loop {
        let mut changed = false;
        changed |= meek_rule_1(cpdag);
        changed |= meek_rule_2(cpdag);
        changed |= meek_rule_3(cpdag);
        changed |= meek_rule_4(cpdag);
        if !changed {
            break;
        }
    }
}

/// Rule 1: `a -> b` oriented, `c` undirected-adjacent to `b` but not
/// adjacent at all to `a`, `c != a` => orient `b -> c`. Otherwise `a -> b ->
/// c` with `a`-`c` undirected would create a new v-structure at `b`.
fn meek_rule_1(cpdag: &mut Digraph) -> bool {
    let n = cpdag.vert_count();
    let mut changed = false;
    for b in 0..n {
        for a in cpdag.edges_only_in(b).iter() {
            for c in cpdag.bidir_neighbors(b).iter() {
                if c == a {
                    continue;
                }
                if !cpdag.neighbors(a).contains(c) {
                    cpdag.remove_edge(c, b);
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Rule 2: `a -> b` and `b -> c` oriented, `a - c` undirected => orient `a
/// -> c`. Otherwise `a -> c` and the undirected `c - a` would close a cycle
/// `a -> b -> c -> a`.
fn meek_rule_2(cpdag: &mut Digraph) -> bool {
    let n = cpdag.vert_count();
    let mut changed = false;
    for a in 0..n {
        for b in cpdag.edges_only_out(a).iter() {
            for c in cpdag.edges_only_out(b).iter() {
                if cpdag.bidir_neighbors(a).contains(c) {
                    cpdag.remove_edge(c, a);
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Rule 3: `a-b`, `a-c`, `a-d` undirected, `b` and `c` non-adjacent, `b -> d`
/// and `c -> d` oriented => orient `a -> d`.
fn meek_rule_3(cpdag: &mut Digraph) -> bool {
    let n = cpdag.vert_count();
    let mut changed = false;
    for a in 0..n {
        let undirected = cpdag.bidir_neighbors(a);
        for b in undirected.iter() {
            for c in undirected.iter() {
                if b >= c || cpdag.neighbors(b).contains(c) {
                    continue;
                }
                for d in undirected.iter() {
                    if d == b || d == c {
                        continue;
                    }
                    if cpdag.has_directed_edge(b, d) && cpdag.has_directed_edge(c, d) {
                        cpdag.remove_edge(d, a);
                        changed = true;
                    }
                }
            }
        }
    }
    changed
}

/// Rule 4: `a-b`, `a-c` undirected, `b` and `c` non-adjacent, `c -> d` and
/// `d -> b` oriented, `a` adjacent to `d` => orient `a -> b`.
fn meek_rule_4(cpdag: &mut Digraph) -> bool {
    let n = cpdag.vert_count();
    let mut changed = false;
    for a in 0..n {
        let undirected = cpdag.bidir_neighbors(a);
        for b in undirected.iter() {
            for c in undirected.iter() {
                if b == c || cpdag.neighbors(b).contains(c) {
                    continue;
                }
                for d in cpdag.edges_only_in(b).iter() {
                    if d == a || d == c {
                        continue;
                    }
                    if cpdag.has_directed_edge(c, d) && cpdag.neighbors(a).contains(d) {
                        cpdag.remove_edge(b, a);
                        changed = true;
                    }
                }
            }
        }
    }
    changed
}
