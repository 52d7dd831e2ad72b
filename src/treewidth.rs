//! The treewidth-aware structure-learning engine: an oracle-driven recursive
//! cops-and-robbers search that decides whether the moral graph restricted
//! to a vertex set has treewidth `<= k`, for increasing `k`, and produces a
//! witnessing tree decomposition on success.
//!
//! The search never materializes the moral graph; "is there an edge between
//! `u` and `w` given the current cop set" is answered on demand by
//! [`Oracle::ind_test`], which is what keeps oracle calls polynomial instead
//! of exponential in the vertex count.

use std::collections::{HashMap, VecDeque};

use crate::bitset::Bitset;
use crate::oracle::{Oracle, OracleError};

/// One bag of a [`TreeDecomposition`]: a vertex subset plus up to two child
/// indices (`None` = absent). Stored in a flat, topologically-ordered
/// vector rooted at index 0; every child index is strictly greater than its
/// parent's.
#[derive(Clone, Copy, Debug)]
pub struct TreeDecompositionNode {
    pub bag: Bitset,
    pub child1: Option<usize>,
    pub child2: Option<usize>,
}

/// A rooted binary tree of bags witnessing a treewidth bound.
#[derive(Clone, Debug, Default)]
pub struct TreeDecomposition {
    pub nodes: Vec<TreeDecompositionNode>,
}

impl TreeDecomposition {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `max(|bag|) - 1` over all bags, or 0 for an empty or single-bag
    /// decomposition with no vertices.
    pub fn width(&self) -> usize {
        self.nodes.iter().map(|n| n.bag.count()).max().map_or(0, |m| m.saturating_sub(1))
    }

    pub fn bags(&self) -> impl Iterator<Item = &Bitset> {
        self.nodes.iter().map(|n| &n.bag)
    }

    /// Union of all bags.
    pub fn vertex_set(&self) -> Bitset {
        let mut union = Bitset::empty();
        for bag in self.bags() {
            union.union_with(bag);
        }
        union
    }
}

/// Per-`k` solver state: the recursive cops-and-robbers search plus the
/// memo tables it takes its polynomial query bound from. A fresh instance
/// is created for each candidate `k`; all of its memos are released when it
/// is dropped, per this crate's resource-ownership policy for the
/// tree-decomposition engine.
struct Solver {
    k: usize,
    verts: Bitset,
    graphical: bool,
    component_memo: HashMap<(Bitset, usize), Bitset>,
    pre_solve_memo: HashMap<(Bitset, Bitset), bool>,
    /// Recorded inputs to the shrink step of `pre_solve(c, r)`, so the
    /// construction pass can rebuild bags without re-querying the oracle.
    trace: HashMap<(Bitset, Bitset), Trace>,
}

#[derive(Clone, Copy)]
struct Trace {
    comp: Bitset,
    c_shrunk: Bitset,
}

impl Solver {
    fn new(k: usize, verts: Bitset, graphical: bool) -> Self {
        Solver {
            k,
            verts,
            graphical,
            component_memo: HashMap::new(),
            pre_solve_memo: HashMap::new(),
            trace: HashMap::new(),
        }
    }

    /// BFS from `r0` in the dependency graph implied by the oracle under cop
    /// set `c` (`v ~ w` iff `ind_test(v, c, w)` is false), restricted to
    /// `verts \ c`. Memoized by `(c, r0)`.
    fn extract_component(
        &mut self,
        oracle: &mut Oracle,
        c: Bitset,
        r0: usize,
    ) -> Result<Bitset, OracleError> {
        if let Some(&cached) = self.component_memo.get(&(c, r0)) {
            return Ok(cached);
        }

        let available = self.verts.minus(&c);
        let mut reached = Bitset::singleton(r0);
        let mut queue = VecDeque::from([r0]);

        while let Some(w) = queue.pop_front() {
            for v in available.minus(&reached).iter() {
                let dependent = !oracle.ind_test(v.min(w), c, v.max(w))?;
                if dependent {
                    reached.add(v);
                    queue.push_back(v);
                }
            }
        }

        self.component_memo.insert((c, r0), reached);
        Ok(reached)
    }

    /// True iff, taking the robber component containing `r`'s minimum
    /// element, the component can be captured with at most `k + 1` cops and
    /// the remaining robbers (`r` minus that component) can then also be
    /// resolved. Memoized by `(c, r)`.
    fn pre_solve(&mut self, oracle: &mut Oracle, c: Bitset, r: Bitset) -> Result<bool, OracleError> {
        if r.is_empty() {
            return Ok(true);
        }
        if let Some(&cached) = self.pre_solve_memo.get(&(c, r)) {
            return Ok(cached);
        }

        let r0 = r.min().expect("r checked nonempty above");
        let mut comp = self.extract_component(oracle, c, r0)?;
        if !self.graphical {
            // The chi-squared oracle is not a semigraphoid: a freshly
            // extracted component is not guaranteed to shrink as more cops
            // are placed, so it must be bounded by the current robber set.
            comp.intersect_with(&r);
        }

        let c_shrunk = self.shrink(oracle, c, comp)?;
        self.trace.insert((c, r), Trace { comp, c_shrunk });

        if c_shrunk.count() == self.k + 1 {
            self.pre_solve_memo.insert((c, r), false);
            return Ok(false);
        }

        if !self.solve(oracle, c_shrunk, comp)? {
            self.pre_solve_memo.insert((c, r), false);
            return Ok(false);
        }

        let rest = r.minus(&comp);
        let result = self.pre_solve(oracle, c, rest)?;
        self.pre_solve_memo.insert((c, r), result);
        Ok(result)
    }

    /// Drop cops from `c` that are independent of every vertex in `comp`
    /// given the rest of `c`, one at a time, until none remain droppable.
    fn shrink(&mut self, oracle: &mut Oracle, c: Bitset, comp: Bitset) -> Result<Bitset, OracleError> {
        let mut current = c;
        loop {
            let mut drop_candidate = None;
            for cop in current.iter() {
                let rest = current.without(cop);
                let mut redundant = true;
                for rob in comp.iter() {
                    if !oracle.ind_test(cop.min(rob), rest, cop.max(rob))? {
                        redundant = false;
                        break;
                    }
                }
                if redundant {
                    drop_candidate = Some(cop);
                    break;
                }
            }
            match drop_candidate {
                Some(cop) => current = current.without(cop),
                None => return Ok(current),
            }
        }
    }

    /// True iff some `r in r` can be captured: placing a new cop on it makes
    /// `pre_solve(c ∪ {r}, r \ {r})` hold.
    fn solve(&mut self, oracle: &mut Oracle, c: Bitset, r: Bitset) -> Result<bool, OracleError> {
        for rob in r.iter() {
            if self.pre_solve(oracle, c.with(rob), r.without(rob))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rebuilds the bag tree from the memo tables after `pre_solve(c, r)`
    /// has returned `true` with `r` nonempty. Emits a node for `c`, with up
    /// to two children: the capture of `comp` under the shrunk cop set, and
    /// (if `comp` is a proper subset of `r`) the recursive handling of the
    /// remaining robbers.
    fn pre_solve_construct(&mut self, nodes: &mut Vec<TreeDecompositionNode>, c: Bitset, r: Bitset) -> usize {
        let trace = *self.trace.get(&(c, r)).expect("pre_solve must have traced this call");
        let idx = nodes.len();
        nodes.push(TreeDecompositionNode { bag: c, child1: None, child2: None });

        let child1 = self.solve_construct(nodes, trace.c_shrunk, trace.comp);
        let child2 = if trace.comp != r {
            Some(self.pre_solve_construct(nodes, c, r.minus(&trace.comp)))
        } else {
            None
        };

        nodes[idx].child1 = Some(child1);
        nodes[idx].child2 = child2;
        idx
    }

    /// Finds the first `r in r` for which `pre_solve(c ∪ {r}, r \ {r})`
    /// holds, and constructs from there. When capturing the last robber
    /// leaves nothing behind (`r \ {r}` empty), `pre_solve` returns `true`
    /// trivially with no trace to replay; the capture itself still needs a
    /// bag, so a childless leaf node is emitted directly instead of
    /// recursing into `pre_solve_construct`.
    fn solve_construct(&mut self, nodes: &mut Vec<TreeDecompositionNode>, c: Bitset, r: Bitset) -> usize {
        for rob in r.iter() {
            let new_c = c.with(rob);
            let new_r = r.without(rob);
            let holds = new_r.is_empty() || *self.pre_solve_memo.get(&(new_c, new_r)).unwrap_or(&false);
            if !holds {
                continue;
            }
            if new_r.is_empty() {
                let idx = nodes.len();
                nodes.push(TreeDecompositionNode { bag: new_c, child1: None, child2: None });
                return idx;
            }
            return self.pre_solve_construct(nodes, new_c, new_r);
        }
        unreachable!("solve(c, r) returned true but no witnessing robber was found during construction")
    }
}

/// Finds the smallest `k >= 1` such that the moral graph restricted to
/// `verts` has treewidth `<= k`, and a witnessing decomposition.
///
/// `verts` of size 0 returns an empty decomposition with width 0; size 1
/// returns a single-bag decomposition of width 0 with no oracle calls.
pub fn decompose_component(oracle: &mut Oracle, verts: Bitset) -> Result<(TreeDecomposition, usize), OracleError> {
    let n = verts.count();
    if n == 0 {
        return Ok((TreeDecomposition::default(), 0));
    }
    if n == 1 {
        let node = TreeDecompositionNode { bag: verts, child1: None, child2: None };
        return Ok((TreeDecomposition { nodes: vec![node] }, 0));
    }

    let mut k = 1usize;
    loop {
        let c0 = Bitset::singleton(verts.min().expect("n >= 2 checked above"));
        let r0 = verts.minus(&c0);
        let mut solver = Solver::new(k, verts, oracle.graphical());

        if solver.pre_solve(oracle, c0, r0)? {
            let mut nodes = Vec::new();
            solver.pre_solve_construct(&mut nodes, c0, r0);
            log::debug!("component of {} vertices has treewidth {k}", verts.count());
            return Ok((TreeDecomposition { nodes }, k));
        }
        k += 1;
    }
}
