//! The conditional-independence oracle: the single interface both learners
//! (the treewidth engine and the PC baseline) query against, unifying the
//! graphical (d-separation) and statistical (chi-squared) back-ends.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};

use crate::bitset::{Bitset, BITSET_CAPACITY};
use crate::chisq::{chi_squared_independent, Data};
use crate::digraph::Digraph;
use crate::dsep::d_separated;

/// How many `ind_test` calls elapse between wall-clock polls. Graphical
/// queries are cheap (a BFS), so polling is coarser; statistical queries
/// scan the whole dataset, so polling is finer.
const POLL_INTERVAL_GRAPHICAL: u64 = 1000;
const POLL_INTERVAL_STATISTICAL: u64 = 10;

/// The only recoverable failure an [`Oracle`] raises. Every other
/// precondition violation (bad vertex index, `a == b`, conditioning set
/// containing an endpoint) is a programming error and panics instead, per
/// this crate's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    /// The wall-clock budget passed in at construction has been exceeded.
    /// Unwinds every in-progress solver frame back to the reconstruction
    /// driver; no partial solver state is trusted afterwards.
    TimeLimitExceeded,
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::TimeLimitExceeded => write!(f, "oracle time limit exceeded"),
        }
    }
}

impl Error for OracleError {}

enum OracleKind {
    Graphical(Digraph),
    Statistical(Data),
}

/// A key into the oracle's cache: a canonicalized vertex pair plus the
/// conditioning set. Canonical form has `lo < hi`; [`Oracle::ind_test`]
/// enforces this before every lookup so that `ind_test(a, x, b)` and
/// `ind_test(b, x, a)` always hit the same entry.
type QueryKey = (usize, usize, Bitset);

/// Unifies the graphical and statistical independence back-ends behind one
/// memoized, time-limited interface.
///
/// Exclusively owned by a single reconstruction run: its cache grows
/// monotonically for the run's duration and is dropped with it.
pub struct Oracle {
    kind: OracleKind,
    vert_count: usize,
    /// One cache bucket per conditioning-set size, `0..=vert_count`.
    cache: Vec<HashMap<QueryKey, bool>>,
    call_count: u64,
    started_at: Instant,
    time_limit: Duration,
    max_queried_separator_size: usize,
    query_count_by_separator_size: Vec<u64>,
}

impl Oracle {
    pub fn new_graphical(dag: Digraph, time_limit: Duration) -> Self {
        let vert_count = dag.vert_count();
        Self::new(OracleKind::Graphical(dag), vert_count, time_limit)
    }

    pub fn new_statistical(data: Data, time_limit: Duration) -> Self {
        let vert_count = data.vert_count();
        Self::new(OracleKind::Statistical(data), vert_count, time_limit)
    }

    fn new(kind: OracleKind, vert_count: usize, time_limit: Duration) -> Self {
        assert!(vert_count <= BITSET_CAPACITY, "vertex count exceeds Bitset capacity");
        Oracle {
            kind,
            vert_count,
            cache: (0..=vert_count).map(|_| HashMap::new()).collect(),
            call_count: 0,
            started_at: Instant::now(),
            time_limit,
            max_queried_separator_size: 0,
            query_count_by_separator_size: vec![0; vert_count + 1],
        }
    }

    #[inline]
    pub fn vert_count(&self) -> usize {
        self.vert_count
    }

    #[inline]
    pub fn graphical(&self) -> bool {
        matches!(self.kind, OracleKind::Graphical(_))
    }

    /// `a ⟂ b | x`, memoized and deterministic across repeated calls with
    /// equal canonicalized arguments.
    ///
    /// # Panics
    /// If `a == b`, either index is out of range, or `x` contains `a` or
    /// `b` — these are precondition violations, not recoverable failures.
    pub fn ind_test(&mut self, a: usize, x: Bitset, b: usize) -> Result<bool, OracleError> {
        if a == b || a >= self.vert_count || b >= self.vert_count || x.contains(a) || x.contains(b)
        {
            log::error!(
                "ind_test precondition violated: a={a} b={b} x={x:?} vert_count={}",
                self.vert_count
            );
            panic!("ind_test precondition violated");
        }

        self.call_count += 1;
        let poll_interval = match self.kind {
            OracleKind::Graphical(_) => POLL_INTERVAL_GRAPHICAL,
            OracleKind::Statistical(_) => POLL_INTERVAL_STATISTICAL,
        };
        if self.call_count % poll_interval == 0 && self.started_at.elapsed() > self.time_limit {
            return Err(OracleError::TimeLimitExceeded);
        }

        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let sep_size = x.count();
        let key = (lo, hi, x);

        if let Some(&cached) = self.cache[sep_size].get(&key) {
            return Ok(cached);
        }

        let result = match &self.kind {
            OracleKind::Graphical(dag) => d_separated(dag, lo, &x, hi),
            OracleKind::Statistical(data) => chi_squared_independent(data, lo, &x, hi),
        };

        self.cache[sep_size].insert(key, result);
        self.query_count_by_separator_size[sep_size] += 1;
        if sep_size > self.max_queried_separator_size {
            self.max_queried_separator_size = sep_size;
        }

        Ok(result)
    }

    #[inline]
    pub fn max_queried_separator_size(&self) -> usize {
        self.max_queried_separator_size
    }

    #[inline]
    pub fn query_count_by_separator_size(&self) -> &[u64] {
        &self.query_count_by_separator_size
    }

    #[inline]
    pub fn elapsed_time(&self) -> Duration {
        self.started_at.elapsed()
    }
}
