//! Pearson chi-squared conditional-independence test over categorical data.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::bitset::Bitset;

/// Significance level used for the independence threshold: reject
/// independence when the statistic exceeds the 0.95 quantile of its
/// reference chi-squared distribution.
const QUANTILE: f64 = 0.95;

/// Categorical data: one row per observation, one category count per
/// variable. Immutable for the lifetime of any [`crate::oracle::Oracle`]
/// built over it.
#[derive(Clone, Debug)]
pub struct Data {
    cat_counts: Vec<usize>,
    rows: Vec<Vec<u32>>,
}

impl Data {
    /// `cat_counts[v]` is the number of categories of variable `v` (each
    /// `>= 2`); every row must have `cat_counts.len()` entries, each in
    /// `0..cat_counts[v]` for its column `v`.
    pub fn new(cat_counts: Vec<usize>, rows: Vec<Vec<u32>>) -> Self {
        debug_assert!(cat_counts.iter().all(|&c| c >= 2));
        debug_assert!(rows.iter().all(|r| r.len() == cat_counts.len()));
        Data { cat_counts, rows }
    }

    #[inline]
    pub fn vert_count(&self) -> usize {
        self.cat_counts.len()
    }

    #[inline]
    pub fn cat_count(&self, v: usize) -> usize {
        self.cat_counts[v]
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Partitions `ord` (a permutation of row indices) into strata of equal
/// value on variable `v`, refining the partition described by `splits`
/// (boundary offsets into `ord`, `splits[0] == 0`, `splits.last() ==
/// ord.len()`). A stratum already down to one row is carried through
/// unchanged; otherwise it is bucketed by `v`'s category via a counting
/// sort, and a new split boundary is inserted between non-empty buckets.
fn refine_strata(data: &Data, ord: &[usize], splits: &[usize], v: usize) -> (Vec<usize>, Vec<usize>) {
    let ncat = data.cat_count(v);
    let mut new_ord = Vec::with_capacity(ord.len());
    let mut new_splits = vec![0usize];

    for w in splits.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        if hi - lo <= 1 {
            new_ord.extend_from_slice(&ord[lo..hi]);
            new_splits.push(new_ord.len());
            continue;
        }
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); ncat];
        for &r in &ord[lo..hi] {
            buckets[data.rows[r][v] as usize].push(r);
        }
        for bucket in buckets {
            if bucket.is_empty() {
                continue;
            }
            new_ord.extend_from_slice(&bucket);
            new_splits.push(new_ord.len());
        }
    }

    (new_ord, new_splits)
}

/// `a ⟂ b | x` under the classical Pearson chi-squared test: independence is
/// accepted iff the pooled statistic falls below the 0.95 quantile of a
/// chi-squared distribution with `df = (cat(a) - 1) * (cat(b) - 1) *
/// prod(cat(v) for v in x)` degrees of freedom (see the Design Note this
/// module is grounded on for why this convention, rather than one stratum
/// per value of `x` each contributing `(cat(a)-1)*(cat(b)-1)` df, is used —
/// the two are numerically identical).
pub fn chi_squared_independent(data: &Data, a: usize, x: &Bitset, b: usize) -> bool {
    debug_assert_ne!(a, b);
    debug_assert!(!x.contains(a) && !x.contains(b));

    let n = data.row_count();
    let mut ord: Vec<usize> = (0..n).collect();
    let mut splits: Vec<usize> = vec![0, n];
    for v in x.iter() {
        let (new_ord, new_splits) = refine_strata(data, &ord, &splits, v);
        ord = new_ord;
        splits = new_splits;
    }

    let cat_a = data.cat_count(a);
    let cat_b = data.cat_count(b);
    let mut statistic = 0.0f64;

    for w in splits.windows(2) {
        let (lo, hi) = (w[0], w[1]);
        let stratum = &ord[lo..hi];
        let n_stratum = stratum.len();
        if n_stratum == 0 {
            continue;
        }
        let nf = n_stratum as f64;

        let mut freq_a = vec![0usize; cat_a];
        let mut freq_b = vec![0usize; cat_b];
        let mut freq_ab = vec![0usize; cat_a * cat_b];
        for &r in stratum {
            let ca = data.rows[r][a] as usize;
            let cb = data.rows[r][b] as usize;
            freq_a[ca] += 1;
            freq_b[cb] += 1;
            freq_ab[ca * cat_b + cb] += 1;
        }

        for ia in 0..cat_a {
            if freq_a[ia] == 0 {
                continue;
            }
            let f_a = freq_a[ia] as f64 / nf;
            for ib in 0..cat_b {
                if freq_b[ib] == 0 {
                    continue;
                }
                let f_b = freq_b[ib] as f64 / nf;
                let expected = f_a * f_b;
                if expected == 0.0 {
                    continue;
                }
                let f_ab = freq_ab[ia * cat_b + ib] as f64 / nf;
                let diff = f_ab - expected;
                statistic += nf * diff * diff / expected;
            }
        }
    }

    let strata_product: usize = x.iter().map(|v| data.cat_count(v)).product();
    let df = ((cat_a - 1) * (cat_b - 1) * strata_product) as f64;
    if df <= 0.0 {
        // Degenerate conditioning (a constant variable somewhere): nothing to
        // reject, treat as independent.
        return true;
    }
    let chi2 = ChiSquared::new(df).expect("degrees of freedom must be positive");
    let threshold = chi2.inverse_cdf(QUANTILE);
    statistic < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two binary coin-flip columns generated independently; dependence is
    /// introduced by making the third column equal the XOR of the first two.
    fn independent_binary_data() -> Data {
        let mut rows = Vec::new();
        for a in 0..2u32 {
            for b in 0..2u32 {
                for _ in 0..50 {
                    rows.push(vec![a, b]);
                }
            }
        }
        Data::new(vec![2, 2], rows)
    }

    fn dependent_binary_data() -> Data {
        let mut rows = Vec::new();
        for _ in 0..100 {
            rows.push(vec![0, 0]);
        }
        for _ in 0..1 {
            rows.push(vec![0, 1]);
            rows.push(vec![1, 0]);
        }
        for _ in 0..100 {
            rows.push(vec![1, 1]);
        }
        Data::new(vec![2, 2], rows)
    }

    #[test]
    fn uniform_independent_columns_pass() {
        let data = independent_binary_data();
        assert!(chi_squared_independent(&data, 0, &Bitset::empty(), 1));
    }

    #[test]
    fn strongly_correlated_columns_fail() {
        let data = dependent_binary_data();
        assert!(!chi_squared_independent(&data, 0, &Bitset::empty(), 1));
    }

    #[test]
    fn conditioning_on_singleton_strata_is_carried_through() {
        // A single row per stratum should never crash the statistic
        // computation (singleton strata contribute nothing to reject on).
        let rows = vec![vec![0, 0, 0], vec![1, 1, 1]];
        let data = Data::new(vec![2, 2, 2], rows);
        assert!(chi_squared_independent(&data, 0, &Bitset::singleton(2), 1));
    }
}
