//! **causal-tw** reconstructs a CPDAG (Completed Partially Directed Acyclic
//! Graph) from a conditional-independence oracle, using a treewidth-bounded
//! cops-and-robbers search to keep the number of oracle queries polynomial
//! in the vertex count rather than exponential.
//!
//! The oracle can be backed by true d-separation on a known DAG
//! ([`oracle::Oracle::new_graphical`], useful for validating the learner
//! against ground truth) or by a Pearson chi-squared test over categorical
//! data ([`oracle::Oracle::new_statistical`]). [`pc::run_pc`] is a classical
//! PC-algorithm baseline consuming the same oracle interface, included for
//! query-complexity comparison.
//!
//! [`driver::reconstruct_bayesian_network`] is the entry point most callers
//! want. This crate has no notion of a file format, a CLI, or a
//! network/data-file reader: wiring a concrete [`digraph::Digraph`] or
//! [`chisq::Data`] from disk, or driving an external exact-treewidth
//! verifier subprocess for testing, are external-collaborator concerns left
//! to callers.

pub mod bitset;
pub mod chisq;
pub mod cpdag;
pub mod digraph;
pub mod driver;
pub mod dsep;
pub mod graph;
pub mod oracle;
pub mod pc;
pub mod skeleton;
pub mod treewidth;

pub use bitset::Bitset;
pub use cpdag::Cpdag;
pub use digraph::Digraph;
pub use driver::{reconstruct_bayesian_network, Reconstruction, ReconstructOutcome, RunConfig};
pub use graph::Graph;
pub use oracle::{Oracle, OracleError};
pub use skeleton::EdgeSeparator;
pub use treewidth::{TreeDecomposition, TreeDecompositionNode};
