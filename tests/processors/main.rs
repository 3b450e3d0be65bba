//! Batch processor integration tests.
//!
//! - Unordered: partial failure isolation, retries, disjoint concurrent batches
//! - Causality-ordered: per-key creation order under randomized interleavings,
//!   key lock exclusion across workers

mod ordered;
mod unordered;
