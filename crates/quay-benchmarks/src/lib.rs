//! Quay benchmarking suite
//!
//! Benchmarks for release normalization, registry view assembly and the
//! persistent cache backends.

pub mod common;

pub use common::*;
