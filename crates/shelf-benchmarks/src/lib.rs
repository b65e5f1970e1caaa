//! shelf benchmarking suite
//!
//! Benchmarks for checksum throughput, canonical path resolution and
//! repository publishing.

pub mod common;

pub use common::*;
