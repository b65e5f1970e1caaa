//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use std::path::{Path, PathBuf};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(5))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Deterministic pseudo-random payload of `size` bytes
pub fn create_test_content(size: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..size)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// Write `count` package-like files of `size` bytes into `dir`
pub fn create_test_files(dir: &Path, count: usize, size: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("pkg-{}-1.0-1.noarch.rpm", i));
            let mut content = create_test_content(size);
            content.extend_from_slice(&i.to_le_bytes());
            std::fs::write(&path, content).unwrap_or_else(|e| panic!("writing {}: {}", path.display(), e));
            path
        })
        .collect()
}
