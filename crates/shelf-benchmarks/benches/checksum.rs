//! Checksum throughput benchmarks
//!
//! Single-file hashing per algorithm and chunk size, and parallel hashing
//! of many package files.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shelf_benchmarks::{create_test_content, create_test_files, criterion_config};
use shelf_core::types::HashAlgorithm;
use shelf_store::{checksum_bytes, checksum_file, checksum_files_parallel, DEFAULT_CHUNK_SIZE};
use tempfile::tempdir;

/// In-memory hashing per algorithm
fn bench_memory_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_hashing");
    let content = create_test_content(1_024_000);
    group.throughput(Throughput::Bytes(content.len() as u64));

    for algorithm in HashAlgorithm::ALL {
        group.bench_with_input(BenchmarkId::new("algorithm", algorithm), &content, |b, data| {
            b.iter(|| black_box(checksum_bytes(algorithm, data)));
        });
    }

    group.finish();
}

/// File hashing with different read sizes
fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_chunk_size");
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("package.rpm");
    let size = 10_240_000;
    std::fs::write(&path, create_test_content(size)).unwrap();
    group.throughput(Throughput::Bytes(size as u64));

    for chunk_size in [4096, 16_384, DEFAULT_CHUNK_SIZE, 1_048_576] {
        group.bench_with_input(BenchmarkId::new("sha256", chunk_size), &chunk_size, |b, &chunk| {
            b.iter(|| black_box(checksum_file(&path, HashAlgorithm::Sha256, chunk).unwrap()));
        });
    }

    group.finish();
}

/// Parallel hashing of a directory of packages
fn bench_parallel_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_hashing");

    for file_count in [10, 100, 500] {
        let temp_dir = tempdir().unwrap();
        let files = create_test_files(temp_dir.path(), file_count, 102_400);
        group.throughput(Throughput::Elements(file_count as u64));

        group.bench_with_input(BenchmarkId::new("files", file_count), &files, |b, files| {
            b.iter(|| black_box(checksum_files_parallel(files, HashAlgorithm::Sha256, DEFAULT_CHUNK_SIZE).unwrap()));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_memory_hashing, bench_chunk_sizes, bench_parallel_hashing
}
criterion_main!(benches);
