//! Canonical path resolution and publishing benchmarks

use camino::Utf8PathBuf;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shelf_benchmarks::criterion_config;
use shelf_core::types::{ChecksumSpec, PackageIdentity};
use shelf_store::{CanonicalPathResolver, ContentStore, RepositoryPublisher, ToolOutput};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn identity(i: usize) -> PackageIdentity {
    PackageIdentity::new(
        format!("pkg{}", i),
        "1.0",
        "1",
        "x86_64",
        format!("pkg{}-1.0-1.x86_64.rpm", i),
    )
    .unwrap()
}

/// Resolution with a single digest and with a checksum mapping
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let resolver = CanonicalPathResolver::new("/var/lib/shelf/packages");
    let id = identity(1);

    let single = ChecksumSpec::from("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08");
    let multi = ChecksumSpec::Multi(BTreeMap::from([
        ("md5".to_string(), "098f6bcd4621d373cade4e832627b4f6".to_string()),
        ("sha1".to_string(), "a94a8fe5ccb19ba61c4c0873d391e987982fbbd3".to_string()),
    ]));

    group.bench_function("single_digest", |b| {
        b.iter(|| black_box(resolver.resolve(&id, &single).unwrap()));
    });
    group.bench_function("mapping_fallback", |b| {
        b.iter(|| black_box(resolver.resolve(&id, &multi).unwrap()));
    });

    group.finish();
}

struct NoopGenerator;

impl shelf_store::MetadataGenerator for NoopGenerator {
    fn generate(&self, _repo_dir: &Path, _groups: Option<&Path>) -> shelf_store::StoreResult<ToolOutput> {
        unreachable!("metadata is not benchmarked")
    }

    fn modify(&self, _repo_dir: &Path, _new_file: &Path) -> shelf_store::StoreResult<ToolOutput> {
        unreachable!("metadata is not benchmarked")
    }
}

/// Publishing a repository of already linked packages
fn bench_republish(c: &mut Criterion) {
    let mut group = c.benchmark_group("republish");

    for count in [100, 1000] {
        let temp_dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).unwrap();
        let store = ContentStore::new(CanonicalPathResolver::new(root.join("packages")));
        let publisher = RepositoryPublisher::new(Arc::new(store), root.join("repos"), Arc::new(NoopGenerator));

        let ids: Vec<PackageIdentity> = (0..count).map(identity).collect();
        let sums: Vec<ChecksumSpec> = (0..count)
            .map(|i| ChecksumSpec::from(format!("{:06x}", i * 7919).as_str()))
            .collect();
        for (id, sum) in ids.iter().zip(sums.iter()) {
            let path = publisher.store().canonical_path(id, sum).unwrap();
            std::fs::create_dir_all(path.as_path().parent().unwrap()).unwrap();
            std::fs::write(path.as_path(), id.filename()).unwrap();
        }
        publisher.publish_all("el9/os", ids.iter().zip(sums.iter())).unwrap();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("packages", count), &count, |b, _| {
            b.iter(|| black_box(publisher.publish_all("el9/os", ids.iter().zip(sums.iter())).unwrap()));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_resolve, bench_republish
}
criterion_main!(benches);
