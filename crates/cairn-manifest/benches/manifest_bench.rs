use cairn_cas::MemoryStore;
use cairn_manifest::{Layout, ManifestBuilder, ManifestWalker};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 131 + i / 7) as u8).collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_build");
    for size in [60_000usize, 1_000_000, 8_000_000] {
        let data = payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            let store = MemoryStore::new();
            b.iter(|| ManifestBuilder::new(&store).build(black_box(data)).unwrap());
        });
    }
    group.finish();
}

fn bench_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_restore");
    for size in [60_000usize, 1_000_000, 8_000_000] {
        let store = MemoryStore::new();
        let stored = ManifestBuilder::new(&store).build(&payload(size)).unwrap();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| {
                ManifestWalker::new(&store)
                    .restore(black_box(&stored.manifest))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_paginated_restore(c: &mut Criterion) {
    // 2000 tiny chunks: three parts to walk.
    let store = MemoryStore::new();
    let stored = ManifestBuilder::new(&store)
        .layout(Layout {
            chunk_size: 64,
            ..Layout::default()
        })
        .build(&payload(128_000))
        .unwrap();

    c.bench_function("manifest_restore_paginated", |b| {
        b.iter(|| {
            ManifestWalker::new(&store)
                .restore(black_box(&stored.manifest))
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_build, bench_restore, bench_paginated_restore);
criterion_main!(benches);
