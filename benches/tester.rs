//! Performance benchmarks for SPATIAL TESTER

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spatial_tester::expected::ExpectedDistribution;
use spatial_tester::{
    Dimensions, Domain, Kernel, KernelKind, SpatialBackend, SpatialTester, TopologyBackend,
};

fn benchmark_build_connect(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_connect");

    for nodes in [1_000, 10_000, 100_000].iter() {
        let mut backend =
            TopologyBackend::new(1.0, *nodes, Dimensions::Two, "gaussian", None).unwrap();

        group.bench_with_input(BenchmarkId::new("nodes", nodes), nodes, |b, _| {
            let mut seed = 0;
            b.iter(|| {
                backend.reset(Some(seed));
                backend.build().unwrap();
                backend.connect().unwrap();
                seed += 1;
            });
        });
    }

    group.finish();
}

fn benchmark_expected_distribution(c: &mut Criterion) {
    for dims in [Dimensions::Two, Dimensions::Three] {
        let domain = Domain::centered(1.0, dims, true).unwrap();
        let kernel = Kernel::from_params(KernelKind::Gaussian, 1.0, None).unwrap();

        c.bench_function(&format!("expected_table_{}d", dims.count()), |b| {
            b.iter(|| ExpectedDistribution::new(black_box(kernel), black_box(domain)).unwrap());
        });
    }
}

fn benchmark_ks_test(c: &mut Criterion) {
    let backend = TopologyBackend::new(1.0, 10_000, Dimensions::Two, "gaussian", None).unwrap();
    let mut tester = SpatialTester::new(backend).unwrap();

    c.bench_function("ks_test_10k", |b| {
        b.iter(|| tester.ks_test(false, black_box(Some(0))).unwrap());
    });
}

criterion_group!(
    benches,
    benchmark_build_connect,
    benchmark_expected_distribution,
    benchmark_ks_test
);
criterion_main!(benches);
