use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use queuenet::{
    backend::{Tensor1D, Tensor2D},
    CpuBackend, NetworkConfig, WaitTimeNetwork,
};

/// M/M/1 rows with unit service rate.
fn mm1_rows(n: usize) -> Vec<[f64; 2]> {
    (0..n)
        .map(|i| {
            let lambda = 0.05 + 0.9 * i as f64 / n as f64;
            [lambda, lambda * lambda / (1.0 - lambda)]
        })
        .collect()
}

/// Train a network once for the prediction benchmarks
fn train_network() -> WaitTimeNetwork<CpuBackend> {
    let rows = mm1_rows(200);
    let x = Tensor2D::<CpuBackend>::from_rows(&rows);
    let y = Tensor1D::<CpuBackend>::new(rows.iter().map(|r| r[1] / r[0]).collect());

    let mut net = WaitTimeNetwork::new(NetworkConfig::default().with_max_iter(20));
    net.train(&x, &y, 0.2).expect("Failed to train network");
    net
}

fn bench_predict_single(c: &mut Criterion) {
    let net = train_network();

    c.bench_function("predict_single", |b| {
        b.iter(|| {
            let pred = net.predict_one(black_box(&[0.5, 10.0]));
            black_box(pred)
        });
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let net = train_network();

    for batch_size in [10, 100, 1000].iter() {
        let x = Tensor2D::<CpuBackend>::from_rows(&mm1_rows(*batch_size));
        c.bench_with_input(BenchmarkId::new("predict_batch", batch_size), &x, |b, x| {
            b.iter(|| {
                let predictions = net.predict(black_box(x));
                black_box(predictions)
            });
        });
    }
}

criterion_group!(benches, bench_predict_single, bench_predict_batch);
criterion_main!(benches);
