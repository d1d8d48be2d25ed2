use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use purchase_core::{
    BoostingConfig, Dataset, GbdtTrainer, InferenceEngine, LabeledExample, Normalizer,
};

fn synthetic_dataset(n: usize) -> Dataset {
    (0..n)
        .map(|i| {
            let purchase = i % 5 == 0;
            let price = if purchase { 400.0 } else { 40.0 } + ((i * 31) % 97) as f64;
            LabeledExample::new(
                purchase,
                [
                    ((i * 7919) % 5000) as f64,
                    (i % 40) as f64,
                    price,
                    ((i * 104_729) % 20_000) as f64,
                ],
            )
        })
        .collect()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("gbdt_training");
    group.sample_size(10);

    for &n in &[1_000usize, 10_000] {
        let raw = synthetic_dataset(n);
        let params = Normalizer::fit(&raw).expect("fit");
        let train = params.transform_dataset(&raw);
        let trainer = GbdtTrainer::new(BoostingConfig {
            iterations: 20,
            ..BoostingConfig::default()
        });

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &train, |b, train| {
            b.iter(|| black_box(trainer.train(train).expect("train")));
        });
    }

    group.finish();
}

fn bench_inference(c: &mut Criterion) {
    let raw = synthetic_dataset(5_000);
    let params = Normalizer::fit(&raw).expect("fit");
    let ensemble = GbdtTrainer::new(BoostingConfig::default())
        .train(&params.transform_dataset(&raw))
        .expect("train");
    let engine = InferenceEngine::new(&params, &ensemble);
    let features = [44600062.0, 2103807459595387724.0, 35.79, 541312140.0];

    c.bench_function("purchase_predict_features", |b| {
        b.iter(|| black_box(engine.predict_features(black_box(&features))));
    });
}

criterion_group!(boosting_benches, bench_training, bench_inference);
criterion_main!(boosting_benches);
