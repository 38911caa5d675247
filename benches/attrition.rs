use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use workforce_analytics::attrition::AttritionModel;
use workforce_analytics::config::AppConfig;
use workforce_analytics::synthetic::HrDataGenerator;

fn bench_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.model.n_estimators = 50;
    config.model.persist = false;
    config
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("attrition_train");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [500, 2000, 5000].iter() {
        let df = HrDataGenerator::new(42).generate(*n_rows).unwrap();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &df, |b, df| {
            b.iter(|| {
                let mut model = AttritionModel::from_app_config(&bench_config());
                model.train(black_box(df)).map(|t| t.metrics.clone()).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("attrition_analyze");

    let train = HrDataGenerator::new(7).generate(2000).unwrap();
    let mut model = AttritionModel::from_app_config(&bench_config());
    model.train(&train).unwrap();

    for n_rows in [100, 1000, 5000].iter() {
        let df = HrDataGenerator::new(8).generate(*n_rows).unwrap();
        group.bench_with_input(BenchmarkId::new("analyze", n_rows), &df, |b, df| {
            b.iter(|| model.analyze(black_box(df)).unwrap())
        });
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_1000", |b| {
        b.iter(|| HrDataGenerator::new(black_box(1)).generate(1000).unwrap())
    });
}

criterion_group!(benches, bench_training, bench_scoring, bench_generate);
criterion_main!(benches);
