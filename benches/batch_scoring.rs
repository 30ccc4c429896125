use criterion::{black_box, criterion_group, criterion_main, Criterion};

use palm_health_rust::rules::presets;
use palm_health_rust::{cluster, demo_batch, ClusterConfig, HealthClassifier, TreeRecord};

/// Demo batch tiled to `copies` x 100 trees with unique ids
fn tiled_batch(copies: usize) -> Vec<TreeRecord> {
    let base = demo_batch();
    (0..copies)
        .flat_map(|copy| {
            base.iter().map(move |r| TreeRecord {
                tree_id: format!("{}-{}", copy, r.tree_id),
                ..r.clone()
            })
        })
        .collect()
}

fn bench_score_batch(c: &mut Criterion) {
    let classifier = HealthClassifier::canonical();
    let survey = HealthClassifier::new(presets::field_survey()).unwrap();
    let batch = tiled_batch(100);
    let with_height: Vec<TreeRecord> = batch
        .iter()
        .map(|r| TreeRecord { height_cm: Some(750.0), ..r.clone() })
        .collect();

    c.bench_function("score_batch.canonical.10k", |b| {
        b.iter(|| classifier.score_batch(black_box(&batch)).unwrap());
    });
    c.bench_function("score_batch.field_survey.10k", |b| {
        b.iter(|| survey.score_batch(black_box(&with_height)).unwrap());
    });
}

fn bench_cluster(c: &mut Criterion) {
    let config = ClusterConfig::default();
    let demo = demo_batch();
    let large = tiled_batch(20);

    c.bench_function("cluster.demo.100", |b| {
        b.iter(|| cluster(black_box(&demo), &config).unwrap());
    });
    c.bench_function("cluster.tiled.2k", |b| {
        b.iter(|| cluster(black_box(&large), &config).unwrap());
    });
}

criterion_group!(benches, bench_score_batch, bench_cluster);
criterion_main!(benches);
