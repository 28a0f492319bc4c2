use cohort::{
    cluster::{AnalysisInput, Initializer, KMeans, KMedoids, Partitioner},
    projection, AnswerValue, DistanceMatrix, Question, ResponseDistance, ResponseRecord, Schema,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;

fn synthetic_records(n: usize) -> (Vec<ResponseRecord>, Schema) {
    let schema = Schema::new(vec![
        Question::numeric("score", 0, 100),
        Question::choice("channel", 4, false),
        Question::choice("satisfaction", 5, true),
    ]);

    let mut rng = StdRng::seed_from_u64(42);
    let records = (0..n)
        .map(|i| {
            ResponseRecord::new(format!("r{i}"), "bench")
                .with_answer("score", AnswerValue::number(rng.random_range(0..=100)))
                .with_answer(
                    "channel",
                    AnswerValue::selection([rng.random_range(0..4usize)]),
                )
                .with_answer(
                    "satisfaction",
                    AnswerValue::selection([rng.random_range(0..5usize)]),
                )
        })
        .collect();
    (records, schema)
}

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("clustering");

    let (records, schema) = synthetic_records(200);
    let metric = ResponseDistance::new();
    let matrix = DistanceMatrix::from_records(&records, &schema, &metric).unwrap();
    let input = AnalysisInput {
        records: &records,
        schema: &schema,
        matrix: &matrix,
        metric: &metric,
    };

    group.bench_function("distance_matrix_n200", |b| {
        b.iter(|| DistanceMatrix::from_records(black_box(&records), &schema, &metric).unwrap())
    });

    group.bench_function("kmeans_n200_k5", |b| {
        b.iter(|| {
            let model = KMeans::new(Initializer::KmeansPlusPlus).with_seed(42);
            model.partition(black_box(&input), 5).unwrap()
        })
    });

    group.bench_function("kmedoids_n200_k5", |b| {
        b.iter(|| {
            let model = KMedoids::new(Initializer::Greedy);
            model.partition(black_box(&input), 5).unwrap()
        })
    });

    group.bench_function("mds_project_n200", |b| {
        b.iter(|| projection::project(black_box(&matrix)))
    });

    group.finish();
}

criterion_group!(benches, bench_clustering);
criterion_main!(benches);
