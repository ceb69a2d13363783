use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use linedex::{fields, Config, FieldFlags, Schema, SearchEngine};
use rand::Rng;
use tempfile::{tempdir, TempDir};

const WORDS: [&str; 12] = [
    "quick", "brown", "fox", "jumps", "lazy", "dog", "search", "engine",
    "development", "storage", "record", "typo",
];

fn sentence(rng: &mut impl Rng, length: usize) -> String {
    (0..length)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn schema() -> Schema {
    Schema::new("bench")
        .add_field("title", FieldFlags::REQUIRED | FieldFlags::STORED | FieldFlags::INDEXED)
        .unwrap()
        .add_field("text", FieldFlags::STORED | FieldFlags::INDEXED | FieldFlags::FULLTEXT)
        .unwrap()
}

fn engine_with_docs(count: usize) -> (TempDir, SearchEngine) {
    let dir = tempdir().unwrap();
    let config = Config::default().with_storage_path(dir.path());
    let mut engine = SearchEngine::open(schema(), config).unwrap();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let title = format!("Document {}", i);
        let text = sentence(&mut rng, 20);
        engine.add_document(fields([("title", title), ("text", text)])).unwrap();
    }
    engine.flush().unwrap();
    (dir, engine)
}

fn bench_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("flush_batch");
    group.sample_size(10);

    for batch_size in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), batch_size, |b, &batch_size| {
            b.iter(|| black_box(engine_with_docs(batch_size)));
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let (_dir, mut engine) = engine_with_docs(500);

    let mut group = c.benchmark_group("search");
    for query in ["fox", "quick fox", "search OR typo", "dog NOT(lazy)", "develop*", "devlopment"] {
        group.bench_with_input(BenchmarkId::from_parameter(query), query, |b, query| {
            b.iter(|| black_box(engine.search(query).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flush, bench_queries);
criterion_main!(benches);
