use criterion::{black_box, criterion_group, criterion_main, Criterion};

use focuscoach_core::pipeline::{decode_questions, DomainTag};
use focuscoach_core::sanitizer::sanitize;

fn batch(count: usize) -> String {
    let items: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"question":"If \frac{{x}}{{2}} = {i}, what is \sqrt{{x}}?","options":["a","b","c","d"],"correctIndex":2,"explanation":"Multiply both sides by 2.
Then take the root."}}"#
            )
        })
        .collect();
    format!("```json\n[{}]\n```", items.join(",\n"))
}

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");

    let clean = r#"[{"question":"2+2?","options":["1","2","3","4"],"correctIndex":3,"explanation":"sum"}]"#;
    let drill = batch(5);
    let diagnostic = batch(16);

    group.bench_function("clean", |b| b.iter(|| sanitize(black_box(clean))));
    group.bench_function("drill_batch", |b| b.iter(|| sanitize(black_box(&drill))));
    group.bench_function("diagnostic_batch", |b| {
        b.iter(|| sanitize(black_box(&diagnostic)))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_questions");
    let drill = batch(5);

    group.bench_function("drill_batch", |b| {
        b.iter(|| decode_questions(black_box(&drill), 5, DomainTag::Optional))
    });

    group.finish();
}

criterion_group!(benches, bench_sanitize, bench_decode);
criterion_main!(benches);
