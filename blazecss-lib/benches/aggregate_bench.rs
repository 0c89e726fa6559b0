extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use blazecss_lib::index::ClassIndex;
use blazecss_lib::style::aggregate::aggregate;
use blazecss_lib::style::blaze_css::parse_stylesheet;

fn bench_many_classes(c: &mut Criterion) {
    let mut big_css = String::with_capacity(5_000_000);
    for i in 0..50_000 {
        big_css.push_str(&format!(
            ".global(c-{i}) {{ color: red; margin: {i}px; }}\n:global(.g-{i}) {{ padding: 0; }}\n"
        ));
    }

    c.bench_function("many_classes", |b| {
        b.iter(|| ClassIndex::from_records(aggregate(&parse_stylesheet(&big_css))))
    });
}

fn bench_deep_media_nesting(c: &mut Criterion) {
    let mut deep_css = String::new();
    for i in 0..200 {
        deep_css.push_str(&format!("@media (min-width: {i}px) {{ "));
    }
    deep_css.push_str(".global(deep) { color: blue; }");
    for _ in 0..200 {
        deep_css.push_str(" }");
    }

    c.bench_function("deep_media_nesting", |b| {
        b.iter(|| aggregate(&parse_stylesheet(&deep_css)))
    });
}

criterion_group!(benches, bench_many_classes, bench_deep_media_nesting);
criterion_main!(benches);
