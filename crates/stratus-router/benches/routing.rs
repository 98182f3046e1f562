//! Routing benchmarks.
//!
//! Run with: `cargo bench -p stratus-router`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use stratus_router::Router;

fn build_router(num_routes: usize) -> Router<usize> {
    let mut router = Router::new();

    for i in 0..num_routes / 3 {
        router
            .insert(Method::GET, &format!("/api/v1/resource{i}"), i)
            .expect("static route");
        router
            .insert(Method::GET, &format!("/api/v1/resource{i}/{{id}}"), i)
            .expect("param route");
        router
            .insert(
                Method::GET,
                &format!("/api/v1/org/{{orgId}}/resource{i}/{{id}}"),
                i,
            )
            .expect("nested route");
    }

    router
}

fn bench_static_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(router.at(&Method::GET, "/api/v1/resource20").is_ok()));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(router.at(&Method::GET, "/api/v1/resource25/12345").is_ok()));
    });
}

fn bench_nested_param_match(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("nested_param_match", |b| {
        b.iter(|| {
            black_box(
                router
                    .at(&Method::GET, "/api/v1/org/acme-corp/resource10/12345")
                    .is_ok(),
            )
        });
    });
}

fn bench_miss(c: &mut Criterion) {
    let router = build_router(100);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(router.at(&Method::GET, "/api/v1/nonexistent/path").is_err()));
    });
}

fn bench_table_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_size");
    for size in [30, 300, 3000] {
        let router = build_router(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &router, |b, router| {
            b.iter(|| black_box(router.at(&Method::GET, "/api/v1/resource5/99").is_ok()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_nested_param_match,
    bench_miss,
    bench_table_size
);
criterion_main!(benches);
