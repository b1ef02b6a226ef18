//! Benchmarks for the geometry kernel.
//!
//! Measures the arc fit, angle resolution, split and chain-walk paths the
//! sequencers hit repeatedly.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use laserkit_core::{Curve3, Point3, Tooling, ToolingKind, ToolingSegment, Vector3, EPS};

fn ccw_arc(sweep: f64) -> Curve3 {
    let at = |t: f64| Point3::new(25.0 * t.cos(), 25.0 * t.sin(), 0.0);
    Curve3::arc(at(0.0), at(sweep * 0.25), at(sweep * 0.75), at(sweep))
}

fn straight_chain(n: usize) -> Tooling {
    let segs = (0..n)
        .map(|i| {
            let x = i as f64 * 10.0;
            ToolingSegment::with_normal(
                Curve3::line(Point3::new(x, 0.0, 0.0), Point3::new(x + 10.0, 0.0, 0.0)),
                Vector3::z_axis(),
            )
        })
        .collect();
    Tooling::new("bench", ToolingKind::Notch, segs)
}

fn bench_arc_queries(c: &mut Criterion) {
    let n = Vector3::z_axis();
    let arc = ccw_arc(2.0);

    c.bench_function("arc_length", |b| {
        b.iter(|| black_box(&arc).length(black_box(&n)).unwrap())
    });
    c.bench_function("arc_point_at_length", |b| {
        b.iter(|| {
            black_box(&arc)
                .point_at_length_from_start(black_box(&n), black_box(20.0))
                .unwrap()
        })
    });
    c.bench_function("arc_is_point_on", |b| {
        let p = arc.point_at_param(&n, 0.4).unwrap();
        b.iter(|| {
            black_box(&arc)
                .is_point_on(black_box(&p), &n, EPS, true)
                .unwrap()
        })
    });
}

fn bench_split(c: &mut Criterion) {
    let n = Vector3::z_axis();
    let arc = ccw_arc(2.0);
    let pts = [
        arc.point_at_param(&n, 0.25).unwrap(),
        arc.point_at_param(&n, 0.5).unwrap(),
        arc.point_at_param(&n, 0.75).unwrap(),
    ];
    c.bench_function("arc_split_three_points", |b| {
        b.iter(|| black_box(&arc).split_at(black_box(&pts), 0.0, &n, EPS).unwrap())
    });
}

fn bench_chain_walks(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_walk");
    for &n in &[8usize, 32, 128] {
        let chain = straight_chain(n);
        let target = n as f64 * 10.0 * 0.6;
        group.bench_with_input(BenchmarkId::new("forward", n), &chain, |b, chain| {
            b.iter(|| {
                chain
                    .point_and_index_at_length_forward(0, black_box(target))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_arc_queries, bench_split, bench_chain_walks);
criterion_main!(benches);
