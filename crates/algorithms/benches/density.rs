//! Benchmarks for kernel density estimation and the full delineation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use downtown_algorithms::density::{kernel_density, DensityParams};
use downtown_algorithms::pipeline::{delineate_town, DowntownParams};
use downtown_core::town::{Poi, Town};
use geo::{polygon, Coord, MultiPolygon};

fn create_points(n: usize) -> Vec<Coord<f64>> {
    // Dense core plus a sparse spread over a 5 km square
    (0..n)
        .map(|i| {
            let a = i as f64 * 2.399_963;
            let r = if i % 4 == 0 {
                2500.0 * ((i as f64 + 0.5) / n as f64).sqrt()
            } else {
                400.0 * ((i as f64 + 0.5) / n as f64).sqrt()
            };
            Coord {
                x: 2500.0 + r * a.cos(),
                y: 2500.0 + r * a.sin(),
            }
        })
        .collect()
}

fn bench_kernel_density(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernel_density");

    for n in [100, 1000, 5000].iter() {
        let points = create_points(*n);
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, _| {
            b.iter(|| kernel_density(black_box(&points), &DensityParams::default()).unwrap())
        });
    }

    group.finish();
}

fn bench_delineate_town(c: &mut Criterion) {
    let town = Town::new(
        "bench",
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 5000.0, y: 0.0),
            (x: 5000.0, y: 5000.0),
            (x: 0.0, y: 5000.0),
        ]]),
    );
    let pois: Vec<Poi> = create_points(2000).into_iter().map(|c| Poi::new(c.x, c.y)).collect();

    c.bench_function("delineate_town", |b| {
        b.iter(|| delineate_town(black_box(&town), black_box(&pois), &DowntownParams::default()).unwrap())
    });
}

criterion_group!(benches, bench_kernel_density, bench_delineate_town);
criterion_main!(benches);
