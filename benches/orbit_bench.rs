use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use cmap::prelude::*;

/// `n` hexahedra stacked into a column, each top face 3-sewn to the bottom
/// face of the next one.
fn hexahedron_column(n: usize) -> (CombinatorialMap, DartHandle) {
    let mut map = CombinatorialMap::new(3);
    let first = map.make_combinatorial_hexahedron().expect("hexahedron");
    let mut below = first;
    for _ in 1..n {
        let bottom = map.make_combinatorial_hexahedron().expect("hexahedron");
        let top = map.beta_path(below, &[2, 1, 1, 2]).expect("top face");
        map.sew(3, top, bottom).expect("stack hexahedra");
        below = bottom;
    }
    (map, first)
}

fn bench_orbits(c: &mut Criterion) {
    let mut group = c.benchmark_group("orbits");

    for &n in &[16usize, 256] {
        let (map, d) = hexahedron_column(n);

        group.bench_with_input(BenchmarkId::new("darts_of_component", n), &n, |b, _| {
            b.iter(|| {
                let count = map.darts_of_cell(d, 4).expect("orbit").count();
                black_box(count);
            });
        });

        group.bench_with_input(BenchmarkId::new("one_dart_per_face", n), &n, |b, _| {
            b.iter(|| {
                let count = map.one_dart_per_cell(2).expect("cells").count();
                black_box(count);
            });
        });

        group.bench_with_input(BenchmarkId::new("count_all_cells", n), &n, |b, _| {
            b.iter(|| {
                let counts = map.count_all_cells().expect("counts");
                black_box(counts);
            });
        });
    }
    group.finish();
}

fn bench_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("edits");

    for &n in &[16usize, 256] {
        group.bench_with_input(BenchmarkId::new("split_every_edge", n), &n, |b, &n| {
            b.iter_batched(
                || hexahedron_column(n).0,
                |mut map| {
                    let edges: Vec<DartHandle> =
                        map.one_dart_per_cell(1).expect("edges").collect();
                    for e in edges {
                        map.insert_cell_0_in_cell_1(e).expect("split");
                    }
                    black_box(map.number_of_darts());
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_orbits, bench_edits);
criterion_main!(benches);
