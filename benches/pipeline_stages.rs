//! Benchmarks the CPU-side stages that run ahead of the GPU dispatch: flattening, line-soup
//! construction, path metadata, and scene packing. The nine GPU compute stages themselves need a
//! device and aren't included here; see `dispatcher::tests` for correctness coverage of those.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vello_compute_raster::color::Color;
use vello_compute_raster::flatten::{flatten_path_default, PathDef};
use vello_compute_raster::geometry::{FillRule, Path, Point};
use vello_compute_raster::linesoup::build_line_soup;
use vello_compute_raster::paths_meta::build_path_metadata;
use vello_compute_raster::scene::pack_scene;

fn starburst_path(points: usize) -> Path {
    let mut path = Path::new();
    let center = Point::new(500.0, 500.0);
    path.move_to(Point::new(center.x + 400.0, center.y));
    for i in 1..points {
        let angle = std::f64::consts::TAU * (i as f64) / (points as f64);
        let r = if i % 2 == 0 { 400.0 } else { 150.0 };
        path.line_to(Point::new(center.x + r * angle.cos(), center.y + r * angle.sin()));
    }
    path.close();
    path
}

fn wavy_cubic_path(segments: usize) -> Path {
    let mut path = Path::new();
    path.move_to(Point::new(0.0, 500.0));
    for i in 0..segments {
        let x0 = i as f64 * 20.0;
        let x1 = x0 + 20.0;
        let y_ctrl = if i % 2 == 0 { 400.0 } else { 600.0 };
        path.cubic_to(
            Point::new(x0 + 5.0, y_ctrl),
            Point::new(x0 + 15.0, y_ctrl),
            Point::new(x1, 500.0),
        );
    }
    path
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_path_default");
    for &n in &[16usize, 256, 4096] {
        let path = starburst_path(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &path, |b, path| {
            b.iter(|| {
                black_box(flatten_path_default(
                    black_box(path),
                    Color::rgb(200, 40, 40),
                    FillRule::NonZero,
                ))
            });
        });
    }
    group.finish();
}

fn bench_flatten_curves(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_wavy_cubics");
    for &n in &[16usize, 256, 2048] {
        let path = wavy_cubic_path(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &path, |b, path| {
            b.iter(|| {
                black_box(flatten_path_default(
                    black_box(path),
                    Color::rgb(40, 40, 200),
                    FillRule::NonZero,
                ))
            });
        });
    }
    group.finish();
}

fn many_paths(count: usize) -> (Vec<PathDef>, Vec<Vec<vello_compute_raster::geometry::PathElement>>) {
    let mut defs = Vec::with_capacity(count);
    let mut elements = Vec::with_capacity(count);
    for i in 0..count {
        let x = (i % 50) as f64 * 20.0;
        let y = (i / 50) as f64 * 20.0;
        let mut path = Path::new();
        path.move_to(Point::new(x, y));
        path.line_to(Point::new(x + 16.0, y));
        path.line_to(Point::new(x + 16.0, y + 16.0));
        path.line_to(Point::new(x, y + 16.0));
        path.close();
        let def = flatten_path_default(&path, Color::rgb(0, 128, 255), FillRule::NonZero);
        elements.push(path.elements.clone());
        defs.push(def);
    }
    (defs, elements)
}

fn bench_line_soup_and_metadata(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_encoding");
    for &n in &[50usize, 500, 2000] {
        let (defs, elements) = many_paths(n);
        group.bench_with_input(BenchmarkId::new("build_line_soup", n), &defs, |b, defs| {
            b.iter(|| black_box(build_line_soup(black_box(defs))));
        });
        group.bench_with_input(
            BenchmarkId::new("build_path_metadata", n),
            &defs,
            |b, defs| {
                b.iter(|| black_box(build_path_metadata(black_box(defs), 1024, 1024, 16)));
            },
        );
        group.bench_with_input(
            BenchmarkId::new("pack_scene", n),
            &(defs, elements),
            |b, (defs, elements)| {
                b.iter(|| black_box(pack_scene(black_box(defs), black_box(elements))));
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_flatten,
    bench_flatten_curves,
    bench_line_soup_and_metadata
);
criterion_main!(benches);
