//! Benchmarks for the flood analysis components

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use floodsar_algorithms::classification::{WaterClassifier, WaterClassifierParams};
use floodsar_algorithms::hydrology::{simulate_propagation, PropagationParams};
use floodsar_algorithms::imagery::{ChangeDetector, ChangeDetectorParams};
use floodsar_algorithms::morphology::majority_filter;
use floodsar_algorithms::vector::polygonize;
use floodsar_core::{BoundingBox, Mask, Raster};

fn bbox() -> BoundingBox {
    BoundingBox::new(17.0, 51.0, 17.5, 51.5)
}

/// Land/water backscatter with a textured pattern of dark patches.
fn create_sar(size: usize, flooded: bool) -> Raster<f64> {
    let mut r = Raster::new(size, size).with_bbox(bbox());
    for row in 0..size {
        for col in 0..size {
            let noise = ((row * 7 + col * 13) % 17) as f64 / 8.0;
            let river = col % 64 < 6;
            let flood = flooded && (row / 32 + col / 32) % 3 == 0;
            let v = if river || flood { -21.0 } else { -7.0 };
            r.set(row, col, v + noise).unwrap();
        }
    }
    r
}

fn create_dem(size: usize) -> Raster<f64> {
    let mut r = Raster::new(size, size).with_bbox(bbox());
    for row in 0..size {
        for col in 0..size {
            let v = 50.0 + ((col % 64) as f64 - 32.0).abs() + row as f64 * 0.01;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

/// Speckled mask: scattered single pixels plus square blocks.
fn create_mask(size: usize) -> Mask {
    let mut m = Mask::new(size, size).with_bbox(bbox());
    for row in 0..size {
        for col in 0..size {
            let block = (row / 16 + col / 16) % 4 == 0;
            let speckle = (row * 31 + col * 17) % 23 == 0;
            m.set(row, col, block || speckle).unwrap();
        }
    }
    m
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classification/classify");
    for size in [256, 512, 1024] {
        let sar = create_sar(size, true);
        let classifier = WaterClassifier::new(WaterClassifierParams::default());
        classifier.fit(&[&sar]).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| classifier.classify(black_box(&sar)).unwrap())
        });
    }
    group.finish();
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/change_detection");
    group.sample_size(20);
    for size in [256, 512, 1024] {
        let before = create_sar(size, false);
        let after = create_sar(size, true);
        let detector = ChangeDetector::new(
            Arc::new(WaterClassifier::default()),
            ChangeDetectorParams::default(),
        );
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| detector.detect(black_box(&before), black_box(&after)).unwrap())
        });
    }
    group.finish();
}

fn bench_majority(c: &mut Criterion) {
    let mut group = c.benchmark_group("morphology/majority");
    for size in [256, 512, 1024, 2048] {
        let mask = create_mask(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| majority_filter(black_box(&mask)))
        });
    }
    group.finish();
}

fn bench_polygonize(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/polygonize");
    for size in [256, 512, 1024] {
        let mask = majority_filter(&create_mask(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| polygonize(black_box(&mask)))
        });
    }
    group.finish();
}

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydrology/propagation");
    let params = PropagationParams::default();
    for size in [256, 512, 1024] {
        let mask = create_mask(size);
        let dem = create_dem(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| simulate_propagation(black_box(&mask), &dem, &params).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_detect,
    bench_majority,
    bench_polygonize,
    bench_propagation,
);
criterion_main!(benches);
