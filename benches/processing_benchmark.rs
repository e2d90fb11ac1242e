use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use prism_extractor::models::{DailyRecord, FieldSet};
use prism_extractor::raster::{Crs, GeoTransform, PointSampler, RasterGrid};
use prism_extractor::writers::FixedFormatEncoder;

// CONUS-sized 4 km grid: 1405 x 621 cells of 1/24 degree
fn create_test_grid(crs: Crs, transform: GeoTransform) -> RasterGrid {
    let (width, height) = (1405, 621);
    let values = (0..width * height).map(|i| (i % 1000) as f32 * 0.1).collect();
    RasterGrid::new(width, height, values, transform, crs, Some(-9999.0)).unwrap()
}

fn create_test_points(count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let f = i as f64 / count as f64;
            (-124.0 + f * 57.0, 25.0 + ((i * 7919) % count) as f64 / count as f64 * 24.0)
        })
        .collect()
}

fn create_test_records(days: usize) -> Vec<DailyRecord> {
    let start = NaiveDate::from_ymd_opt(1981, 1, 1).unwrap();
    (0..days)
        .map(|day| {
            let mut record = DailyRecord::for_date(start + chrono::Duration::days(day as i64));
            record.ppt = Some((day % 13) as f64 * 0.7);
            record.tmin = Some(-5.0 + (day % 30) as f64 * 0.5);
            record.tmax = Some(10.0 + (day % 30) as f64 * 0.6);
            record.srad = Some(150.0);
            record.rhum = Some(65.0);
            record.wind = Some(2.5);
            record
        })
        .collect()
}

fn benchmark_point_sampling(c: &mut Criterion) {
    let geographic = create_test_grid(
        Crs::prism_default().unwrap(),
        GeoTransform::new(-125.0208, 1.0 / 24.0, 49.9375, -1.0 / 24.0),
    );
    let albers = create_test_grid(
        Crs::from_epsg(5070).unwrap(),
        GeoTransform::new(-2_400_000.0, 4_000.0, 3_200_000.0, -4_000.0),
    );

    let mut group = c.benchmark_group("point_sampling");
    for count in [100, 1_000, 10_000] {
        let points = create_test_points(count);

        group.bench_with_input(BenchmarkId::new("geographic", count), &points, |b, points| {
            b.iter(|| {
                let sampler = PointSampler::new(&geographic).unwrap();
                black_box(sampler.sample(black_box(points)))
            })
        });

        group.bench_with_input(BenchmarkId::new("albers", count), &points, |b, points| {
            b.iter(|| {
                let sampler = PointSampler::new(&albers).unwrap();
                black_box(sampler.sample(black_box(points)))
            })
        });
    }
    group.finish();
}

fn benchmark_fixed_width_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_width_encoding");
    for years in [1, 10, 40] {
        let records = create_test_records(365 * years);

        group.bench_with_input(BenchmarkId::new("base", years), &records, |b, records| {
            let encoder = FixedFormatEncoder::new(FieldSet::NONE);
            b.iter(|| black_box(encoder.encode_all(records.iter()).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("full", years), &records, |b, records| {
            let encoder = FixedFormatEncoder::new(FieldSet::ALL);
            b.iter(|| black_box(encoder.encode_all(records.iter()).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_point_sampling, benchmark_fixed_width_encoding);
criterion_main!(benches);
