//! Performance benchmarks for ocean-route-lib
//!
//! Run with: cargo bench --package ocean-route-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ocean_route_lib::{Config, Journey, SailMode, Waypoint, curve};

/// Generate a zig-zag coastal route with the specified number of waypoints.
///
/// Every third waypoint switches to rhumb line sailing and every waypoint carries a
/// turn radius small enough for the spacing.
fn generate_waypoints(num_waypoints: usize) -> Vec<Waypoint> {
    (0..num_waypoints)
        .map(|i| {
            let t = i as f64;
            let lat = 40.0 + t * 0.05;
            let lon = -10.0 + t * 0.2 + if i % 2 == 0 { 0.0 } else { 0.15 };
            let mode = SailMode::from_rhumb_flag(i % 3 == 0);
            Waypoint::new(format!("WP{i}"), lat, lon, mode, 370.4)
        })
        .collect()
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for num_waypoints in [100, 1_000, 10_000] {
        let waypoints = generate_waypoints(num_waypoints);
        group.throughput(Throughput::Elements(num_waypoints as u64));
        group.bench_with_input(
            BenchmarkId::new("journey", num_waypoints),
            &waypoints,
            |b, waypoints| {
                b.iter(|| Journey::from_waypoints("bench", waypoints, Config::default()).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_compound_curve(c: &mut Criterion) {
    let mut group = c.benchmark_group("compound_curve");

    let waypoints = generate_waypoints(1_000);
    let journey = Journey::from_waypoints("bench", &waypoints, Config::default()).unwrap();
    group.bench_function("two_point_runs", |b| {
        b.iter(|| journey.compound_curve().unwrap());
    });

    let config = Config {
        max_segment_length_nm: Some(1.0),
        ..Config::default()
    };
    let journey = Journey::from_waypoints("bench", &waypoints, config).unwrap();
    group.bench_function("segmented_runs", |b| {
        b.iter(|| journey.compound_curve().unwrap());
    });

    group.finish();
}

fn bench_text_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("text");

    let waypoints = generate_waypoints(1_000);
    let journey = Journey::from_waypoints("bench", &waypoints, Config::default()).unwrap();
    let text = journey.to_text().unwrap();
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("serialize", |b| {
        b.iter(|| journey.to_text().unwrap());
    });
    group.bench_function("parse", |b| {
        b.iter(|| curve::parse(&text).unwrap());
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_construction,
    bench_compound_curve,
    bench_text_round_trip,
);

criterion_main!(benches);
