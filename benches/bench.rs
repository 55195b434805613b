// Criterion benchmarks for Kindred Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kindred_match::core::{haversine_distance, is_unswiped_candidate, matches_filter, rank_candidates};
use kindred_match::models::{DiscoveryFilter, Location, OrderBy, User};
use std::collections::HashSet;

fn create_user(id: i64, lat: f64, lon: f64) -> User {
    User {
        id,
        name: format!("User {}", id),
        age: 25 + (id % 10) as i32,
        gender: if id % 2 == 0 { "Female" } else { "Male" }.to_string(),
        location: Location::new(lat, lon),
        attractiveness_score: (id * 7919) % 101,
    }
}

fn create_population(count: usize) -> Vec<User> {
    (0..count)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.5;
            let lon_offset = (i as f64 * 0.0007) % 0.5;
            create_user(i as i64 + 1, 40.7128 + lat_offset, -74.0060 + lon_offset)
        })
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(40.7128),
                black_box(-74.0060),
                black_box(51.5074),
                black_box(-0.1278),
            )
        });
    });
}

fn bench_ranking(c: &mut Criterion) {
    let origin = Location::new(40.7128, -74.0060);
    let mut group = c.benchmark_group("rank_candidates");

    for count in [10, 100, 1000, 10000].iter() {
        let users = create_population(*count);

        for (label, order_by) in [
            ("distance", OrderBy::Distance),
            ("attractiveness_score", OrderBy::AttractivenessScore),
        ] {
            group.bench_with_input(BenchmarkId::new(label, count), count, |b, _| {
                b.iter(|| {
                    rank_candidates(
                        black_box(&origin),
                        black_box(users.clone()),
                        Some(order_by),
                        Some(50),
                    )
                });
            });
        }
    }

    group.finish();
}

fn bench_candidate_filtering(c: &mut Criterion) {
    let users = create_population(1000);
    let requester = 1;
    let swiped: HashSet<i64> = (2..500).step_by(3).collect();
    let filter = DiscoveryFilter {
        age: Some(28),
        gender: Some("female".to_string()),
        order_by: None,
        limit: None,
    };

    c.bench_function("candidate_filtering_1000_users", |b| {
        b.iter(|| {
            let filtered: Vec<&User> = users
                .iter()
                .filter(|u| is_unswiped_candidate(u, requester, &swiped))
                .filter(|u| matches_filter(u, &filter))
                .collect();

            black_box(filtered)
        });
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_ranking,
    bench_candidate_filtering
);

criterion_main!(benches);
