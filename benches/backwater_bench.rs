//! Benchmarks for the backwater solver and the event loop.
//!
//! Run with: `cargo bench --bench backwater_bench`

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use evofond::sediment::Lefort2015;
use evofond::{
    BoundaryCondition, EventConfig, FrictionLaw, Granulometry, Hydrogram, LavabreParams, Profile,
    Section, compute_depth, compute_event,
};

/// Rectangular reach of `n` sections with a slope break halfway down.
fn setup_reach(n: usize) -> Profile {
    let g = Arc::new(Granulometry::new(0.05, 0.02, 0.04, 0.15, 0.09, 0.2, 2.5).unwrap());
    let dx = 5.0;
    let sections = (0..n)
        .map(|i| {
            let x = i as f64 * dx;
            let x_break = (n / 2) as f64 * dx;
            let z = if x <= x_break {
                100.0 - 0.08 * x
            } else {
                100.0 - 0.08 * x_break - 0.01 * (x - x_break)
            };
            Section::rectangular(x, z, 6.0, g.clone())
                .unwrap()
                .with_z_min(z - 2.0)
                .unwrap()
        })
        .collect();
    Profile::new("bench", sections).unwrap()
}

fn bench_compute_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_depth");

    for n in [50, 200, 800] {
        let profile = setup_reach(n);
        for friction in [FrictionLaw::ManningStrickler, FrictionLaw::Ferguson] {
            group.bench_with_input(
                BenchmarkId::new(friction.name(), format!("{}_sections", n)),
                &n,
                |b, _| {
                    b.iter(|| {
                        compute_depth(
                            black_box(&profile),
                            black_box(15.0),
                            friction,
                            BoundaryCondition::CriticalDepth,
                            BoundaryCondition::NormalDepth,
                        )
                        .unwrap()
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_compute_event(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_event");
    group.sample_size(10);

    let hydrogram = Hydrogram::lavabre(&LavabreParams {
        duration: 900.0,
        tm: 300.0,
        qm: 15.0,
        qb: 1.0,
        alpha: 3.0,
        dt: 60.0,
    })
    .unwrap();
    let supply = Granulometry::uniform(0.04).unwrap();
    let sedimentogram = hydrogram.sedimentogram(&Lefort2015, 6.0, &supply, 0.08);
    let config = EventConfig {
        friction: FrictionLaw::Ferguson,
        ..Default::default()
    };

    for n in [50, 200] {
        let reach = setup_reach(n);
        group.bench_with_input(
            BenchmarkId::new("lavabre", format!("{}_sections", n)),
            &n,
            |b, _| {
                b.iter(|| {
                    let mut profile = reach.clone();
                    compute_event(
                        &mut profile,
                        hydrogram.time(),
                        hydrogram.discharge(),
                        &sedimentogram,
                        &Lefort2015,
                        &config,
                        None,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compute_depth, bench_compute_event);
criterion_main!(benches);
