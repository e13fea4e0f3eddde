//! Physics benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use rein::physics::collider::ColliderShape;
use rein::physics::narrowphase::{detect_collision, NarrowphaseConfig};
use rein::physics::solver::{reflect_collision, resolve_collision};
use rein::physics::transform::Transform;
use rein::{pull_transforms, push_transforms};
use rein_impulse_bench::*;

// ---------------------------------------------------------------------------
// Broadphase
// ---------------------------------------------------------------------------

fn bench_broadphase(c: &mut Criterion) {
    type Setup = fn(usize) -> anyhow::Result<rein::PhysicsWorld>;
    let scenes: [(&str, Setup); 3] = [
        ("broadphase/uniform_boxes", setup_box_world),
        ("broadphase/mixed_shapes", setup_mixed_world),
        ("broadphase/sparse", setup_sparse_world),
    ];

    for (name, setup) in scenes {
        let mut group = c.benchmark_group(name);
        for &n in &[100, 500, 1000] {
            let world = setup(n).expect("scene setup");
            let broadphase = fill_broadphase(&world);
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    broadphase.for_each_pair(|i, j| {
                        criterion::black_box((i, j));
                    })
                });
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    let config = NarrowphaseConfig::default();
    let cube = ColliderShape::Cuboid {
        half_extents: Vec3::ONE,
    };
    let sphere = ColliderShape::Sphere { radius: 1.0 };
    let origin = Transform::identity();

    {
        let mut group = c.benchmark_group("narrowphase/box_box");
        let (a, b_hit) = collider_pair(
            cube.clone(),
            origin,
            cube.clone(),
            Transform::from_position(Vec3::new(1.5, 0.0, 0.0)),
        )
        .expect("colliders");
        group.bench_function("intersecting", |b| {
            b.iter(|| detect_collision(&a, &b_hit, &config));
        });

        let (a, b_miss) = collider_pair(
            cube.clone(),
            origin,
            cube.clone(),
            Transform::from_position(Vec3::new(5.0, 0.0, 0.0)),
        )
        .expect("colliders");
        group.bench_function("separated", |b| {
            b.iter(|| detect_collision(&a, &b_miss, &config));
        });

        let (a, b_rot) = collider_pair(
            cube.clone(),
            origin,
            cube.clone(),
            Transform::from_position(Vec3::new(1.8, 0.3, 0.0))
                .with_rotation(Vec3::new(0.0, 0.785, 0.4)),
        )
        .expect("colliders");
        group.bench_function("rotated", |b| {
            b.iter(|| detect_collision(&a, &b_rot, &config));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/sphere_sphere");
        let (a, b_hit) = collider_pair(
            sphere.clone(),
            origin,
            sphere.clone(),
            Transform::from_position(Vec3::new(1.5, 0.2, 0.0)),
        )
        .expect("colliders");
        group.bench_function("intersecting", |b| {
            b.iter(|| detect_collision(&a, &b_hit, &config));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/cone_box");
        let cone = ColliderShape::Cone {
            radius: 1.0,
            half_height: 1.0,
        };
        let (a, b_hit) = collider_pair(
            cone,
            origin,
            cube.clone(),
            Transform::from_position(Vec3::new(0.0, 1.8, 0.0)),
        )
        .expect("colliders");
        group.bench_function("intersecting", |b| {
            b.iter(|| detect_collision(&a, &b_hit, &config));
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("narrowphase/batch");
        for &n in &[100, 500, 1000] {
            let pairs: Vec<_> = (0..n)
                .map(|i| {
                    let x = i as f32 * 3.0;
                    collider_pair(
                        cube.clone(),
                        Transform::from_position(Vec3::new(x, 0.0, 0.0)),
                        cube.clone(),
                        Transform::from_position(Vec3::new(x + 1.5, 0.0, 0.0)),
                    )
                    .expect("colliders")
                })
                .collect();

            group.bench_with_input(BenchmarkId::from_parameter(n), &pairs, |b, pairs| {
                b.iter(|| {
                    for (ca, cb) in pairs {
                        let _ = detect_collision(ca, cb, &config);
                    }
                });
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver/contact_count");
    for &n in &[10, 100, 1000] {
        let contacts = setup_contacts(n).expect("contacts");
        group.bench_with_input(BenchmarkId::new("resolve", n), &n, |b, _| {
            b.iter_batched(
                || contacts.clone(),
                |mut pairs| {
                    for (rb_a, rb_b, contact) in &mut pairs {
                        let _ = resolve_collision(rb_a, rb_b, contact, 0.5);
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
        group.bench_with_input(BenchmarkId::new("reflect", n), &n, |b, _| {
            b.iter_batched(
                || contacts.clone(),
                |mut pairs| {
                    for (rb, _, contact) in &mut pairs {
                        let _ = reflect_collision(rb, -contact.normal, contact.point, 0.5);
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("pipeline/tick");
        group.sample_size(30);
        for &n in &[50, 100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_falling_scene(n).expect("scene setup"),
                    |mut physics| physics.tick(1.0 / 60.0),
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/sustained_60steps");
        group.sample_size(10);
        for &n in &[50, 200] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_falling_scene(n).expect("scene setup"),
                    |mut physics| {
                        for _ in 0..60 {
                            physics.step(1.0 / 60.0);
                        }
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/hecs_bridge");
        group.sample_size(20);
        for &n in &[100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
                b.iter_batched(
                    || setup_bridged_scene(n).expect("scene setup"),
                    |(mut world, mut physics)| {
                        push_transforms(&world, &mut physics);
                        physics.step(1.0 / 60.0);
                        pull_transforms(&mut world, &physics);
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }
}

criterion_group!(
    benches,
    bench_broadphase,
    bench_narrowphase,
    bench_solver,
    bench_pipeline
);
criterion_main!(benches);
