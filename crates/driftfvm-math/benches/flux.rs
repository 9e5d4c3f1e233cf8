// crates/driftfvm-math/benches/flux.rs

//! Microbench for the per-edge hot path: Bernoulli evaluation and the
//! Scharfetter-Gummel flux, on plain f64 and on the AD dual.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use driftfvm_math::{bern, sg_flux_n, Dual};

fn bench_bernoulli(c: &mut Criterion) {
    c.bench_function("bern_f64", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            let mut x = -40.0;
            while x < 40.0 {
                acc += bern(black_box(x));
                x += 0.01;
            }
            acc
        })
    });
}

fn bench_sg_flux(c: &mut Criterion) {
    c.bench_function("sg_flux_f64", |b| {
        b.iter(|| {
            sg_flux_n(
                black_box(0.025852),
                black_box(0.1),
                black_box(0.45),
                black_box(1.0e10),
                black_box(3.0e15),
            )
        })
    });

    c.bench_function("sg_flux_dual", |b| {
        b.iter(|| {
            sg_flux_n(
                Dual::constant(0.025852),
                Dual::var(black_box(0.1), 0),
                Dual::var(black_box(0.45), 1),
                Dual::var(black_box(1.0e10), 2),
                Dual::var(black_box(3.0e15), 3),
            )
        })
    });
}

criterion_group!(benches, bench_bernoulli, bench_sg_flux);
criterion_main!(benches);
