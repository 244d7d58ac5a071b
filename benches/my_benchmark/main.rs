// Available modules
mod confidence_bounds;

// Used Modules
use confidence_bounds::*;
use criterion::{criterion_group, criterion_main, Criterion};

#[cfg(unix)]
use pprof::criterion::{Output, PProfProfiler};

fn criterion_benchmark(c: &mut Criterion) {
    bench_z_alpha(c);
    bench_with_confidence_bounds(c);
}

#[cfg(unix)]
criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}

#[cfg(not(unix))]
criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
