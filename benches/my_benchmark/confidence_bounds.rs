use criterion::{black_box, Criterion};
use eval_insights::frame::{DataFrame, Value};
use eval_insights::stats::bounds::with_confidence_bounds;
use eval_insights::stats::confidence::{supported_confidence_levels, z_alpha};

fn scores(rows: usize) -> DataFrame {
    let mut frame = DataFrame::new(["task_name", "model", "score", "stderr"]).unwrap();
    for index in 0..rows {
        let stderr = if index % 10 == 0 {
            Value::Null
        } else {
            Value::Float(0.01 + (index % 7) as f64 * 0.005)
        };

        frame
            .push_row(vec![
                format!("task-{}", index % 12).into(),
                format!("provider/model-{}", index % 20).into(),
                Value::Float((index % 100) as f64 / 100.0),
                stderr,
            ])
            .unwrap();
    }
    frame
}

pub fn bench_z_alpha(c: &mut Criterion) {
    let levels: Vec<f64> = supported_confidence_levels().chain([0.5, 0.96]).collect();
    c.bench_function("z_alpha_all_levels", |b| {
        b.iter(|| {
            for &level in &levels {
                let _ = black_box(z_alpha(black_box(level)));
            }
        })
    });
}

pub fn bench_with_confidence_bounds(c: &mut Criterion) {
    for &rows in &[100, 1_000, 10_000] {
        let frame = scores(rows);
        let id = format!("with_confidence_bounds_{}", rows);
        c.bench_function(&id, |b| {
            b.iter_batched(
                || frame.clone(),
                |mut frame| with_confidence_bounds(&mut frame, "score", "stderr", 0.95).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
    }
}
