use criterion::{Criterion, black_box, criterion_group, criterion_main};
use distsweep::active_buffer::ActiveVerticalBuffer;
use distsweep::segment::Segment;
use tempfile::TempDir;

fn bench_append_no_spill(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();

    c.bench_function("active_buffer_append_in_window", |b| {
        b.iter_batched(
            || ActiveVerticalBuffer::new(temp_dir.path(), 0, 1024, 16),
            |mut buffer| {
                for i in 0..512 {
                    buffer
                        .append(black_box(Segment::vertical(i as f64, 0.0, 100.0)))
                        .unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_append_with_spill(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();

    c.bench_function("active_buffer_append_spilling", |b| {
        b.iter_batched(
            || ActiveVerticalBuffer::new(temp_dir.path(), 0, 32, 16),
            |mut buffer| {
                for i in 0..512 {
                    buffer
                        .append(black_box(Segment::vertical(i as f64, 0.0, 100.0)))
                        .unwrap();
                }
                buffer.cleanup().unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_active_scan(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();

    c.bench_function("active_buffer_scan_with_overflow", |b| {
        b.iter_batched(
            || {
                let mut buffer = ActiveVerticalBuffer::new(temp_dir.path(), 0, 32, 16);
                for i in 0..512 {
                    let high = if i % 2 == 0 { 100.0 } else { 10.0 };
                    buffer
                        .append(Segment::vertical(i as f64, 0.0, high))
                        .unwrap();
                }
                buffer
            },
            |mut buffer| {
                let mut live = 0usize;
                buffer
                    .for_each_active(black_box(50.0), |_| {
                        live += 1;
                        Ok(())
                    })
                    .unwrap();
                buffer.cleanup().unwrap();
                black_box(live)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_append_no_spill,
    bench_append_with_spill,
    bench_active_scan
);
criterion_main!(benches);
