//! Estimate slot and record access benchmarks.
//!
//! Measures the cross-thread hot paths a control cycle touches every
//! 2 ms: estimate snapshot, record column emission and name lookup.

use criterion::{Criterion, criterion_group, criterion_main};
use exo_common::estimate::{EstimateSlot, GaitEstimate};
use exo_common::record::CycleRecord;
use std::hint::black_box;

fn bench_slot_publish(c: &mut Criterion) {
    let slot = EstimateSlot::new();
    let estimate = GaitEstimate {
        heel_strike_s: 42.1,
        stride_period_s: 1.1,
        peak_torque_nm: 15.0,
        in_swing: false,
    };

    c.bench_function("estimate_slot_publish", |b| {
        b.iter(|| {
            slot.publish(black_box(estimate));
        });
    });
}

fn bench_slot_snapshot(c: &mut Criterion) {
    let slot = EstimateSlot::new();
    slot.publish(GaitEstimate {
        heel_strike_s: 42.1,
        stride_period_s: 1.1,
        peak_torque_nm: 15.0,
        in_swing: false,
    });

    c.bench_function("estimate_slot_snapshot", |b| {
        b.iter(|| {
            let _estimate = black_box(slot.snapshot());
        });
    });
}

fn bench_record_values(c: &mut Criterion) {
    let record = CycleRecord::default();

    c.bench_function("record_values", |b| {
        b.iter(|| {
            let _values = black_box(record.values());
        });
    });
}

fn bench_record_field_by_name(c: &mut Criterion) {
    let record = CycleRecord::default();

    c.bench_function("record_field_by_name", |b| {
        b.iter(|| {
            let _value = black_box(record.field("winding_temp_c"));
        });
    });
}

criterion_group!(
    benches,
    bench_slot_publish,
    bench_slot_snapshot,
    bench_record_values,
    bench_record_field_by_name,
);
criterion_main!(benches);
