//! # GPS Operations and Turn Control Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drone_lib::{
    gps_ops::{parse_fix, CalibrationFrame},
    turn_ctrl::{self, step, VehicleKinematicState},
};

fn gps_ops_benchmark(c: &mut Criterion) {
    let frame =
        CalibrationFrame::calibrate(29.1899, -81.0465, 29.1904, -81.0459, 60.0, 40.0, 12.0)
            .unwrap();

    let sentence = "$GPRMC,123519,A,2911.4000,N,08102.8000,W,022.4,084.4,230394,003.1,W*6A";

    c.bench_function("parse_fix", |b| {
        b.iter(|| parse_fix(black_box(sentence)).unwrap())
    });

    c.bench_function("sentence_to_field", |b| {
        b.iter(|| {
            let fix = parse_fix(black_box(sentence)).unwrap();
            frame.geodetic_to_field(fix.lat_deg, fix.lon_deg).unwrap()
        })
    });

    c.bench_function("field_round_trip", |b| {
        b.iter(|| {
            let p = frame
                .geodetic_to_field(black_box(29.190119), black_box(-81.046239))
                .unwrap();
            frame.field_to_geodetic(&p)
        })
    });
}

fn turn_ctrl_benchmark(c: &mut Criterion) {
    let params = turn_ctrl::Params::default();

    c.bench_function("turn_ctrl_100_steps", |b| {
        b.iter(|| {
            let mut s = step(
                VehicleKinematicState::new(0.0, 270.0, 2.0, 10.0, 10.0, 0.1),
                &params,
            )
            .unwrap();

            for _ in 0..100 {
                s = step(s.next(black_box(270.0), 2.0, 0.1), &params).unwrap();
            }

            s
        })
    });
}

criterion_group!(benches, gps_ops_benchmark, turn_ctrl_benchmark);
criterion_main!(benches);
