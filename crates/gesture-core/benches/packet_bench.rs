//! Criterion benchmarks for bridge frame encoding.
//!
//! Run with:
//! ```bash
//! cargo bench --package gesture-core --bench packet_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gesture_core::{
    decode_packet, encode_keyboard_packet, encode_mouse_packet, HidKeyCode, MouseAction,
    MouseReport, SymbolTable,
};

fn bench_keyboard(c: &mut Criterion) {
    let keys = [HidKeyCode::KeyW, HidKeyCode::ShiftLeft, HidKeyCode::Space];
    c.bench_function("encode_keyboard_packet", |b| {
        b.iter(|| encode_keyboard_packet(black_box(&keys)))
    });
}

fn bench_mouse(c: &mut Criterion) {
    let actions = [MouseAction::MoveLeft, MouseAction::WheelUp, MouseAction::LeftPress];
    c.bench_function("combine_and_encode_mouse", |b| {
        b.iter(|| encode_mouse_packet(&MouseReport::combine(black_box(&actions))))
    });
}

fn bench_split(c: &mut Criterion) {
    let table = SymbolTable::new();
    let symbols = ["w", "left_shift", "mouse_wheel_up", "kp_enter", "f12"];
    c.bench_function("split_symbols", |b| b.iter(|| table.split(black_box(&symbols))));
}

fn bench_decode(c: &mut Criterion) {
    let bytes = encode_keyboard_packet(&[HidKeyCode::KeyA]);
    c.bench_function("decode_keyboard_packet", |b| {
        b.iter(|| decode_packet(black_box(&bytes)))
    });
}

criterion_group!(benches, bench_keyboard, bench_mouse, bench_split, bench_decode);
criterion_main!(benches);
