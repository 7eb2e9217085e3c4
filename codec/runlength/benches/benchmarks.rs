use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn scanline_like(len: usize) -> Vec<u8> {
    // Long white runs broken up by short noisy strokes, similar to a scanned page.
    (0..len)
        .map(|i| if (i / 64) % 5 == 0 { (i * 31 % 251) as u8 } else { 255 })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let data = scanline_like(1 << 20);
    c.bench_function("encode 1MiB", |b| b.iter(|| aw_runlength::encode(black_box(&data))));
}

fn bench_decode(c: &mut Criterion) {
    let encoded = aw_runlength::encode(&scanline_like(1 << 20));
    c.bench_function("decode 1MiB", |b| {
        b.iter(|| aw_runlength::decode(black_box(&encoded)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
