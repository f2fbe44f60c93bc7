use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use packer_core::{
    scanner::{scan_stream, scan_stream_with_stats},
    ManualClock, Packer, PackerConfig,
};

fn packer() -> Packer {
    Packer::with_clock(PackerConfig::default(), ManualClock::new()).unwrap()
}

fn make_stream(packer: &Packer, num_frames: usize, payload_len: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    for i in 0..num_frames {
        let payload = vec![b'x'; payload_len];
        stream.extend_from_slice(&packer.pack(&payload).unwrap());
        if i % 10 == 0 {
            // inject a bit of garbage periodically
            stream.extend_from_slice(b"GARBAGE");
        }
    }
    stream
}

fn bench_scanner(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");
    let packer = packer();

    for &payload_len in &[16usize, 256, 4096] {
        let stream = make_stream(&packer, 500, payload_len);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("scan_stream", payload_len),
            &stream,
            |b, data| {
                b.iter(|| {
                    let res = scan_stream(packer.layout(), data);
                    criterion::black_box(res);
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("scan_stream_with_stats", payload_len),
            &stream,
            |b, data| {
                b.iter(|| {
                    let res = scan_stream_with_stats(packer.layout(), data);
                    criterion::black_box(res);
                });
            },
        );
    }

    group.finish();
}

fn bench_noisy_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack_noisy");
    let mut rx = packer();

    for &payload_len in &[16usize, 256] {
        let stream = make_stream(&rx, 200, payload_len);
        group.throughput(Throughput::Bytes(stream.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(payload_len),
            &stream,
            |b, data| {
                b.iter(|| {
                    let count = data.chunks(64).map(|chunk| rx.unpack(chunk).count()).sum::<usize>();
                    criterion::black_box(count);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_scanner, bench_noisy_unpack);
criterion_main!(benches);
