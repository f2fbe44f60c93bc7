//! Example demonstrating resynchronization over a noisy link

use packer_core::{scanner::scan_stream_with_stats, Packer, PackerConfig, UnpackError};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Packer Noisy Link Example\n");

    let config = PackerConfig::default().with_len_checksum(true).yield_all_events();
    let mut packer = Packer::new(config)?;
    let mut rng = StdRng::seed_from_u64(7);

    // Step 1: Build a stream of 20 frames
    println!("Step 1: Packing 20 frames...");
    let mut stream = Vec::new();
    for i in 1..=20 {
        let payload = format!("Reading {} from sensor {}", i * 17, i % 4);
        stream.extend_from_slice(&packer.pack(payload.as_bytes())?);
    }
    println!("Clean stream: {} bytes\n", stream.len());

    // Step 2: Simulate line noise
    println!("Step 2: Simulating noise...");
    for _ in 0..6 {
        let pos = rng.gen_range(0..stream.len());
        stream[pos] ^= 1 << rng.gen_range(0..8);
        println!("  Flipped a bit at offset {}", pos);
    }
    let pos = rng.gen_range(0..stream.len());
    stream.splice(pos..pos, *b"\xAA\x55\xAA\x55");
    println!("  Inserted 4 noise bytes at offset {}", pos);
    let pos = rng.gen_range(0..stream.len() - 10);
    stream.drain(pos..pos + 10);
    println!("  Dropped 10 bytes at offset {}\n", pos);

    // Step 3: Receive in irregular chunks
    println!("Step 3: Receiving in irregular chunks...");
    let (mut received, mut crc_errors, mut desyncs) = (0, 0, 0);
    let mut rest = &stream[..];
    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(rng.gen_range(1..=32).min(rest.len()));
        for item in packer.unpack(chunk) {
            match item {
                Ok(_) => received += 1,
                Err(UnpackError::CrcMismatch { .. }) => crc_errors += 1,
                Err(UnpackError::OutOfSync) => desyncs += 1,
                Err(event) => println!("  event: {}", event),
            }
        }
        rest = tail;
    }
    println!("  Payloads:       {}", received);
    println!("  CRC mismatches: {}", crc_errors);
    println!("  Desyncs:        {}\n", desyncs);

    // Step 4: Offline scan of the same capture
    println!("Step 4: Scanning the capture offline...");
    let (frames, stats) = scan_stream_with_stats(packer.layout(), &stream);
    println!("  Delimiters found: {}", stats.delimiters_found);
    println!("  Valid frames:     {}", stats.frames_found);
    println!("  Decode failures:  {}", stats.decode_failures);
    println!("  Recovery rate:    {:.1}%", stats.recovery_rate());

    if let Some(frame) = frames.first() {
        println!(
            "  First frame at offset {}: {}",
            frame.offset,
            String::from_utf8_lossy(&frame.payload)
        );
    }

    Ok(())
}
