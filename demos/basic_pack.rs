//! Basic packing example: two addressed peers exchanging frames

use packer_core::{CrcAlgorithm, Packer, PackerConfig, UnpackError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows every packed and unpacked frame
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Packer Basic Example\n");

    let base = PackerConfig::default()
        .with_crc(Some(CrcAlgorithm::Crc16CcittFalse))
        .yield_all_events();
    let mut sensor = Packer::new(base.clone().with_address(1, 0x10).with_default_dst(0x01))?;
    let mut hub = Packer::new(base.with_address(1, 0x01).with_default_dst(0x10))?;

    println!(
        "Header: {} bytes, max payload: {} bytes\n",
        hub.layout().header_len(),
        hub.max_payload()
    );

    // The sensor sends readings to the hub, plus one frame for another node
    let mut wire = Vec::new();
    for i in 1..=3 {
        let frame = sensor.pack(format!("temperature {} = 21.{}C", i, i).as_bytes())?;
        println!("Frame {}: {} bytes -> {:02x?}", i, frame.len(), &frame[..]);
        wire.extend_from_slice(&frame);
    }
    wire.extend_from_slice(&sensor.pack_to(b"not for the hub", 0x22)?);

    println!("\nHub receives {} bytes:", wire.len());
    for item in hub.unpack(&wire) {
        match item {
            Ok(payload) => println!("  payload: {}", String::from_utf8_lossy(&payload)),
            Err(UnpackError::OtherRecipient { dst, src }) => {
                println!("  skipped frame for {:#04x} (hub is {:#04x})", dst, src)
            }
            Err(event) => println!("  event: {}", event),
        }
    }

    // The hub answers, and the sensor reads the reply one byte at a time
    let reply = hub.pack(b"ack")?;
    for &byte in reply.iter() {
        for item in sensor.unpack(&[byte]) {
            println!("\nSensor received: {:?}", item?);
        }
    }

    Ok(())
}
