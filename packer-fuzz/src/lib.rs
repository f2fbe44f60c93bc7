//! Fuzzing entry points for packer-core
//!
//! Each function must return without panicking for any input. The first
//! input byte selects the frame configuration so one corpus exercises
//! every layout.
//!
//! To use with cargo-fuzz, call these from `fuzz_target!` bodies.

use packer_core::{
    decoder::decode_frame, scanner::scan_stream, CrcAlgorithm, FrameLayout, ManualClock, Packer,
    PackerConfig,
};

const CRCS: [Option<CrcAlgorithm>; 8] = [
    None,
    Some(CrcAlgorithm::Crc8),
    Some(CrcAlgorithm::Crc16CcittFalse),
    Some(CrcAlgorithm::Crc16Xmodem),
    Some(CrcAlgorithm::Crc32Mpeg2),
    Some(CrcAlgorithm::Crc32IsoHdlc),
    Some(CrcAlgorithm::Crc32c),
    Some(CrcAlgorithm::Crc64Xz),
];

/// Build a configuration from one selector byte
///
/// Bits 0-2 pick the CRC, bits 3-4 the extra length bytes, bit 5 the
/// length checksum and bits 6-7 the address width. Selectors outside the
/// management budget fall back to the default configuration.
pub fn config_from_selector(selector: u8) -> PackerConfig {
    let address_len = selector >> 6;
    let mut config = PackerConfig::minimal()
        .with_crc(CRCS[(selector & 0x07) as usize])
        .with_extra_len_bytes((selector >> 3) & 0x03)
        .with_len_checksum(selector & 0x20 != 0)
        .yield_all_events();
    if address_len > 0 {
        config = config.with_address(address_len, 1).with_default_dst(1);
    }

    if FrameLayout::new(&config).is_ok() {
        config
    } else {
        PackerConfig::default().yield_all_events()
    }
}

fn split_selector(data: &[u8]) -> (PackerConfig, &[u8]) {
    match data.split_first() {
        Some((&selector, rest)) => (config_from_selector(selector), rest),
        None => (PackerConfig::default(), data),
    }
}

/// Feed arbitrary bytes through the stream decoder in uneven chunks
pub fn fuzz_unpack(data: &[u8]) {
    let (config, rest) = split_selector(data);
    let Ok(mut packer) = Packer::with_clock(config, ManualClock::new()) else {
        return;
    };

    let mut remaining = rest;
    let mut chunk_len = 1;
    while !remaining.is_empty() {
        let (chunk, tail) = remaining.split_at(chunk_len.min(remaining.len()));
        for item in packer.unpack(chunk) {
            let _ = item;
        }
        remaining = tail;
        chunk_len = chunk_len % 97 + 7;
    }
}

/// Scan arbitrary bytes for frames
pub fn fuzz_scan(data: &[u8]) {
    let (config, rest) = split_selector(data);
    if let Ok(layout) = FrameLayout::new(&config) {
        let _ = scan_stream(&layout, rest);
    }
}

/// Strictly decode arbitrary bytes as one frame
pub fn fuzz_decode(data: &[u8]) {
    let (config, rest) = split_selector(data);
    if let Ok(layout) = FrameLayout::new(&config) {
        let _ = decode_frame(&layout, rest);
    }
}

/// Pack arbitrary payloads and check they come back unchanged
pub fn fuzz_round_trip(data: &[u8]) {
    let (config, payload) = split_selector(data);
    let Ok(mut packer) = Packer::with_clock(config, ManualClock::new()) else {
        return;
    };

    let Ok(frame) = packer.pack(payload) else {
        return;
    };
    let items: Vec<_> = packer.unpack(&frame).collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_deref(), Ok(payload));
}
