//! Stream scanner for damaged or noisy input
//!
//! Every valid frame ends with the only `0x00` it contains, so a captured
//! byte stream splits into delimiter-terminated windows. Each window either
//! ends with a valid frame (possibly preceded by garbage) or holds nothing
//! recoverable.

use crate::constants::{DELIMITER, MAX_RESYNC_CANDIDATES};
use crate::decoder::{decode_frame, decode_header, verify_body, verify_len_checksum};
use crate::types::FrameLayout;
use alloc::vec::Vec;
use bytes::Bytes;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A frame found at a specific offset in the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFrame {
    /// Byte offset of the frame's first byte
    pub offset: usize,

    /// Total size of the frame in bytes, delimiter included
    pub size: usize,

    /// Destination address carried by the frame, if addressing is enabled
    pub address: Option<u32>,

    /// The decoded payload
    pub payload: Bytes,
}

/// Find the first offset in `window` at which a valid frame ends exactly at
/// the window's last byte
///
/// `window` is expected to end with the delimiter. Offsets are tried in
/// increasing order, so the longest valid frame wins. The header of each
/// offset is checked first; the CRC and payload are only verified when the
/// announced length ends at the delimiter, and at most
/// [`MAX_RESYNC_CANDIDATES`] such bodies are verified per window.
pub fn find_frame_start(layout: &FrameLayout, window: &[u8]) -> Option<usize> {
    if window.last() != Some(&DELIMITER) {
        return None;
    }

    // A frame is at least one header byte plus the delimiter
    let min_len = layout.frame_len(0);
    let last_start = window.len().checked_sub(min_len)?;
    let mut body_checks = 0;

    for start in 0..=last_start {
        let candidate = &window[start..];
        let Ok(header) = decode_header(layout, candidate) else {
            continue;
        };
        if layout.frame_len(header.encoded_len) != candidate.len()
            || verify_len_checksum(layout, &header).is_err()
        {
            continue;
        }

        if verify_body(layout, &header, candidate).is_ok() {
            return Some(start);
        }

        body_checks += 1;
        if body_checks == MAX_RESYNC_CANDIDATES {
            #[cfg(feature = "logging")]
            warn!(
                "Giving up on window of {} bytes after {} failed candidates",
                window.len(),
                body_checks
            );
            return None;
        }
    }

    None
}

/// Scan a byte stream for valid frames, even if the stream is damaged
///
/// This function:
/// 1. Splits the stream at every delimiter
/// 2. Looks for a valid frame ending at each delimiter
/// 3. Collects the frames it can decode and skips the rest
///
/// Trailing bytes without a delimiter are ignored. No address filtering
/// is applied.
pub fn scan_stream(layout: &FrameLayout, data: &[u8]) -> Vec<LocatedFrame> {
    scan_stream_with_stats(layout, data).0
}

/// Scan statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Total bytes scanned
    pub bytes_scanned: usize,

    /// Number of valid frames found
    pub frames_found: usize,

    /// Number of delimiters seen
    pub delimiters_found: usize,

    /// Number of non-empty windows without a valid frame
    pub decode_failures: usize,

    /// Total bytes recovered (sum of all valid frame sizes)
    pub bytes_recovered: usize,
}

impl ScanStats {
    /// Calculate recovery rate as a percentage
    pub fn recovery_rate(&self) -> f64 {
        if self.bytes_scanned == 0 {
            0.0
        } else {
            (self.bytes_recovered as f64 / self.bytes_scanned as f64) * 100.0
        }
    }
}

/// Scan stream with statistics
pub fn scan_stream_with_stats(layout: &FrameLayout, data: &[u8]) -> (Vec<LocatedFrame>, ScanStats) {
    let mut stats = ScanStats {
        bytes_scanned: data.len(),
        ..Default::default()
    };
    let mut results = Vec::new();
    let mut window_start = 0;

    #[cfg(feature = "logging")]
    debug!("Starting stream scan of {} bytes", data.len());

    for end in memchr::memchr_iter(DELIMITER, data) {
        stats.delimiters_found += 1;
        let window = &data[window_start..=end];

        // Runs of delimiters leave single-byte windows behind
        if window.len() > 1 {
            match find_frame_start(layout, window) {
                Some(start) => {
                    let offset = window_start + start;
                    // find_frame_start already decoded it successfully
                    if let Ok(frame) = decode_frame(layout, &data[offset..]) {
                        stats.bytes_recovered += frame.size;
                        results.push(LocatedFrame {
                            offset,
                            size: frame.size,
                            address: frame.address,
                            payload: frame.payload,
                        });
                    }
                }
                None => {
                    #[cfg(feature = "logging")]
                    warn!(
                        "No valid frame in window at offset {} ({} bytes)",
                        window_start,
                        window.len()
                    );
                    stats.decode_failures += 1;
                }
            }
        }

        window_start = end + 1;
    }

    stats.frames_found = results.len();

    #[cfg(feature = "logging")]
    debug!(
        "Scan complete: found {} valid frames out of {} bytes scanned",
        stats.frames_found,
        data.len()
    );

    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackerConfig;
    use crate::encoder::encode_frame;
    use alloc::vec;

    fn layout() -> FrameLayout {
        FrameLayout::new(&PackerConfig::default().with_address(1, 1)).unwrap()
    }

    #[test]
    fn test_scan_clean_stream() {
        let layout = layout();
        let mut stream = Vec::new();
        for (i, payload) in [&b"frame 1"[..], b"frame 2", b"frame 3"].iter().enumerate() {
            stream.extend_from_slice(&encode_frame(&layout, payload, Some(i as u32)).unwrap());
        }

        let results = scan_stream(&layout, &stream);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].offset, 0);
        assert_eq!(results[0].payload.as_ref(), b"frame 1");
        assert_eq!(results[1].address, Some(1));
        assert_eq!(results[2].payload.as_ref(), b"frame 3");
        assert_eq!(results[2].offset + results[2].size, stream.len());
    }

    #[test]
    fn test_scan_with_corruption() {
        let layout = layout();
        let frame1 = encode_frame(&layout, b"frame 1", Some(1)).unwrap();
        let frame2 = encode_frame(&layout, b"frame 2", Some(1)).unwrap();

        let mut stream = Vec::new();
        stream.extend_from_slice(&frame1);
        stream.extend_from_slice(b"GARBAGE DATA HERE!!!");
        stream.extend_from_slice(&frame2);

        let results = scan_stream(&layout, &stream);

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].offset, frame1.len() + 20);
        assert_eq!(results[1].payload.as_ref(), b"frame 2");
    }

    #[test]
    fn test_scan_missing_start() {
        let layout = layout();
        let frame1 = encode_frame(&layout, b"frame 1", Some(1)).unwrap();
        let frame2 = encode_frame(&layout, b"frame 2", Some(1)).unwrap();

        let mut stream = Vec::new();
        stream.extend_from_slice(&frame1);
        stream.extend_from_slice(&frame2);

        // Chop the beginning of the first frame
        let (results, stats) = scan_stream_with_stats(&layout, &stream[3..]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].payload.as_ref(), b"frame 2");
        assert_eq!(stats.decode_failures, 1);
        assert_eq!(stats.delimiters_found, 2);
    }

    #[test]
    fn test_find_frame_start_requires_delimiter() {
        let layout = layout();
        let frame = encode_frame(&layout, b"x", Some(1)).unwrap();

        assert_eq!(find_frame_start(&layout, &frame), Some(0));
        assert_eq!(find_frame_start(&layout, &frame[..frame.len() - 1]), None);
        assert_eq!(find_frame_start(&layout, &[0x00]), None);
    }

    /// Prepend `count` headers, each announcing a frame that ends at the delimiter
    fn with_decoy_headers(layout: &FrameLayout, frame: &[u8], count: usize) -> Vec<u8> {
        let mut window = frame.to_vec();
        for _ in 0..count {
            // 0x42 payloads shorter than 0x41 bytes keep their length under COBS/R
            let encoded_len = window.len() - layout.crc_len() - 1;
            let decoy = encode_frame(layout, &vec![0x42; encoded_len], Some(1)).unwrap();
            let mut next = decoy[..layout.header_len()].to_vec();
            next.extend_from_slice(&window);
            window = next;
        }
        window
    }

    #[test]
    fn test_find_frame_start_skips_failed_candidate() {
        let layout = layout();
        let frame = encode_frame(&layout, b"target", Some(1)).unwrap();
        let window = with_decoy_headers(&layout, &frame, 1);

        let decoy = decode_header(&layout, &window).unwrap();
        assert_eq!(layout.frame_len(decoy.encoded_len), window.len());
        assert_eq!(find_frame_start(&layout, &window), Some(layout.header_len()));
    }

    #[test]
    fn test_find_frame_start_bounds_body_checks() {
        let layout = layout();
        let frame = encode_frame(&layout, b"target", Some(1)).unwrap();

        let below = with_decoy_headers(&layout, &frame, MAX_RESYNC_CANDIDATES - 1);
        assert_eq!(
            find_frame_start(&layout, &below),
            Some((MAX_RESYNC_CANDIDATES - 1) * layout.header_len())
        );

        let at_limit = with_decoy_headers(&layout, &frame, MAX_RESYNC_CANDIDATES);
        assert_eq!(find_frame_start(&layout, &at_limit), None);
    }

    #[test]
    fn test_scan_stats() {
        let layout = layout();
        let frame = encode_frame(&layout, b"test", Some(1)).unwrap();

        let (results, stats) = scan_stream_with_stats(&layout, &frame);

        assert_eq!(results.len(), 1);
        assert_eq!(stats.frames_found, 1);
        assert_eq!(stats.bytes_scanned, frame.len());
        assert!(stats.recovery_rate() > 99.0);
    }
}
