//! Frame decoding (strict mode)
//!
//! These functions look at a single frame starting at offset 0 of a slice.
//! The streaming state machine in [`packer`](crate::packer) and the
//! [`scanner`](crate::scanner) are built on top of them.

use crate::cobs;
use crate::constants::{DELIMITER, MAX_CRC_SIZE, MAX_MANAGEMENT_LEN};
use crate::crc::length_checksum;
use crate::error::FrameError;
use crate::types::{DecodedFrame, FrameHeader, FrameLayout};
use bytes::Bytes;

/// Decode the management fields in the first `layout.header_len()` bytes
///
/// The high `code_bits` bits of the first byte hold the first COBS code;
/// the remaining bits hold the first encoded length byte. The header is
/// rejected if it contains a delimiter or an impossible COBS code.
pub fn decode_header(layout: &FrameLayout, data: &[u8]) -> Result<FrameHeader, FrameError> {
    let header_len = layout.header_len();
    if data.len() < header_len {
        return Err(FrameError::IncompleteFrame {
            expected: header_len,
            actual: data.len(),
        });
    }

    let header = &data[..header_len];
    if header.contains(&DELIMITER) {
        return Err(FrameError::CorruptHeader);
    }

    let low_bits = 8 - layout.code_bits();
    let first_code = header[0] >> low_bits;

    let mut block = [0u8; MAX_MANAGEMENT_LEN];
    let block = &mut block[..header_len];
    block[0] = header[0] & (0xFF >> layout.code_bits());
    block[1..].copy_from_slice(&header[1..]);

    let trailing_code =
        cobs::decode_tiny(block, first_code).map_err(|_| FrameError::CorruptHeader)?;

    let (len_field, rest) = block.split_at(layout.len_field_len());
    let encoded_len = be_value(len_field) as usize;

    let (len_checksum, rest) = if layout.has_len_checksum() {
        (Some(rest[0]), &rest[1..])
    } else {
        (None, rest)
    };

    let address = if layout.address_len() > 0 {
        Some(be_value(&rest[..layout.address_len()]) as u32)
    } else {
        None
    };

    Ok(FrameHeader {
        encoded_len,
        len_checksum,
        address,
        trailing_code,
    })
}

/// Check the length field checksum carried by `header`, if any
pub fn verify_len_checksum(layout: &FrameLayout, header: &FrameHeader) -> Result<(), FrameError> {
    let Some(actual) = header.len_checksum else {
        return Ok(());
    };

    let len_bytes = (header.encoded_len as u32).to_be_bytes();
    let expected = length_checksum(&len_bytes[4 - layout.len_field_len()..]);
    if expected != actual {
        return Err(FrameError::LengthChecksumMismatch { expected, actual });
    }

    Ok(())
}

/// Verify the CRC and decode the payload of a delimited frame
///
/// `frame` holds exactly `layout.frame_len(header.encoded_len)` bytes.
pub fn verify_body(
    layout: &FrameLayout,
    header: &FrameHeader,
    frame: &[u8],
) -> Result<Bytes, FrameError> {
    let payload_start = layout.header_len();
    let payload_end = payload_start + header.encoded_len;
    let encoded = &frame[payload_start..payload_end];

    if let Some(crc) = layout.crc() {
        let crc_len = crc.digest_size();
        let mut trailer = [0u8; MAX_CRC_SIZE];
        let trailer = &mut trailer[..crc_len];
        trailer.copy_from_slice(&frame[payload_end..payload_end + crc_len]);
        cobs::decode_tiny(trailer, header.trailing_code)?;
        let received = be_value(trailer);

        let address = header.address.unwrap_or(0).to_be_bytes();
        let computed = crc.checksum(&[layout.address_field(&address), encoded]);

        if computed != received {
            return Err(FrameError::ChecksumMismatch { computed, received });
        }
    }

    let payload = cobs::decode_reduced(encoded)?;
    Ok(Bytes::from(payload))
}

/// Decode the frame starting at offset 0 of `data`
///
/// Bytes after the frame's delimiter are ignored. No address filtering is
/// applied; the carried address is returned alongside the payload.
pub fn decode_frame(layout: &FrameLayout, data: &[u8]) -> Result<DecodedFrame, FrameError> {
    let header = decode_header(layout, data)?;
    verify_len_checksum(layout, &header)?;

    let size = layout.frame_len(header.encoded_len);
    if data.len() < size {
        return Err(FrameError::IncompleteFrame {
            expected: size,
            actual: data.len(),
        });
    }
    if data[size - 1] != DELIMITER {
        return Err(FrameError::MissingDelimiter(size - 1));
    }

    let payload = verify_body(layout, &header, &data[..size])?;

    Ok(DecodedFrame {
        address: header.address,
        payload,
        size,
    })
}

/// Big-endian integer from up to 8 bytes
fn be_value(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}
