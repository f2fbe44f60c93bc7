//! COBS primitives
//!
//! Three flavours are used by the frame format:
//!
//! - plain COBS for the management block (length, checksum, address, CRC),
//! - COBS/R (reduced) for the payload region,
//! - a "tiny" in-place decoder for management fragments shorter than one
//!   COBS block, which also hands back the code that continues the chain
//!   into the next fragment.
//!
//! None of the encoders append the `0x00` delimiter.

use crate::constants::COBS_BLOCK_LEN;
use crate::error::FrameError;
use alloc::vec::Vec;

/// Encode `data` with plain COBS
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / COBS_BLOCK_LEN + 1);
    let mut start = 0;
    // A block that ended because it was full does not imply a zero
    let mut final_zero = true;

    for (idx, &byte) in data.iter().enumerate() {
        if byte == 0 {
            final_zero = true;
            out.push((idx - start + 1) as u8);
            out.extend_from_slice(&data[start..idx]);
            start = idx + 1;
        } else if idx - start == COBS_BLOCK_LEN - 1 {
            final_zero = false;
            out.push(0xFF);
            out.extend_from_slice(&data[start..=idx]);
            start = idx + 1;
        }
    }

    if start != data.len() || final_zero {
        out.push((data.len() - start + 1) as u8);
        out.extend_from_slice(&data[start..]);
    }

    out
}

/// Decode plain COBS
pub fn decode(encoded: &[u8]) -> Result<Vec<u8>, FrameError> {
    let mut out = Vec::with_capacity(encoded.len());
    let mut idx = 0;

    while idx < encoded.len() {
        let code = encoded[idx] as usize;
        if code == 0 {
            return Err(FrameError::InvalidEncoding);
        }
        idx += 1;
        let end = idx + code - 1;
        if end > encoded.len() {
            return Err(FrameError::InvalidEncoding);
        }
        let block = &encoded[idx..end];
        if block.contains(&0) {
            return Err(FrameError::InvalidEncoding);
        }
        out.extend_from_slice(block);
        idx = end;
        if idx < encoded.len() && code < 0xFF {
            out.push(0);
        }
    }

    Ok(out)
}

/// Encode `data` with COBS/R
///
/// Identical to plain COBS except for the last block: when the final data
/// byte is not smaller than the final code, that byte replaces the code and
/// is dropped from the block, saving one byte.
pub fn encode_reduced(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / COBS_BLOCK_LEN + 1);
    let mut start = 0;

    for (idx, &byte) in data.iter().enumerate() {
        if idx - start == COBS_BLOCK_LEN {
            out.push(0xFF);
            out.extend_from_slice(&data[start..idx]);
            start = idx;
        }
        if byte == 0 {
            out.push((idx - start + 1) as u8);
            out.extend_from_slice(&data[start..idx]);
            start = idx + 1;
        }
    }

    let final_byte = data.last().copied().unwrap_or(0);
    let code = data.len() - start + 1;
    if (final_byte as usize) < code {
        out.push(code as u8);
        out.extend_from_slice(&data[start..]);
    } else {
        out.push(final_byte);
        out.extend_from_slice(&data[start..data.len() - 1]);
    }

    out
}

/// Decode COBS/R
pub fn decode_reduced(encoded: &[u8]) -> Result<Vec<u8>, FrameError> {
    let mut out = Vec::with_capacity(encoded.len());
    let mut idx = 0;

    while idx < encoded.len() {
        let code = encoded[idx];
        if code == 0 {
            return Err(FrameError::InvalidEncoding);
        }
        idx += 1;
        let end = idx + code as usize - 1;
        let block = &encoded[idx..end.min(encoded.len())];
        if block.contains(&0) {
            return Err(FrameError::InvalidEncoding);
        }
        out.extend_from_slice(block);
        idx = end;

        if idx > encoded.len() {
            // Rolled-back final byte lives in the code itself
            out.push(code);
        } else if idx < encoded.len() && code < 0xFF {
            out.push(0);
        }
    }

    Ok(out)
}

/// Decode a fragment of a single-block COBS chain in place
///
/// `fragment` must not contain its own leading code; `code` is the code
/// pointing into it (1 = the first byte of `fragment` is the next code).
/// Fragments are shorter than a COBS block, so no stuffing codes occur.
///
/// Returns the code that continues the chain past the end of `fragment`,
/// i.e. the distance from the fragment end to the next zero position.
pub fn decode_tiny(fragment: &mut [u8], code: u8) -> Result<u8, FrameError> {
    let len = fragment.len();
    let mut code = code as usize;
    if code == 0 {
        return Err(FrameError::InvalidEncoding);
    }
    if code > len {
        return Ok((code - len) as u8);
    }

    let mut idx = code - 1;
    let mut last = idx;
    while idx < len {
        code = fragment[idx] as usize;
        if code == 0 {
            return Err(FrameError::InvalidEncoding);
        }
        fragment[idx] = 0;
        last = idx;
        idx += code;
    }

    Ok((code - (len - last - 1)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_encode_known_vectors() {
        assert_eq!(encode(&[]), vec![0x01]);
        assert_eq!(encode(&[0x00]), vec![0x01, 0x01]);
        assert_eq!(encode(&[0x00, 0x00]), vec![0x01, 0x01, 0x01]);
        assert_eq!(encode(&[0x11, 0x22, 0x00, 0x33]), vec![0x03, 0x11, 0x22, 0x02, 0x33]);
        assert_eq!(encode(&[0x11, 0x00, 0x00, 0x00]), vec![0x02, 0x11, 0x01, 0x01, 0x01]);
    }

    #[test]
    fn test_encode_full_block() {
        let data: Vec<u8> = (1..=254).collect();
        let encoded = encode(&data);
        assert_eq!(encoded.len(), 255);
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(decode(&encoded).unwrap(), data);

        let data: Vec<u8> = (0..255).map(|i| (i % 255 + 1) as u8).collect();
        let encoded = encode(&data);
        assert_eq!(encoded.len(), 257);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_reduced_rolls_back_final_byte() {
        // Final byte 0x6B >= code 3, so it replaces the code
        assert_eq!(encode_reduced(b"ok"), vec![0x6B, b'o']);
        assert_eq!(decode_reduced(&[0x6B, b'o']).unwrap(), b"ok".to_vec());

        // Final byte 0x02 < code 3, plain COBS block
        assert_eq!(encode_reduced(&[0x01, 0x02]), vec![0x03, 0x01, 0x02]);
        assert_eq!(decode_reduced(&[0x03, 0x01, 0x02]).unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn test_reduced_edge_cases() {
        assert_eq!(encode_reduced(&[]), vec![0x01]);
        assert_eq!(decode_reduced(&[0x01]).unwrap(), Vec::<u8>::new());
        assert_eq!(encode_reduced(&[0x00]), vec![0x01, 0x01]);
        assert_eq!(decode_reduced(&[0x01, 0x01]).unwrap(), vec![0x00]);
        assert_eq!(encode_reduced(&[0x05]), vec![0x05]);
        assert_eq!(decode_reduced(&[0x05]).unwrap(), vec![0x05]);
    }

    #[test]
    fn test_reduced_long_runs() {
        for len in [253usize, 254, 255, 300, 508, 509, 1000] {
            let ascending: Vec<u8> = (0..len).map(|i| (i % 255 + 1) as u8).collect();
            let encoded = encode_reduced(&ascending);
            assert!(!encoded.contains(&0));
            assert_eq!(decode_reduced(&encoded).unwrap(), ascending, "len {}", len);

            let ones = vec![0x01u8; len];
            let encoded = encode_reduced(&ones);
            assert!(!encoded.contains(&0));
            assert_eq!(decode_reduced(&encoded).unwrap(), ones, "len {}", len);
        }
    }

    #[test]
    fn test_decode_rejects_zero() {
        assert_eq!(decode_reduced(&[0x03, 0x00, 0x01]), Err(FrameError::InvalidEncoding));
        assert_eq!(decode_reduced(&[0x00]), Err(FrameError::InvalidEncoding));
        assert_eq!(decode(&[0x02, 0x00]), Err(FrameError::InvalidEncoding));
        assert_eq!(decode(&[0x05, 0x01]), Err(FrameError::InvalidEncoding));
    }

    #[test]
    fn test_tiny_matches_plain_decode() {
        // Management block [0x00, 0x05, 0x00, 0x07] -> 01 02 05 02 07
        let encoded = encode(&[0x00, 0x05, 0x00, 0x07]);
        assert_eq!(encoded, vec![0x01, 0x02, 0x05, 0x02, 0x07]);

        let mut fragment = encoded[1..].to_vec();
        let trailing = decode_tiny(&mut fragment, encoded[0]).unwrap();
        assert_eq!(fragment, vec![0x00, 0x05, 0x00, 0x07]);
        // Next zero is the implicit one right after the fragment
        assert_eq!(trailing, 1);
    }

    #[test]
    fn test_tiny_split_chain() {
        // Block [0x03, 0x00, 0xAA, 0x00, 0xBB] split after two bytes
        let encoded = encode(&[0x03, 0x00, 0xAA, 0x00, 0xBB]);
        assert_eq!(encoded, vec![0x02, 0x03, 0x02, 0xAA, 0x02, 0xBB]);

        let mut head = encoded[1..3].to_vec();
        let code = decode_tiny(&mut head, encoded[0]).unwrap();
        assert_eq!(head, vec![0x03, 0x00]);

        let mut tail = encoded[3..].to_vec();
        let code = decode_tiny(&mut tail, code).unwrap();
        assert_eq!(tail, vec![0xAA, 0x00, 0xBB]);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_tiny_code_beyond_fragment() {
        let mut fragment = [0x11, 0x22];
        assert_eq!(decode_tiny(&mut fragment, 5).unwrap(), 3);
        assert_eq!(fragment, [0x11, 0x22]);
    }

    #[test]
    fn test_tiny_rejects_zero_code() {
        let mut fragment = [0x11, 0x22];
        assert_eq!(decode_tiny(&mut fragment, 0), Err(FrameError::InvalidEncoding));

        let mut fragment = [0x00, 0x22];
        assert_eq!(decode_tiny(&mut fragment, 1), Err(FrameError::InvalidEncoding));
    }
}
