//! Frame encoding

use crate::cobs;
use crate::constants::{DELIMITER, MAX_MANAGEMENT_LEN};
use crate::crc::length_checksum;
use crate::error::PackerError;
use crate::types::{address_fits, FrameLayout};
use bytes::{BufMut, Bytes, BytesMut};

#[cfg(feature = "logging")]
use tracing::{debug, error};

/// Encode `payload` into one delimited frame
///
/// The frame is built as follows:
/// 1. The payload is COBS/R encoded.
/// 2. The management block `length ∥ length checksum? ∥ address? ∥ CRC?` is
///    plain COBS encoded; it is shorter than one COBS block, so the result
///    is exactly one byte longer.
/// 3. The first management COBS code is packed into the high bits of the
///    first length byte.
/// 4. Header bytes, encoded payload, encoded CRC bytes and the `0x00`
///    delimiter are concatenated.
///
/// The CRC covers the address field and the encoded payload. `dst` is
/// required when the layout carries an address field and ignored otherwise.
pub fn encode_frame(
    layout: &FrameLayout,
    payload: &[u8],
    dst: Option<u32>,
) -> Result<Bytes, PackerError> {
    let dst = if layout.address_len() > 0 {
        match dst {
            Some(dst) => Some(dst),
            None => {
                #[cfg(feature = "logging")]
                error!("Refusing to pack: no destination address");
                return Err(PackerError::NoDestinationAddress);
            }
        }
    } else {
        None
    };

    if payload.len() > layout.max_payload() {
        #[cfg(feature = "logging")]
        error!(
            "Refusing to pack: payload length {} exceeds maximum {}",
            payload.len(),
            layout.max_payload()
        );
        return Err(PackerError::PayloadOverlength {
            len: payload.len(),
            max: layout.max_payload(),
        });
    }

    if let Some(dst) = dst {
        if !address_fits(dst, layout.address_len()) {
            return Err(PackerError::AddressOutOfRange {
                address: dst,
                len: layout.address_len() as u8,
            });
        }
    }

    let encoded = cobs::encode_reduced(payload);

    // Stuffing may push a payload at the very limit past the length field
    if encoded.len() > layout.len_capacity() {
        #[cfg(feature = "logging")]
        error!(
            "Refusing to pack: encoded payload length {} exceeds length field capacity {}",
            encoded.len(),
            layout.len_capacity()
        );
        return Err(PackerError::PayloadOverlength {
            len: payload.len(),
            max: layout.max_payload(),
        });
    }

    let address = dst.unwrap_or(0).to_be_bytes();
    let address_field = layout.address_field(&address);

    let len_bytes = (encoded.len() as u32).to_be_bytes();
    let len_field = &len_bytes[4 - layout.len_field_len()..];

    let mut management = [0u8; MAX_MANAGEMENT_LEN];
    let mut management_len = 0;
    let mut push = |bytes: &[u8]| {
        management[management_len..management_len + bytes.len()].copy_from_slice(bytes);
        management_len += bytes.len();
    };

    push(len_field);
    if layout.has_len_checksum() {
        push(&[length_checksum(len_field)]);
    }
    push(address_field);
    if let Some(crc) = layout.crc() {
        let digest = crc.checksum(&[address_field, &encoded]).to_be_bytes();
        push(&digest[8 - crc.digest_size()..]);
    }

    let management = cobs::encode(&management[..management_len]);
    let header_len = layout.header_len();

    let mut buf = BytesMut::with_capacity(layout.frame_len(encoded.len()));

    // Packed first byte: first COBS code in the high bits
    buf.put_u8((management[0] << (8 - layout.code_bits())) | management[1]);
    buf.put_slice(&management[2..=header_len]);
    buf.put_slice(&encoded);
    buf.put_slice(&management[header_len + 1..]);
    buf.put_u8(DELIMITER);

    #[cfg(feature = "logging")]
    debug!(
        "Frame packed - payload length: {} bytes - frame length: {} bytes",
        payload.len(),
        buf.len()
    );

    Ok(buf.freeze())
}
