//! Core types for Packer frames

use crate::config::PackerConfig;
use crate::constants::{
    COBS_BLOCK_LEN, MAX_ADDRESS_LEN, MAX_CRC_SIZE, MAX_EXTRA_LEN_BYTES, MAX_MANAGEMENT_BUDGET,
};
use crate::crc::CrcAlgorithm;
use crate::error::PackerError;
use alloc::format;
use bytes::Bytes;

/// Wire dimensions derived from a validated [`PackerConfig`]
///
/// Frame layout on the wire:
///
/// ```text
/// | packed first byte | rest of length field | len checksum? | address? | COBS/R payload | CRC? | 0x00 |
/// ```
///
/// The first COBS code of the management block is packed into the high
/// `code_bits` bits of the first length byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    address_len: usize,
    len_field_len: usize,
    len_checksum: bool,
    crc: Option<CrcAlgorithm>,
    code_bits: u32,
    len_capacity: usize,
    max_payload: usize,
}

impl FrameLayout {
    /// Validate `config` and derive the frame dimensions
    pub fn new(config: &PackerConfig) -> Result<Self, PackerError> {
        if config.address_len > MAX_ADDRESS_LEN {
            return Err(PackerError::InvalidConfig(format!(
                "address_len {} out of range 0..={}",
                config.address_len, MAX_ADDRESS_LEN
            )));
        }

        if config.extra_len_bytes > MAX_EXTRA_LEN_BYTES {
            return Err(PackerError::InvalidConfig(format!(
                "extra_len_bytes {} out of range 0..={}",
                config.extra_len_bytes, MAX_EXTRA_LEN_BYTES
            )));
        }

        let crc_len = config.crc.map_or(0, |crc| crc.digest_size());
        if crc_len > MAX_CRC_SIZE {
            return Err(PackerError::InvalidConfig(format!(
                "CRC digest size {} exceeds {}",
                crc_len, MAX_CRC_SIZE
            )));
        }

        let address_len = config.address_len as usize;
        let extra_len = config.extra_len_bytes as usize;
        let checksum_len = usize::from(config.len_checksum);

        let budget = crc_len + address_len + extra_len + checksum_len;
        if budget > MAX_MANAGEMENT_BUDGET {
            return Err(PackerError::InvalidConfig(format!(
                "{} overhead and CRC bytes exceed the limit of {}",
                budget, MAX_MANAGEMENT_BUDGET
            )));
        }

        match (config.src_address, address_len) {
            (None, len) if len > 0 => {
                return Err(PackerError::InvalidConfig(
                    "address field defined but no source address".into(),
                ));
            }
            (Some(_), 0) => {
                return Err(PackerError::InvalidConfig(
                    "source address defined but no address field".into(),
                ));
            }
            _ => {}
        }

        if address_len > 0 {
            for address in [config.src_address, config.default_dst_address]
                .into_iter()
                .flatten()
            {
                if !address_fits(address, address_len) {
                    return Err(PackerError::AddressOutOfRange {
                        address,
                        len: config.address_len,
                    });
                }
            }
        }

        // One extra COBS code precedes the management bytes and one zero
        // terminates them, hence the two mandatory counts
        let management_count = (extra_len + 1 + address_len + 1 + checksum_len + crc_len) as u32;
        let code_bits = u32::BITS - management_count.leading_zeros();

        let len_bits = 8 * (extra_len as u32 + 1) - code_bits;
        let len_capacity = (1u64 << len_bits) - 1;

        // Leave room for COBS stuffing codes once blocks can overflow
        let max_payload = if len_capacity > COBS_BLOCK_LEN as u64 {
            len_capacity * COBS_BLOCK_LEN as u64 / (COBS_BLOCK_LEN as u64 + 1)
        } else {
            len_capacity
        };

        Ok(Self {
            address_len,
            len_field_len: extra_len + 1,
            len_checksum: config.len_checksum,
            crc: config.crc,
            code_bits,
            len_capacity: len_capacity as usize,
            max_payload: max_payload as usize,
        })
    }

    /// Address field width in bytes
    pub fn address_len(&self) -> usize {
        self.address_len
    }

    /// Length field width in bytes
    pub fn len_field_len(&self) -> usize {
        self.len_field_len
    }

    /// Whether the length field checksum byte is present
    pub fn has_len_checksum(&self) -> bool {
        self.len_checksum
    }

    /// CRC algorithm, if any
    pub fn crc(&self) -> Option<CrcAlgorithm> {
        self.crc
    }

    /// CRC digest size in bytes (0 without CRC)
    pub fn crc_len(&self) -> usize {
        self.crc.map_or(0, |crc| crc.digest_size())
    }

    /// Number of high bits of the first byte that carry the first COBS code
    pub fn code_bits(&self) -> u32 {
        self.code_bits
    }

    /// Header bytes preceding the payload: length field, checksum and address
    pub fn header_len(&self) -> usize {
        self.len_field_len + usize::from(self.len_checksum) + self.address_len
    }

    /// Largest encoded payload the length field can express
    pub fn len_capacity(&self) -> usize {
        self.len_capacity
    }

    /// Maximum payload length accepted by the encoder
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Total frame size for an encoded payload of `encoded_len` bytes, delimiter included
    pub fn frame_len(&self, encoded_len: usize) -> usize {
        self.header_len() + encoded_len + self.crc_len() + 1
    }

    /// Largest frame this layout can produce
    pub fn max_frame_len(&self) -> usize {
        self.frame_len(self.len_capacity)
    }

    /// Big-endian address field for `address`
    pub(crate) fn address_field<'a>(&self, address: &'a [u8; 4]) -> &'a [u8] {
        &address[4 - self.address_len..]
    }
}

/// Whether `address` is representable in `len` big-endian bytes
pub(crate) fn address_fits(address: u32, len: usize) -> bool {
    len >= 4 || address < (1u32 << (8 * len))
}

/// Management fields recovered from the first `header_len()` bytes of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Length of the COBS/R encoded payload region
    pub encoded_len: usize,

    /// Length field checksum carried by the frame, if enabled
    pub len_checksum: Option<u8>,

    /// Destination address carried by the frame, if addressing is enabled
    pub address: Option<u32>,

    /// COBS code continuing the management chain into the CRC trailer
    pub trailing_code: u8,
}

/// A frame decoded by [`decode_frame`](crate::decoder::decode_frame)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Destination address carried by the frame, if addressing is enabled
    pub address: Option<u32>,

    /// Decoded payload
    pub payload: Bytes,

    /// Bytes occupied on the wire, delimiter included
    pub size: usize,
}
