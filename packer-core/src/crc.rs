//! Integrity checks: CRC descriptors and the length field checksum

use crc::{
    Crc, CRC_16_IBM_3740, CRC_16_XMODEM, CRC_32_ISO_HDLC, CRC_32_MPEG_2, CRC_64_XZ, CRC_8_SMBUS,
};
use serde::{Deserialize, Serialize};

static CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
static CRC16_CCITT_FALSE: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);
static CRC16_XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);
static CRC32_MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);
static CRC32_ISO_HDLC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);
static CRC64_XZ: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// CRC used to protect the address field and the encoded payload
///
/// Digests go on the wire big-endian, `digest_size()` bytes wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrcAlgorithm {
    /// CRC-8 (poly 0x07, init 0x00)
    Crc8,
    /// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF)
    Crc16CcittFalse,
    /// CRC-16/XMODEM (poly 0x1021, init 0x0000)
    Crc16Xmodem,
    /// CRC-32/MPEG-2 (poly 0x04C11DB7, init 0xFFFFFFFF, no reflection, no xor-out)
    Crc32Mpeg2,
    /// CRC-32/ISO-HDLC, the common zlib/Ethernet CRC-32
    Crc32IsoHdlc,
    /// CRC-32C (Castagnoli)
    Crc32c,
    /// CRC-64/XZ
    Crc64Xz,
}

impl CrcAlgorithm {
    /// Returns the digest size in bytes
    pub const fn digest_size(&self) -> usize {
        match self {
            CrcAlgorithm::Crc8 => 1,
            CrcAlgorithm::Crc16CcittFalse | CrcAlgorithm::Crc16Xmodem => 2,
            CrcAlgorithm::Crc32Mpeg2 | CrcAlgorithm::Crc32IsoHdlc | CrcAlgorithm::Crc32c => 4,
            CrcAlgorithm::Crc64Xz => 8,
        }
    }

    /// Compute the CRC over the concatenation of `parts`
    pub fn checksum(&self, parts: &[&[u8]]) -> u64 {
        match self {
            CrcAlgorithm::Crc8 => {
                let mut digest = CRC8.digest();
                parts.iter().for_each(|part| digest.update(part));
                digest.finalize() as u64
            }
            CrcAlgorithm::Crc16CcittFalse => {
                let mut digest = CRC16_CCITT_FALSE.digest();
                parts.iter().for_each(|part| digest.update(part));
                digest.finalize() as u64
            }
            CrcAlgorithm::Crc16Xmodem => {
                let mut digest = CRC16_XMODEM.digest();
                parts.iter().for_each(|part| digest.update(part));
                digest.finalize() as u64
            }
            CrcAlgorithm::Crc32Mpeg2 => {
                let mut digest = CRC32_MPEG2.digest();
                parts.iter().for_each(|part| digest.update(part));
                digest.finalize() as u64
            }
            CrcAlgorithm::Crc32IsoHdlc => {
                let mut digest = CRC32_ISO_HDLC.digest();
                parts.iter().for_each(|part| digest.update(part));
                digest.finalize() as u64
            }
            CrcAlgorithm::Crc32c => parts
                .iter()
                .fold(0u32, |crc, part| crc32c::crc32c_append(crc, part)) as u64,
            CrcAlgorithm::Crc64Xz => {
                let mut digest = CRC64_XZ.digest();
                parts.iter().for_each(|part| digest.update(part));
                digest.finalize()
            }
        }
    }
}

/// 8-bit one's complement checksum over the length field
///
/// Bytes are summed with end-around carry, then inverted.
pub fn length_checksum(field: &[u8]) -> u8 {
    let sum = field.iter().fold(0u16, |sum, &byte| {
        let carry = sum + byte as u16;
        (carry & 0xFF) + (carry >> 8)
    });
    !(sum as u8)
}
