//! Constants and limits for the Packer frame format

/// End-of-frame delimiter; never appears inside an encoded frame
pub const DELIMITER: u8 = 0x00;

/// Maximum number of address field bytes
pub const MAX_ADDRESS_LEN: u8 = 4;

/// Maximum number of length field bytes beyond the mandatory first one
pub const MAX_EXTRA_LEN_BYTES: u8 = 3;

/// Maximum CRC digest size in bytes
pub const MAX_CRC_SIZE: usize = 8;

/// Upper bound for CRC + address + extra length + length checksum bytes
///
/// Keeps the first COBS code of the management block within 4 bits.
pub const MAX_MANAGEMENT_BUDGET: usize = 13;

/// Largest possible management block: mandatory length byte plus the budget
pub const MAX_MANAGEMENT_LEN: usize = MAX_MANAGEMENT_BUDGET + 1;

/// Largest payload region a single COBS block covers without a stuffing code
pub const COBS_BLOCK_LEN: usize = 254;

/// Body verifications attempted per delimiter window while resynchronizing
///
/// Only candidates whose header announces a frame ending exactly at the
/// window's delimiter count towards the limit.
pub const MAX_RESYNC_CANDIDATES: usize = 16;
