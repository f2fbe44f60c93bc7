//! Codec configuration

use crate::crc::CrcAlgorithm;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Options shared by the encoder and the stream decoder
///
/// The struct is plain data; [`FrameLayout::new`](crate::types::FrameLayout::new)
/// validates it and derives the wire dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackerConfig {
    /// Address of this node; frames carrying another address are skipped
    pub src_address: Option<u32>,

    /// Destination used by [`Packer::pack`](crate::Packer::pack)
    pub default_dst_address: Option<u32>,

    /// CRC over address field and encoded payload; `None` disables it
    pub crc: Option<CrcAlgorithm>,

    /// Address field width in bytes (0..=4); 0 disables addressing
    pub address_len: u8,

    /// Length field bytes beyond the mandatory first one (0..=3)
    pub extra_len_bytes: u8,

    /// Append a one's complement checksum byte for the length field
    pub len_checksum: bool,

    /// Yield [`UnpackError::CrcMismatch`](crate::UnpackError::CrcMismatch) events
    pub yield_crc_error: bool,

    /// Yield [`UnpackError::OutOfSync`](crate::UnpackError::OutOfSync) events
    pub yield_out_of_sync: bool,

    /// Yield [`UnpackError::OtherRecipient`](crate::UnpackError::OtherRecipient) events
    pub yield_other_recipient: bool,

    /// Yield [`UnpackError::Timeout`](crate::UnpackError::Timeout) events
    pub yield_timeout: bool,

    /// Maximum silence between chunks while a frame is incomplete; zero disables
    pub timeout_period: Duration,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            src_address: None,
            default_dst_address: None,
            crc: Some(CrcAlgorithm::Crc32Mpeg2),
            address_len: 0,
            extra_len_bytes: 1,
            len_checksum: false,
            yield_crc_error: false,
            yield_out_of_sync: false,
            yield_other_recipient: false,
            yield_timeout: false,
            timeout_period: Duration::ZERO,
        }
    }
}

impl PackerConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest frame: one length byte, no CRC, no addressing, no checksum
    pub fn minimal() -> Self {
        Self {
            crc: None,
            extra_len_bytes: 0,
            ..Self::default()
        }
    }

    /// Enable addressing with `len` address bytes and this node's address
    pub fn with_address(mut self, len: u8, src: u32) -> Self {
        self.address_len = len;
        self.src_address = Some(src);
        self
    }

    /// Set the default destination address
    pub fn with_default_dst(mut self, dst: u32) -> Self {
        self.default_dst_address = Some(dst);
        self
    }

    /// Select the CRC algorithm, or disable CRC with `None`
    pub fn with_crc(mut self, crc: Option<CrcAlgorithm>) -> Self {
        self.crc = crc;
        self
    }

    /// Set the number of extra length field bytes
    pub fn with_extra_len_bytes(mut self, extra: u8) -> Self {
        self.extra_len_bytes = extra;
        self
    }

    /// Enable or disable the length field checksum
    pub fn with_len_checksum(mut self, enabled: bool) -> Self {
        self.len_checksum = enabled;
        self
    }

    /// Set the inter-chunk timeout
    pub fn with_timeout(mut self, period: Duration) -> Self {
        self.timeout_period = period;
        self
    }

    /// Yield every protocol event instead of only logging it
    pub fn yield_all_events(mut self) -> Self {
        self.yield_crc_error = true;
        self.yield_out_of_sync = true;
        self.yield_other_recipient = true;
        self.yield_timeout = true;
        self
    }
}
