//! Error types for Packer operations

use alloc::string::String;
use bytes::Bytes;

/// Errors raised while configuring a [`Packer`](crate::Packer) or packing a frame
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackerError {
    /// Configuration violates a range or budget limit
    #[cfg_attr(feature = "std", error("Invalid configuration: {0}"))]
    InvalidConfig(String),

    /// Payload does not fit into a single frame
    #[cfg_attr(feature = "std", error("Payload length {len} exceeds maximum {max}"))]
    PayloadOverlength {
        /// Length of the rejected payload.
        len: usize,
        /// Maximum payload length of the configuration.
        max: usize,
    },

    /// Addressing is enabled but neither an explicit nor a default destination is set
    #[cfg_attr(feature = "std", error("No destination address given and no default destination configured"))]
    NoDestinationAddress,

    /// Address value does not fit into the address field
    #[cfg_attr(feature = "std", error("Address {address:#x} does not fit into {len} address byte(s)"))]
    AddressOutOfRange {
        /// The offending address.
        address: u32,
        /// Width of the address field in bytes.
        len: u8,
    },
}

/// Reasons a single frame fails strict decoding
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Not enough bytes for the header or the full frame
    #[cfg_attr(feature = "std", error("Incomplete frame: expected {expected} bytes, got {actual}"))]
    IncompleteFrame {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually available.
        actual: usize,
    },

    /// Header holds a delimiter byte or an impossible COBS code
    #[cfg_attr(feature = "std", error("Corrupt frame header"))]
    CorruptHeader,

    /// Length field checksum does not match the length field
    #[cfg_attr(feature = "std", error("Length checksum mismatch: expected {expected:#04x}, got {actual:#04x}"))]
    LengthChecksumMismatch {
        /// Checksum recomputed from the length field.
        expected: u8,
        /// Checksum carried by the frame.
        actual: u8,
    },

    /// Delimiter missing at the offset announced by the length field
    #[cfg_attr(feature = "std", error("Missing frame delimiter at offset {0}"))]
    MissingDelimiter(usize),

    /// CRC over address and encoded payload does not match
    #[cfg_attr(feature = "std", error("CRC mismatch: computed {computed:#x}, received {received:#x}"))]
    ChecksumMismatch {
        /// CRC computed over the received address and payload.
        computed: u64,
        /// CRC carried by the frame.
        received: u64,
    },

    /// Payload or CRC region is not valid COBS
    #[cfg_attr(feature = "std", error("Invalid COBS encoding"))]
    InvalidEncoding,
}

/// Protocol events yielded in-band by [`Packer::unpack`](crate::Packer::unpack)
///
/// None of these are fatal: the decoder stays usable and keeps consuming bytes.
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnpackError {
    /// Structural corruption; the decoder is hunting for the next delimiter
    #[cfg_attr(feature = "std", error("Out of synchronization"))]
    OutOfSync,

    /// A complete frame arrived but its CRC did not match; the frame was dropped
    #[cfg_attr(feature = "std", error("CRC mismatch: computed {computed:#x}, received {received:#x}"))]
    CrcMismatch {
        /// CRC computed over the received address and payload.
        computed: u64,
        /// CRC carried by the frame.
        received: u64,
        /// Encoded CRC bytes as they appeared on the wire.
        trailer: Bytes,
    },

    /// A valid frame addressed to another node was skipped
    #[cfg_attr(feature = "std", error("Frame addressed to {dst:#x}, this node is {src:#x}"))]
    OtherRecipient {
        /// Destination address carried by the frame.
        dst: u32,
        /// Address of this node.
        src: u32,
    },

    /// A partial frame was not completed within the timeout period; the buffer was flushed
    #[cfg_attr(feature = "std", error("Timeout while waiting for the rest of a frame"))]
    Timeout,
}
