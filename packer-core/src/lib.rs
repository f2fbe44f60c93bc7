//! # Packer Core
//!
//! A self-delimiting binary framing codec for byte streams, built on
//! Consistent Overhead Byte Stuffing (COBS).
//!
//! Every frame ends with the only `0x00` it contains. Frames carry an
//! optional destination address, an optional length field checksum and an
//! optional CRC, and the receiver resynchronizes on the next delimiter after
//! any corruption.
//!
//! ## Modules
//!
//! - `config`: Codec options (serde)
//! - `types`: Frame layout and decoded frame types
//! - `cobs`: COBS, COBS/R and header micro-decoding
//! - `crc`: CRC algorithms and the length field checksum
//! - `encoder`: Frame encoding
//! - `decoder`: Strict single-frame decoding
//! - `packer`: Buffering stream decoder with resynchronization and timeout
//! - `scanner`: Offline recovery of frames from captured streams
//! - `clock`: Time sources for the timeout
//!
//! ## Example
//!
//! ```
//! use packer_core::{Packer, PackerConfig};
//!
//! let config = PackerConfig::default().with_address(1, 7).with_default_dst(7);
//! let mut packer = Packer::new(config).unwrap();
//!
//! let frame = packer.pack(b"hello").unwrap();
//! let items: Vec<_> = packer.unpack(&frame).collect();
//! assert_eq!(items, vec![Ok(bytes::Bytes::from_static(b"hello"))]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod clock;
pub mod cobs;
pub mod config;
pub mod constants;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod packer;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock};
#[cfg(feature = "std")]
pub use clock::MonotonicClock;
pub use config::PackerConfig;
pub use crc::CrcAlgorithm;
pub use error::{FrameError, PackerError, UnpackError};
pub use packer::{Packer, Unpack, UnpackItem};
pub use types::{DecodedFrame, FrameHeader, FrameLayout};

/// Result type alias for Packer operations
pub type Result<T> = core::result::Result<T, PackerError>;
