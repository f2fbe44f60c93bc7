//! Streaming packer
//!
//! [`Packer`] bundles the encoder with a buffering receive state machine.
//! Bytes arrive in arbitrary chunks through [`Packer::unpack`] (or the
//! [`ingest`](Packer::ingest) / [`poll_item`](Packer::poll_item) pair) and
//! come out as decoded payloads interleaved with protocol events.
//!
//! The receiver is in one of two states:
//!
//! - **synced**: the buffer starts at a candidate frame. Its header is
//!   decoded as soon as it is complete, then the decoder waits for the
//!   delimiter announced by the length field.
//! - **out of sync**: a candidate was rejected. The decoder hunts for the
//!   next `0x00`, recovering a valid frame that ends there if one exists.
//!
//! An optional inter-chunk timeout flushes a partial frame when the line
//! goes quiet for longer than the configured period.

use crate::clock::Clock;
use crate::config::PackerConfig;
use crate::constants::DELIMITER;
use crate::decoder::{decode_header, verify_body, verify_len_checksum};
use crate::encoder::encode_frame;
use crate::error::{FrameError, PackerError, UnpackError};
use crate::scanner::find_frame_start;
use crate::types::{FrameHeader, FrameLayout};
use alloc::boxed::Box;
use bytes::{Buf, Bytes, BytesMut};
use core::fmt;
use core::time::Duration;
use memchr::memchr;

#[cfg(feature = "logging")]
use tracing::{debug, info, warn};

/// Item yielded by the stream decoder
pub type UnpackItem = Result<Bytes, UnpackError>;

/// Frame encoder and resynchronizing stream decoder for one peer
///
/// The encoder side is pure; the decoder side owns the receive buffer, the
/// synchronization flag and the timeout timer. A `Packer` is not meant to
/// be shared between concurrent readers.
pub struct Packer {
    config: PackerConfig,
    layout: FrameLayout,
    buffer: BytesMut,
    out_of_sync: bool,
    timer_stamp: Option<Duration>,
    /// Set when a chunk was appended since the timer was last armed
    fresh: bool,
    /// A timeout flushed the buffer and the event has not been polled yet
    timed_out: bool,
    clock: Box<dyn Clock + Send>,
}

impl Packer {
    /// Create a packer that measures timeouts with [`MonotonicClock`](crate::MonotonicClock)
    #[cfg(feature = "std")]
    pub fn new(config: PackerConfig) -> Result<Self, PackerError> {
        Self::with_clock(config, crate::clock::MonotonicClock::new())
    }

    /// Create a packer driven by a caller-supplied clock
    pub fn with_clock<C>(config: PackerConfig, clock: C) -> Result<Self, PackerError>
    where
        C: Clock + Send + 'static,
    {
        let layout = FrameLayout::new(&config)?;

        #[cfg(feature = "logging")]
        debug!(
            "Packer ready - header: {} bytes - max payload: {} bytes - CRC: {:?}",
            layout.header_len(),
            layout.max_payload(),
            layout.crc()
        );

        Ok(Self {
            config,
            layout,
            buffer: BytesMut::new(),
            out_of_sync: false,
            timer_stamp: None,
            fresh: false,
            timed_out: false,
            clock: Box::new(clock),
        })
    }

    /// Pack `payload` for the configured default destination
    pub fn pack(&self, payload: &[u8]) -> Result<Bytes, PackerError> {
        encode_frame(&self.layout, payload, self.config.default_dst_address)
    }

    /// Pack `payload` for `dst`
    ///
    /// `dst` is ignored when addressing is disabled.
    pub fn pack_to(&self, payload: &[u8], dst: u32) -> Result<Bytes, PackerError> {
        encode_frame(&self.layout, payload, Some(dst))
    }

    /// Feed `chunk` and iterate over everything that became decodable
    ///
    /// Pass an empty chunk to drain remaining items or to let a pending
    /// timeout fire. Items not consumed from the iterator stay queued in the
    /// buffer and come out of the next call.
    pub fn unpack(&mut self, chunk: &[u8]) -> Unpack<'_> {
        self.ingest(chunk);
        Unpack { packer: self }
    }

    /// Append `chunk` to the receive buffer
    ///
    /// The timeout is evaluated first, so a chunk arriving after a long
    /// silence starts from an empty buffer.
    pub fn ingest(&mut self, chunk: &[u8]) {
        if let Some(stamp) = self.timer_stamp {
            let silence = self.clock.now().saturating_sub(stamp);
            if silence > self.config.timeout_period {
                #[cfg(feature = "logging")]
                warn!(
                    "Timeout after {:?}: discarding {} buffered bytes",
                    silence,
                    self.buffer.len()
                );
                self.buffer.clear();
                self.out_of_sync = false;
                self.timer_stamp = None;
                self.timed_out = true;
            }
        }

        if !chunk.is_empty() {
            self.buffer.extend_from_slice(chunk);
            self.fresh = true;
        }
    }

    /// Decode the next item from the buffered bytes
    ///
    /// Returns `None` once the buffer holds no complete frame; call again
    /// after the next [`ingest`](Self::ingest).
    pub fn poll_item(&mut self) -> Option<UnpackItem> {
        if core::mem::take(&mut self.timed_out) && self.config.yield_timeout {
            return Some(Err(UnpackError::Timeout));
        }

        loop {
            if self.out_of_sync && !self.resync() {
                self.arm_timer();
                return None;
            }

            if self.buffer.is_empty() {
                self.timer_stamp = None;
                return None;
            }

            let header_len = self.layout.header_len();
            let visible = header_len.min(self.buffer.len());
            if memchr(DELIMITER, &self.buffer[..visible]).is_some() {
                match self.desync() {
                    Some(event) => return Some(event),
                    None => continue,
                }
            }

            if self.buffer.len() < header_len {
                self.arm_timer();
                return None;
            }

            let header = match self.read_header() {
                Ok(header) => header,
                Err(_err) => {
                    #[cfg(feature = "logging")]
                    debug!("Rejecting frame header: {:?}", _err);
                    match self.desync() {
                        Some(event) => return Some(event),
                        None => continue,
                    }
                }
            };

            let frame_len = self.layout.frame_len(header.encoded_len);
            if self.buffer.len() < frame_len {
                self.arm_timer();
                return None;
            }

            if self.buffer[frame_len - 1] != DELIMITER {
                match self.desync() {
                    Some(event) => return Some(event),
                    None => continue,
                }
            }

            let frame = self.buffer.split_to(frame_len).freeze();
            if let Some(event) = self.finish_frame(&header, frame) {
                return Some(event);
            }
        }
    }

    /// Configuration this packer was built from
    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Wire dimensions derived from the configuration
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Maximum payload length accepted by [`pack`](Self::pack)
    pub fn max_payload(&self) -> usize {
        self.layout.max_payload()
    }

    /// Number of bytes waiting in the receive buffer
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the decoder is hunting for a delimiter
    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Drop all receive state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.out_of_sync = false;
        self.timer_stamp = None;
        self.fresh = false;
        self.timed_out = false;
    }

    fn read_header(&self) -> Result<FrameHeader, FrameError> {
        let header = decode_header(&self.layout, &self.buffer)?;
        verify_len_checksum(&self.layout, &header)?;
        Ok(header)
    }

    /// Address filter, CRC and payload decode of a complete frame
    fn finish_frame(&mut self, header: &FrameHeader, frame: Bytes) -> Option<UnpackItem> {
        if let (Some(dst), Some(src)) = (header.address, self.config.src_address) {
            if dst != src {
                #[cfg(feature = "logging")]
                info!("Skipping frame for {:#x} (this node is {:#x})", dst, src);
                return self
                    .config
                    .yield_other_recipient
                    .then_some(Err(UnpackError::OtherRecipient { dst, src }));
            }
        }

        match verify_body(&self.layout, header, &frame) {
            Ok(payload) => {
                #[cfg(feature = "logging")]
                debug!(
                    "Frame unpacked - payload length: {} bytes - frame length: {} bytes",
                    payload.len(),
                    frame.len()
                );
                Some(Ok(payload))
            }
            Err(FrameError::ChecksumMismatch { computed, received }) => {
                #[cfg(feature = "logging")]
                info!(
                    "CRC mismatch: computed {:#x}, received {:#x}",
                    computed, received
                );
                let crc_end = frame.len() - 1;
                let trailer = frame.slice(crc_end - self.layout.crc_len()..crc_end);
                self.config.yield_crc_error.then_some(Err(UnpackError::CrcMismatch {
                    computed,
                    received,
                    trailer,
                }))
            }
            Err(_err) => {
                #[cfg(feature = "logging")]
                warn!("Dropping undecodable frame: {:?}", _err);
                self.config
                    .yield_out_of_sync
                    .then_some(Err(UnpackError::OutOfSync))
            }
        }
    }

    /// Reject the candidate at the head of the buffer
    fn desync(&mut self) -> Option<UnpackItem> {
        self.buffer.advance(1);
        self.out_of_sync = true;

        #[cfg(feature = "logging")]
        warn!("Out of sync, hunting for the next delimiter");

        self.config
            .yield_out_of_sync
            .then_some(Err(UnpackError::OutOfSync))
    }

    /// Skip to the next frame boundary; `false` if none is buffered yet
    fn resync(&mut self) -> bool {
        let Some(end) = memchr(DELIMITER, &self.buffer) else {
            // Keep enough of the tail to hold the start of the longest frame
            let keep = self.layout.max_frame_len() - 1;
            if self.buffer.len() > keep {
                let excess = self.buffer.len() - keep;
                self.buffer.advance(excess);
            }
            return false;
        };

        let skip = match find_frame_start(&self.layout, &self.buffer[..=end]) {
            Some(start) => start,
            None => {
                let zeros = self.buffer[end + 1..]
                    .iter()
                    .take_while(|&&byte| byte == DELIMITER)
                    .count();
                end + 1 + zeros
            }
        };

        self.buffer.advance(skip);
        self.out_of_sync = false;

        #[cfg(feature = "logging")]
        debug!("Resynchronized after skipping {} bytes", skip);

        true
    }

    /// Start the inter-chunk timer unless it is already running for the current chunk
    fn arm_timer(&mut self) {
        if self.buffer.is_empty() || self.config.timeout_period.is_zero() {
            self.timer_stamp = None;
        } else if self.timer_stamp.is_none() || self.fresh {
            self.timer_stamp = Some(self.clock.now());
        }
        self.fresh = false;
    }
}

impl fmt::Debug for Packer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packer")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("buffered", &self.buffer.len())
            .field("out_of_sync", &self.out_of_sync)
            .field("timer_stamp", &self.timer_stamp)
            .finish_non_exhaustive()
    }
}

/// Iterator returned by [`Packer::unpack`]
#[derive(Debug)]
pub struct Unpack<'a> {
    packer: &'a mut Packer,
}

impl Iterator for Unpack<'_> {
    type Item = UnpackItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.packer.poll_item()
    }
}
