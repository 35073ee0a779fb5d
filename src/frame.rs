//! Wire format encoding and decoding.
//!
//! Implements the 4-byte length-prefix framing used on stream transports:
//!
//! ```text
//! ┌──────────────┬──────────────────┐
//! │ Length       │ Payload          │
//! │ 4 bytes      │ Length bytes     │
//! │ uint32 BE    │                  │
//! └──────────────┴──────────────────┘
//! ```
//!
//! The length field counts payload bytes only. A length of zero is a valid
//! frame carrying an empty payload. Datagram transports do not use this
//! module: the datagram boundary is the frame.

use crate::error::{Result, WirecallError};

/// Header size in bytes (fixed, exactly 4).
pub const HEADER_SIZE: usize = 4;

/// Default maximum payload size accepted on receive.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512;

/// Build a complete frame as a single byte vector.
///
/// Prepends the big-endian length header to the payload. Use
/// [`frame_parts`] for scatter/gather I/O instead.
///
/// # Example
///
/// ```
/// use wirecall::frame::{build_frame, HEADER_SIZE};
///
/// let bytes = build_frame(b"ping");
/// assert_eq!(bytes.len(), HEADER_SIZE + 4);
/// assert_eq!(&bytes[..HEADER_SIZE], &[0, 0, 0, 4]);
/// assert_eq!(&bytes[HEADER_SIZE..], b"ping");
/// ```
pub fn build_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&encode_header(payload.len() as u32));
    buf.extend_from_slice(payload);
    buf
}

/// Build frame parts for scatter/gather I/O.
///
/// Returns the encoded header and a reference to the payload, avoiding a
/// copy for writev-style operations.
pub fn frame_parts(payload: &[u8]) -> ([u8; HEADER_SIZE], &[u8]) {
    (encode_header(payload.len() as u32), payload)
}

/// Encode a payload length as the 4-byte big-endian header.
#[inline]
pub fn encode_header(payload_len: u32) -> [u8; HEADER_SIZE] {
    payload_len.to_be_bytes()
}

/// Decode the payload length from the first 4 bytes of a frame.
///
/// Returns [`WirecallError::InvalidFrame`] if fewer than 4 bytes are given.
pub fn decode_header(buf: &[u8]) -> Result<u32> {
    if buf.len() < HEADER_SIZE {
        return Err(WirecallError::InvalidFrame(format!(
            "header needs {HEADER_SIZE} bytes, got {}",
            buf.len()
        )));
    }
    Ok(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// Total wire size of a frame carrying `payload_len` payload bytes.
#[inline]
pub fn wire_size(payload_len: usize) -> usize {
    HEADER_SIZE + payload_len
}
