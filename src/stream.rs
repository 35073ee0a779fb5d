//! Framed read/write over byte streams.
//!
//! A write is a single deadline-bounded operation covering header and
//! payload. A read is two phases — header, then body — sharing one buffer
//! and one deadline: phase two runs on whatever budget phase one left
//! behind, never on a fresh timer.
//!
//! Error mapping at this layer:
//! - a header or body delivered short with the connection otherwise fine is
//!   [`WirecallError::InvalidFrame`];
//! - a declared length beyond `max_payload` is `InvalidFrame` at header
//!   parse, before any body read is attempted;
//! - a deadline expiring in either phase closes the transport and surfaces
//!   [`WirecallError::Aborted`].

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::deadline::Deadline;
use crate::error::{Result, WirecallError};
use crate::frame::{self, HEADER_SIZE};
use crate::timed::{self, CloseHandle};

/// Write `payload` as one frame within `timeout`.
///
/// The frame buffer is owned by the operation until the write completes; a
/// write cut short without a transport error surfaces as
/// [`WirecallError::FailedOperation`].
pub async fn write<S>(
    stream: &mut S,
    handle: &CloseHandle,
    payload: &[u8],
    timeout: Duration,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let frame = frame::build_frame(payload);
    timed::run(handle, timeout, async {
        stream.write_all(&frame).await?;
        stream.flush().await
    })
    .await
}

/// Read one frame within `timeout`, returning its payload.
///
/// Both phases reuse `buf`; the header bytes are consumed before the body
/// lands. An empty frame (`length == 0`) succeeds without a second read.
pub async fn read<S>(
    stream: &mut S,
    handle: &CloseHandle,
    buf: &mut BytesMut,
    max_payload: usize,
    timeout: Duration,
) -> Result<Bytes>
where
    S: AsyncRead + Unpin,
{
    let deadline = Deadline::start(timeout);

    // Phase 1: exactly the header.
    buf.clear();
    buf.resize(HEADER_SIZE, 0);
    timed::run(
        handle,
        deadline.remaining(),
        stream.read_exact(&mut buf[..HEADER_SIZE]),
    )
    .await
    .map_err(|err| reclassify_short_read(err, "short frame header"))?;

    let length = frame::decode_header(&buf[..HEADER_SIZE])? as usize;
    if length == 0 {
        buf.clear();
        return Ok(Bytes::new());
    }
    if length > max_payload {
        return Err(WirecallError::InvalidFrame(format!(
            "declared length {length} exceeds maximum {max_payload}"
        )));
    }

    // Phase 2: exactly the body, on the remaining budget.
    buf.clear();
    buf.resize(length, 0);
    timed::run(
        handle,
        deadline.remaining(),
        stream.read_exact(&mut buf[..length]),
    )
    .await
    .map_err(|err| reclassify_short_read(err, "short frame body"))?;

    Ok(buf.split_to(length).freeze())
}

/// An EOF inside an exact read means the peer stopped mid-frame: that is a
/// framing violation, not a transport failure.
fn reclassify_short_read(err: WirecallError, what: &str) -> WirecallError {
    match err {
        WirecallError::FailedOperation(io)
            if io.kind() == std::io::ErrorKind::UnexpectedEof =>
        {
            WirecallError::InvalidFrame(what.to_string())
        }
        other => other,
    }
}
