//! Typed message send/receive over framed streams and datagrams.
//!
//! Thin composition of a [`Codec`] with the framed [`crate::stream`] layer
//! (or the raw datagram layer, where the datagram boundary itself is the
//! frame). Encode failures never reach the wire; decode failures discard
//! the received bytes.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::Codec;
use crate::error::Result;
use crate::stream;
use crate::timed::CloseHandle;
use crate::transport::DatagramSocket;

/// Encode `message` with `C` and write it as one frame within `timeout`.
pub async fn send<C, M, S>(
    stream: &mut S,
    handle: &CloseHandle,
    message: &M,
    timeout: Duration,
) -> Result<()>
where
    C: Codec<M>,
    S: AsyncWrite + Unpin,
{
    let data = C::encode(message)?;
    stream::write(stream, handle, &data, timeout).await
}

/// Read one frame within `timeout` and decode it with `C`.
///
/// `buf` is the receive buffer shared by both read phases; size it for the
/// largest expected payload plus the frame header.
pub async fn receive<C, M, S>(
    stream: &mut S,
    handle: &CloseHandle,
    buf: &mut BytesMut,
    max_payload: usize,
    timeout: Duration,
) -> Result<M>
where
    C: Codec<M>,
    S: AsyncRead + Unpin,
{
    let data = stream::read(stream, handle, buf, max_payload, timeout).await?;
    C::decode(&data)
}

/// Encode `message` with `C` and send it as one datagram within `timeout`.
pub async fn send_datagram<C, M>(
    socket: &DatagramSocket,
    message: &M,
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<()>
where
    C: Codec<M>,
{
    let data = C::encode(message)?;
    socket.send_to(&data, host, port, timeout).await
}

/// Receive one datagram within `timeout` and decode it with `C`.
///
/// Returns the decoded message together with the sender's address.
pub async fn receive_datagram<C, M>(
    socket: &DatagramSocket,
    buf: &mut BytesMut,
    max_size: usize,
    timeout: Duration,
) -> Result<(M, SocketAddr)>
where
    C: Codec<M>,
{
    let (data, sender) = socket.receive_from(buf, max_size, timeout).await?;
    Ok((C::decode(&data)?, sender))
}
