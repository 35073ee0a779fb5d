//! Bound UDP socket with deadline-bounded send/receive.
//!
//! No length prefix is applied on datagram transports: one user message per
//! datagram, sized by the transport MTU and the caller's buffer.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::net::UdpSocket;

use crate::error::{Result, WirecallError};
use crate::timed::{self, CloseHandle};

/// A bound UDP socket.
#[derive(Debug)]
pub struct DatagramSocket {
    socket: UdpSocket,
    handle: CloseHandle,
}

impl DatagramSocket {
    /// Bind to `host:port`. Use port 0 for an ephemeral port.
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind((host, port))
            .await
            .map_err(WirecallError::FailedOperation)?;
        Ok(Self {
            socket,
            handle: CloseHandle::new(),
        })
    }

    /// Send one datagram to `host:port` within `timeout`.
    ///
    /// A datagram delivered short with no error is a failed operation: the
    /// peer cannot reassemble a partial message.
    pub async fn send_to(
        &self,
        data: &[u8],
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<()> {
        let sent = timed::run(
            &self.handle,
            timeout,
            self.socket.send_to(data, (host, port)),
        )
        .await?;
        if sent != data.len() {
            return Err(WirecallError::FailedOperation(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short datagram send: {sent} of {} bytes", data.len()),
            )));
        }
        Ok(())
    }

    /// Receive one datagram within `timeout`.
    ///
    /// `buf` is resized to `max_size` before the read; the returned bytes
    /// are the received prefix, together with the sender's address.
    pub async fn receive_from(
        &self,
        buf: &mut BytesMut,
        max_size: usize,
        timeout: Duration,
    ) -> Result<(Bytes, SocketAddr)> {
        buf.clear();
        buf.resize(max_size, 0);
        let (received, sender) =
            timed::run(&self.handle, timeout, self.socket.recv_from(&mut buf[..])).await?;
        Ok((buf.split_to(received).freeze(), sender))
    }

    /// The local address this socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(WirecallError::FailedOperation)
    }

    /// Whether the transport is still open.
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Close the transport, aborting any in-flight operation on it.
    pub fn close(&self) {
        self.handle.close();
    }

    /// A clone of the shared close state.
    pub fn close_handle(&self) -> CloseHandle {
        self.handle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn datagram_roundtrip_reports_sender() {
        let a = DatagramSocket::bind("127.0.0.1", 0).await.unwrap();
        let b = DatagramSocket::bind("127.0.0.1", 0).await.unwrap();
        let b_port = b.local_addr().unwrap().port();

        a.send_to(b"hello", "127.0.0.1", b_port, Duration::from_secs(1))
            .await
            .unwrap();

        let mut buf = BytesMut::new();
        let (data, sender) = b
            .receive_from(&mut buf, 512, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(&data[..], b"hello");
        assert_eq!(sender.port(), a.local_addr().unwrap().port());
    }

    #[tokio::test]
    async fn receive_deadline_aborts() {
        let socket = DatagramSocket::bind("127.0.0.1", 0).await.unwrap();
        let mut buf = BytesMut::new();

        let start = Instant::now();
        let result = socket
            .receive_from(&mut buf, 512, Duration::from_millis(40))
            .await;

        assert!(matches!(result, Err(WirecallError::Aborted)));
        assert!(!socket.is_open());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn closed_socket_aborts_immediately() {
        let socket = DatagramSocket::bind("127.0.0.1", 0).await.unwrap();
        socket.close();

        let result = socket
            .send_to(b"x", "127.0.0.1", 9, Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(WirecallError::Aborted)));
    }

    #[tokio::test]
    async fn empty_datagram_roundtrip() {
        let a = DatagramSocket::bind("127.0.0.1", 0).await.unwrap();
        let b = DatagramSocket::bind("127.0.0.1", 0).await.unwrap();
        let b_port = b.local_addr().unwrap().port();

        a.send_to(b"", "127.0.0.1", b_port, Duration::from_secs(1))
            .await
            .unwrap();

        let mut buf = BytesMut::new();
        let (data, _) = b
            .receive_from(&mut buf, 512, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(data.is_empty());
    }
}
