//! Connected TCP stream with deadline-bounded establishment.

use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::Result;
use crate::timed::{self, CloseHandle};

/// A TCP connection owned by exactly one call at a time.
///
/// The socket itself lives here; the shared open/closed state lives in the
/// [`CloseHandle`], which `stop()` and scoped guards clone so they can
/// cancel an operation that has the socket mutably borrowed. After a close
/// the socket is never reused — callers construct a fresh one.
#[derive(Debug)]
pub struct StreamSocket {
    stream: TcpStream,
    handle: CloseHandle,
}

impl StreamSocket {
    /// Connect to `host:port` within `timeout`.
    ///
    /// `host` is resolved through the runtime's resolver, so names as well
    /// as literal addresses work.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        Self::connect_with(CloseHandle::new(), host, port, timeout).await
    }

    /// Connect using an externally created [`CloseHandle`].
    ///
    /// Registering the handle before the connect starts lets `stop()` reach
    /// a connection attempt that is still in flight.
    pub async fn connect_with(
        handle: CloseHandle,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self> {
        let stream = timed::run(&handle, timeout, TcpStream::connect((host, port))).await?;
        Ok(Self { stream, handle })
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

    /// Split borrows for the framed I/O layer: the raw stream plus the
    /// close state bounding it.
    pub fn parts_mut(&mut self) -> (&mut TcpStream, &CloseHandle) {
        (&mut self.stream, &self.handle)
    }
}
