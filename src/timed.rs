//! Deadline-bounded execution of asynchronous transport operations.
//!
//! Most stream APIs offer no per-operation deadline. The portable cancel
//! primitive is *closing the transport*: when the deadline expires, the
//! transport is marked closed and the pending I/O future is abandoned, so
//! the operation resolves with [`WirecallError::Aborted`]. The transport is
//! unusable afterwards, which is acceptable because callers discard the
//! connection at the end of the call anyway.
//!
//! # Architecture
//!
//! ```text
//!             ┌── deadline arm ── close() ──────► Aborted
//! run(io) ────┼── I/O completion ── classify ───► Ok | FailedOperation | Aborted
//!             └── close observed (stop()) ──────► Aborted
//! ```
//!
//! The deadline arm and the completion classification are serialized
//! through the transport's [`Strand`], so "is the transport still open?" is
//! observed consistently: whichever arm runs first wins, never both.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Result, WirecallError};
use crate::strand::Strand;

/// Shared open/closed state of one transport.
///
/// Cloneable so that `stop()` and scoped guards can reach a transport whose
/// socket is mutably borrowed by an in-flight operation. Closing is
/// idempotent and wakes every task waiting in [`CloseHandle::closed`].
#[derive(Debug, Clone)]
pub struct CloseHandle {
    inner: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    open: AtomicBool,
    closed_tx: watch::Sender<bool>,
    strand: Strand,
}

impl CloseHandle {
    /// Create the state for a freshly opened transport.
    pub fn new() -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Shared {
                open: AtomicBool::new(true),
                closed_tx,
                strand: Strand::new(),
            }),
        }
    }

    /// Whether the transport is still open.
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Close the transport: mark it unusable and wake closed-waiters.
    ///
    /// Runs on the handle's strand so it is linearized against outcome
    /// classification. Idempotent.
    pub fn close(&self) {
        self.inner.strand.run(|| {
            if self.inner.open.swap(false, Ordering::SeqCst) {
                tracing::debug!("transport closed");
                let _ = self.inner.closed_tx.send(true);
            }
        });
    }

    /// Resolve once the transport has been closed (immediately if it
    /// already is).
    pub async fn closed(&self) {
        let mut rx = self.inner.closed_tx.subscribe();
        // The sender lives inside self, so wait_for cannot fail while the
        // borrow is held.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub(crate) fn strand(&self) -> &Strand {
        &self.inner.strand
    }
}

impl Default for CloseHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped guard that closes a transport on every exit path.
///
/// Dropping the guard closes the transport unless it was [`disarmed`]
/// first. Move-aware like any Rust value; the last owner closes.
///
/// [`disarmed`]: Closer::disarm
#[derive(Debug)]
pub struct Closer {
    handle: Option<CloseHandle>,
}

impl Closer {
    /// Arm a guard for `handle`.
    pub fn new(handle: CloseHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Release the guard without closing, handing the handle back.
    pub fn disarm(mut self) -> CloseHandle {
        // The handle is always present until drop or disarm.
        self.handle.take().unwrap_or_default()
    }
}

impl Drop for Closer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }
}

/// Run `io` against `handle` with a deadline of `timeout`.
///
/// Outcome classification:
/// - `Ok(value)` if the I/O succeeded and the transport is still open;
/// - [`WirecallError::Aborted`] if the transport is no longer open — the
///   deadline closed it, `stop()` closed it, or it was closed before entry;
/// - [`WirecallError::FailedOperation`] if the I/O reported an error while
///   the transport remained open.
///
/// A zero `timeout` (an exhausted remaining budget) closes the transport
/// and resolves with `Aborted`; the operation never hangs and the caller's
/// continuation always runs.
pub async fn run<T, F>(handle: &CloseHandle, timeout: Duration, io: F) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    if !handle.is_open() {
        return Err(WirecallError::Aborted);
    }
    if timeout.is_zero() {
        handle.close();
        return Err(WirecallError::Aborted);
    }

    tokio::pin!(io);
    tokio::select! {
        res = &mut io => classify(handle, res),
        _ = tokio::time::sleep(timeout) => {
            tracing::debug!(timeout_ms = timeout.as_millis() as u64,
                "deadline expired, closing transport");
            handle.close();
            Err(WirecallError::Aborted)
        }
        _ = handle.closed() => Err(WirecallError::Aborted),
    }
}

/// Classify an I/O completion under the handle's strand.
///
/// Even when the I/O notionally succeeded, a close that won the race means
/// the result must not be trusted: the outcome is `Aborted`.
fn classify<T>(handle: &CloseHandle, res: std::io::Result<T>) -> Result<T> {
    handle.strand().run(|| {
        if !handle.is_open() {
            return Err(WirecallError::Aborted);
        }
        match res {
            Ok(value) => Ok(value),
            Err(err) => Err(WirecallError::FailedOperation(err)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn success_passes_through() {
        let handle = CloseHandle::new();
        let out = run(&handle, Duration::from_secs(1), async { Ok(5u32) }).await;
        assert_eq!(out.unwrap(), 5);
        assert!(handle.is_open());
    }

    #[tokio::test]
    async fn io_error_with_open_transport_is_failed_operation() {
        let handle = CloseHandle::new();
        let out: Result<()> = run(&handle, Duration::from_secs(1), async {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"))
        })
        .await;
        assert!(matches!(out, Err(WirecallError::FailedOperation(_))));
        assert!(handle.is_open());
    }

    #[tokio::test]
    async fn zero_timeout_aborts_and_closes() {
        let handle = CloseHandle::new();
        let out: Result<u32> = run(&handle, Duration::ZERO, async { Ok(1) }).await;
        assert!(matches!(out, Err(WirecallError::Aborted)));
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn deadline_closes_pending_io() {
        let (_keep_open, mut quiet) = tokio::io::duplex(64);
        let handle = CloseHandle::new();
        let mut byte = [0u8; 1];

        let start = Instant::now();
        let out = run(&handle, Duration::from_millis(40), quiet.read_exact(&mut byte)).await;

        assert!(matches!(out, Err(WirecallError::Aborted)));
        assert!(!handle.is_open());
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn external_close_aborts_promptly() {
        let (_keep_open, mut quiet) = tokio::io::duplex(64);
        let handle = CloseHandle::new();
        let closer = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            closer.close();
        });

        let start = Instant::now();
        let mut byte = [0u8; 1];
        let out = run(&handle, Duration::from_secs(10), quiet.read_exact(&mut byte)).await;

        assert!(matches!(out, Err(WirecallError::Aborted)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn completion_after_close_classifies_aborted() {
        let handle = CloseHandle::new();
        let inner = handle.clone();
        // The I/O "succeeds" but the transport was closed just before the
        // completion is observed.
        let out = run(&handle, Duration::from_secs(1), async move {
            inner.close();
            Ok(9u32)
        })
        .await;
        assert!(matches!(out, Err(WirecallError::Aborted)));
    }

    #[tokio::test]
    async fn already_closed_handle_aborts_without_submitting() {
        let handle = CloseHandle::new();
        handle.close();
        let out: Result<u32> = run(&handle, Duration::from_secs(1), async {
            panic!("io must not run")
        })
        .await;
        assert!(matches!(out, Err(WirecallError::Aborted)));
    }

    #[tokio::test]
    async fn closer_closes_on_drop() {
        let handle = CloseHandle::new();
        {
            let _closer = Closer::new(handle.clone());
        }
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn disarmed_closer_leaves_transport_open() {
        let handle = CloseHandle::new();
        let closer = Closer::new(handle.clone());
        let _ = closer.disarm();
        assert!(handle.is_open());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let handle = CloseHandle::new();
        handle.close();
        handle.close();
        assert!(!handle.is_open());
        // closed() resolves immediately on an already-closed handle.
        handle.closed().await;
    }
}
