//! Request/response service client.
//!
//! A [`ServiceClient`] performs one remote call as connect → send →
//! receive, every sub-operation bounded by the *remaining* portion of a
//! single caller-supplied deadline. The transport is constructed fresh for
//! each call and torn down on every exit path, so a deadline that fired
//! mid-call can never leak a half-dead connection into the next one.
//!
//! Two entry points:
//!
//! - [`call`](ServiceClient::call) awaits the response directly; an
//!   overlapping attempt while a call is in flight fails with
//!   [`WirecallError::Busy`].
//! - [`async_call`](ServiceClient::async_call) enqueues the call on the
//!   client's FIFO queue and returns immediately; calls run one at a time
//!   in submission order, and the next call starts only after the previous
//!   handler has returned. The handler is invoked exactly once on every
//!   path — success, local failure, remote failure, timeout, or
//!   [`stop`](ServiceClient::stop).
//!
//! State machine of one call:
//!
//! ```text
//! [Idle] --submit--> [Connecting] --ok--> [Sending] --ok--> [Receiving] --ok--> done: Ok(response)
//!        any step: error | deadline-close | stop() ------------------------> done: Err(kind)
//! ```

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::BytesMut;
use tokio::sync::mpsc;

use crate::codec::Codec;
use crate::deadline::Deadline;
use crate::error::{Result, WirecallError};
use crate::frame::{DEFAULT_MAX_MESSAGE_SIZE, HEADER_SIZE};
use crate::message;
use crate::stream;
use crate::timed::{CloseHandle, Closer};
use crate::transport::StreamSocket;

/// A request/response service: the request and response message types plus
/// the codec that puts them on the wire.
pub trait Service: 'static {
    /// Message sent to the server.
    type Request: Send + Sync + 'static;
    /// Message expected back.
    type Response: Send + 'static;
    /// Codec covering both directions.
    type Wire: Codec<Self::Request> + Codec<Self::Response>;
}

/// Completion handler for a queued call.
pub type CallHandler<S> = Box<dyn FnOnce(Result<<S as Service>::Response>) + Send + 'static>;

struct Job<S: Service> {
    request: S::Request,
    host: String,
    port: u16,
    timeout: Duration,
    handler: CallHandler<S>,
    epoch: u64,
}

/// Client for one remote service.
///
/// Create it from within a tokio runtime: construction spawns the task
/// that drains the call queue.
pub struct ServiceClient<S: Service> {
    inner: Arc<Inner<S>>,
    queue: mpsc::UnboundedSender<Job<S>>,
}

struct Inner<S: Service> {
    max_message_size: usize,
    busy: AtomicBool,
    /// Bumped by `stop()`; queued jobs from an older epoch are aborted
    /// instead of dispatched.
    epoch: AtomicU64,
    /// Close state of the call currently on the wire, if any.
    active: Mutex<Option<CloseHandle>>,
    _service: PhantomData<fn() -> S>,
}

impl<S: Service> ServiceClient<S> {
    /// Create a client whose receive buffer accepts payloads up to
    /// `max_message_size` bytes.
    pub fn new(max_message_size: usize) -> Self {
        let inner = Arc::new(Inner {
            max_message_size,
            busy: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            active: Mutex::new(None),
            _service: PhantomData,
        });

        let (queue, mut jobs) = mpsc::unbounded_channel::<Job<S>>();
        let worker = Arc::clone(&inner);
        tokio::spawn(async move {
            while let Some(job) = jobs.recv().await {
                worker.run_job(job).await;
            }
        });

        Self { inner, queue }
    }

    /// Create a client with the default maximum message size (512 bytes).
    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Perform one call and await the response.
    ///
    /// Fails with [`WirecallError::Busy`] if another call — direct or
    /// queued — is currently in flight on this client.
    pub async fn call(
        &self,
        request: &S::Request,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<S::Response> {
        let _busy = BusyGuard::acquire(&self.inner.busy)?;
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        self.inner.perform(epoch, request, host, port, timeout).await
    }

    /// Enqueue one call; `handler` receives the outcome exactly once.
    ///
    /// Calls run strictly in submission order, one at a time; the next is
    /// dispatched only after the previous handler has returned. Failures of
    /// any kind — including an encode error before any socket work — are
    /// delivered through the handler, never at this call site.
    pub fn async_call<H>(
        &self,
        request: S::Request,
        host: impl Into<String>,
        port: u16,
        timeout: Duration,
        handler: H,
    ) where
        H: FnOnce(Result<S::Response>) + Send + 'static,
    {
        let job = Job {
            request,
            host: host.into(),
            port,
            timeout,
            handler: Box::new(handler),
            epoch: self.inner.epoch.load(Ordering::SeqCst),
        };
        if let Err(rejected) = self.queue.send(job) {
            // The worker is gone (runtime tear-down). The handler still
            // runs exactly once, and still asynchronously.
            let job = rejected.0;
            tokio::spawn(async move { (job.handler)(Err(WirecallError::Aborted)) });
        }
    }

    /// Cancel the client's work.
    ///
    /// Closes the transport of the call currently on the wire (its handler
    /// fires with [`WirecallError::Aborted`]) and aborts queued calls that
    /// have not started — their handlers fire with `Aborted` as well. Calls
    /// submitted after `stop()` run normally on a fresh transport.
    pub fn stop(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        let active = lock_recover(&self.inner.active).clone();
        if let Some(handle) = active {
            handle.close();
        }
        tracing::debug!("service client stopped");
    }

    /// The configured maximum payload size for responses.
    pub fn max_message_size(&self) -> usize {
        self.inner.max_message_size
    }
}

impl<S: Service> Inner<S> {
    async fn run_job(&self, job: Job<S>) {
        if job.epoch < self.epoch.load(Ordering::SeqCst) {
            tracing::debug!("aborting queued call submitted before stop()");
            (job.handler)(Err(WirecallError::Aborted));
            return;
        }
        let result = match BusyGuard::acquire(&self.busy) {
            Ok(_busy) => {
                self.perform(job.epoch, &job.request, &job.host, job.port, job.timeout)
                    .await
            }
            Err(err) => Err(err),
        };
        (job.handler)(result);
        // The queue worker only loops back for the next job after the
        // handler above has returned, which is what keeps dispatch FIFO.
    }

    async fn perform(
        &self,
        epoch: u64,
        request: &S::Request,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<S::Response> {
        let deadline = Deadline::start(timeout);

        // Encode before any socket work; an encoder failure must not cost
        // a connection.
        let payload = <S::Wire as Codec<S::Request>>::encode(request)?;

        let handle = CloseHandle::new();
        *lock_recover(&self.active) = Some(handle.clone());
        // Closes the transport on every exit path out of this call.
        let _closer = Closer::new(handle.clone());

        if epoch < self.epoch.load(Ordering::SeqCst) {
            return Err(WirecallError::Aborted);
        }

        let mut socket = StreamSocket::connect_with(handle, host, port, deadline.remaining()).await?;

        {
            let (raw, close) = socket.parts_mut();
            stream::write(raw, close, &payload, deadline.remaining()).await?;
        }

        let mut buffer = BytesMut::with_capacity(self.max_message_size + HEADER_SIZE);
        let (raw, close) = socket.parts_mut();
        message::receive::<S::Wire, _, _>(
            raw,
            close,
            &mut buffer,
            self.max_message_size,
            deadline.remaining(),
        )
        .await
    }
}

fn lock_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scoped flag ensuring at most one call per client at a time.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WirecallError::Busy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
