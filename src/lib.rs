//! # wirecall
//!
//! Deadline-bounded, length-framed request/response messaging over TCP and
//! UDP.
//!
//! Every operation takes one end-to-end timeout. Multi-step operations —
//! the two phases of a framed read, or a client call's connect → send →
//! receive chain — spend that budget cooperatively: each step is bounded by
//! whatever the previous steps left over. When the budget runs out the
//! transport is closed, the pending I/O resolves with
//! [`WirecallError::Aborted`], and the connection is discarded.
//!
//! ## Architecture
//!
//! ```text
//! user message ──► codec ──► framed bytes ──► transport ──► peer
//!                                  ▲
//!               4-byte big-endian length prefix (streams only;
//!               on datagrams the datagram boundary is the frame)
//! ```
//!
//! Layered bottom-up:
//!
//! - [`frame`] — the length-prefix wire format
//! - [`strand`] — linearizes the deadline arm against the I/O completion
//! - [`timed`] — deadline-by-close wrapper and outcome classification
//! - [`transport`] — timed TCP ([`StreamSocket`]) and UDP
//!   ([`DatagramSocket`]) primitives
//! - [`stream`] / [`message`] — framed, then typed, read and write
//! - [`client`] — [`ServiceClient`]: busy-guarded, FIFO-queued calls
//!
//! ## Example
//!
//! ```ignore
//! use std::time::Duration;
//! use wirecall::{ServiceClient, Service, codec::MsgPackCodec};
//!
//! struct Echo;
//!
//! impl Service for Echo {
//!     type Request = String;
//!     type Response = String;
//!     type Wire = MsgPackCodec;
//! }
//!
//! #[tokio::main]
//! async fn main() -> wirecall::Result<()> {
//!     let client = ServiceClient::<Echo>::with_default_size();
//!     let reply = client
//!         .call(&"ping".into(), "127.0.0.1", 4711, Duration::from_millis(100))
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod deadline;
pub mod error;
pub mod frame;
pub mod message;
pub mod stream;
pub mod strand;
pub mod timed;
pub mod transport;

pub use client::{CallHandler, Service, ServiceClient};
pub use deadline::Deadline;
pub use error::{Result, WirecallError};
pub use frame::{DEFAULT_MAX_MESSAGE_SIZE, HEADER_SIZE};
pub use timed::{CloseHandle, Closer};
pub use transport::{DatagramSocket, StreamSocket};
