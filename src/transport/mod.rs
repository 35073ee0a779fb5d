//! Timed transport primitives.
//!
//! Two transport flavors share the same deadline-bounded operation model:
//!
//! - [`StreamSocket`] — a connected TCP stream carrying length-framed
//!   messages (framing lives in [`crate::stream`]).
//! - [`DatagramSocket`] — a bound UDP socket; the datagram boundary is the
//!   frame, so no length prefix is applied.
//!
//! Every operation takes a timeout and resolves with the outcome
//! classification of [`crate::timed`]: the deadline closes the transport,
//! and a closed transport is discarded rather than reused.

mod tcp;
mod udp;

pub use tcp::StreamSocket;
pub use udp::DatagramSocket;
