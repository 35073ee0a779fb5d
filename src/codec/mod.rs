//! Codec module - pluggable serialization for message payloads.
//!
//! The message layer is parametrized over a user message type and a codec
//! that turns it into payload bytes and back:
//!
//! - [`MsgPackCodec`] - MessagePack via `rmp-serde` for structured data
//! - [`JsonCodec`] - JSON via `serde_json` for interop and debugging
//! - [`BytesCodec`] - pass-through for payloads that already are bytes
//!
//! Encode failures surface as [`WirecallError::Encoding`] before any I/O is
//! attempted; decode failures as [`WirecallError::Decoding`] after a
//! successful read, with the received bytes discarded.
//!
//! # Example
//!
//! ```
//! use wirecall::codec::{Codec, MsgPackCodec};
//!
//! let encoded = MsgPackCodec::encode(&"hello".to_string()).unwrap();
//! let decoded: String = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//! ```

mod json;
mod msgpack;
mod raw;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;
pub use raw::BytesCodec;

use crate::error::Result;

/// A codec for one message type.
///
/// Codecs are marker structs; both directions are associated functions so a
/// codec can be chosen at compile time with no per-message state.
pub trait Codec<M> {
    /// Encode a message to payload bytes.
    fn encode(message: &M) -> Result<Vec<u8>>;

    /// Decode payload bytes back into a message.
    fn decode(data: &[u8]) -> Result<M>;
}
