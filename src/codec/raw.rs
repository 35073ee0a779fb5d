//! Pass-through codec for payloads that already are bytes.
//!
//! No serialization is performed. `Bytes` and `Vec<u8>` round-trip
//! verbatim; `String` additionally validates UTF-8 on the way in, so its
//! decode direction can genuinely fail.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use wirecall::codec::{BytesCodec, Codec};
//!
//! let encoded = BytesCodec::encode(&Bytes::from_static(b"raw")).unwrap();
//! assert_eq!(encoded, b"raw");
//! ```

use bytes::Bytes;

use super::Codec;
use crate::error::{Result, WirecallError};

/// Codec that passes bytes through without transformation.
pub struct BytesCodec;

impl Codec<Bytes> for BytesCodec {
    #[inline]
    fn encode(message: &Bytes) -> Result<Vec<u8>> {
        Ok(message.to_vec())
    }

    #[inline]
    fn decode(data: &[u8]) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(data))
    }
}

impl Codec<Vec<u8>> for BytesCodec {
    #[inline]
    fn encode(message: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(message.clone())
    }

    #[inline]
    fn decode(data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

impl Codec<String> for BytesCodec {
    #[inline]
    fn encode(message: &String) -> Result<Vec<u8>> {
        Ok(message.clone().into_bytes())
    }

    #[inline]
    fn decode(data: &[u8]) -> Result<String> {
        String::from_utf8(data.to_vec()).map_err(WirecallError::decoding)
    }
}
