//! JSON codec using `serde_json`.
//!
//! Text-based and self-describing; handy for interop with peers that speak
//! JSON and for eyeballing captures. Prefer [`MsgPackCodec`] when payload
//! size matters.
//!
//! [`MsgPackCodec`]: super::MsgPackCodec

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Codec;
use crate::error::{Result, WirecallError};

/// JSON codec for structured data.
pub struct JsonCodec;

impl<M> Codec<M> for JsonCodec
where
    M: Serialize + DeserializeOwned,
{
    #[inline]
    fn encode(message: &M) -> Result<Vec<u8>> {
        serde_json::to_vec(message).map_err(WirecallError::encoding)
    }

    #[inline]
    fn decode(data: &[u8]) -> Result<M> {
        serde_json::from_slice(data).map_err(WirecallError::decoding)
    }
}
