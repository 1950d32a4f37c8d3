use crate::{config::DecodeConfig, serialize::SerializedValue};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};
use thiserror::Error as ThisError;

///
/// CodecError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("decode size limit exceeded: {len} bytes (limit {max_bytes})")]
    SizeLimitExceeded { len: usize, max_bytes: usize },
}

/// Encode a boundary value as CBOR.
pub fn encode_cbor(value: &SerializedValue) -> Result<Vec<u8>, CodecError> {
    to_vec(value).map_err(|err| CodecError::Encode(err.to_string()))
}

/// Decode CBOR bytes into a boundary value.
///
/// Input size is checked against `config.max_bytes` before decoding, and a
/// panic inside the decoder is reported as a decode error.
pub fn decode_cbor(bytes: &[u8], config: &DecodeConfig) -> Result<SerializedValue, CodecError> {
    check_len(bytes.len(), config)?;

    match catch_unwind(AssertUnwindSafe(|| from_slice(bytes))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CodecError::Decode(err.to_string())),
        Err(_) => Err(CodecError::Decode(
            "panic during CBOR deserialization".into(),
        )),
    }
}

/// Encode a boundary value as JSON text.
///
/// JSON has no NaN or infinity; such floats are written as `null` and do
/// not survive a round trip. Use CBOR when they must be preserved.
pub fn to_json(value: &SerializedValue) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|err| CodecError::Encode(err.to_string()))
}

/// Decode JSON text into a boundary value, bounded by `config.max_bytes`.
pub fn from_json(text: &str, config: &DecodeConfig) -> Result<SerializedValue, CodecError> {
    check_len(text.len(), config)?;

    serde_json::from_str(text).map_err(|err| CodecError::Decode(err.to_string()))
}

const fn check_len(len: usize, config: &DecodeConfig) -> Result<(), CodecError> {
    if len > config.max_bytes {
        return Err(CodecError::SizeLimitExceeded {
            len,
            max_bytes: config.max_bytes,
        });
    }

    Ok(())
}
