#![deny(dead_code)]
#![deny(unused_variables)]

//! Decoder for the fixed survey wire schema.
//!
//! Callers own a [`WireDecoder`] and pass it where decoding is needed; there
//! is no process-wide decoder registry.

pub mod messages;
pub mod reader;
pub mod writer;

use buildscope_core::error::DecodeError;
use buildscope_core::types::{Dictionary, SearchResult};
use tracing::debug;

pub use reader::{Tag, WireReader, WireType};
pub use writer::{encode_dictionary, encode_envelope, encode_search_result, WireWriter};

pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct WireDecoder {
    max_message_bytes: usize,
}

impl Default for WireDecoder {
    fn default() -> Self {
        Self { max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES }
    }
}

impl WireDecoder {
    pub fn new(max_message_bytes: usize) -> Self {
        Self { max_message_bytes }
    }

    fn check_len(&self, buf: &[u8]) -> Result<(), DecodeError> {
        if buf.len() > self.max_message_bytes {
            return Err(DecodeError::MessageTooLarge { len: buf.len(), max: self.max_message_bytes });
        }
        Ok(())
    }

    /// Decode a search response envelope.
    pub fn decode(&self, buf: &[u8]) -> Result<SearchResult, DecodeError> {
        self.check_len(buf)?;
        let result = messages::decode_envelope(buf)?;
        debug!(bytes = buf.len(), dimensions = result.dimensions.len(), total = result.total, "decoded search result");
        Ok(result)
    }

    pub fn decode_dictionary(&self, buf: &[u8]) -> Result<Dictionary, DecodeError> {
        self.check_len(buf)?;
        let dict = messages::decode_dictionary(buf)?;
        debug!(bytes = buf.len(), id = %dict.id, values = dict.values.len(), "decoded dictionary");
        Ok(dict)
    }
}
