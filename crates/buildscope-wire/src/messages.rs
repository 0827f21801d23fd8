//! One decode function per message type. Every decoder walks its own buffer
//! and applies the same skip policy to unknown fields and to known fields
//! that arrive with an unexpected wire type.

use buildscope_core::error::DecodeError;
use buildscope_core::types::{
    Dictionary, DictionaryProperty, DictionaryRef, Dimension, DimensionCount, SearchResult, Value, ValueList,
};

use crate::reader::WireReader;

use crate::reader::WireType::{LengthDelimited as Len, Varint};

/// Decode the response envelope; field 1 carries the search result.
pub fn decode_envelope(buf: &[u8]) -> Result<SearchResult, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut result = None;
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => result = Some(decode_search_result(r.read_bytes()?)?),
            (_, wt) => r.skip(wt)?,
        }
    }
    result.ok_or(DecodeError::MissingField("result"))
}

pub fn decode_search_result(buf: &[u8]) -> Result<SearchResult, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = SearchResult::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Varint) => out.total = r.read_varint()?,
            (2, Len) => out.dimensions.push(decode_dimension(r.read_bytes()?)?),
            (5, Len) => out.value_lists.push(decode_value_list(r.read_bytes()?)?),
            (6, Len) => out.dictionary_refs.push(decode_dictionary_ref(r.read_bytes()?)?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

pub fn decode_dimension(buf: &[u8]) -> Result<Dimension, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = Dimension::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => out.id = r.read_string()?,
            (2, Len) => out.dictionary_id = r.read_string()?,
            (3, Len) => out.counts.push(decode_dimension_count(r.read_bytes()?)?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

pub fn decode_dimension_count(buf: &[u8]) -> Result<DimensionCount, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = DimensionCount::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Varint) => out.key = r.read_varint()?,
            (2, Varint) => out.count = r.read_varint()?,
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

pub fn decode_dictionary_ref(buf: &[u8]) -> Result<DictionaryRef, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = DictionaryRef::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => out.id = r.read_string()?,
            (2, Len) => out.hash = r.read_string()?,
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

pub fn decode_dictionary(buf: &[u8]) -> Result<Dictionary, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = Dictionary::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => out.id = r.read_string()?,
            (2, Len) => out.values.push(r.read_string()?),
            (3, Len) => out.properties.push(decode_property(r.read_bytes()?)?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

fn decode_property(buf: &[u8]) -> Result<DictionaryProperty, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = DictionaryProperty::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => out.id = r.read_string()?,
            (2, Len) => out.values.push(r.read_string()?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

pub fn decode_value_list(buf: &[u8]) -> Result<ValueList, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = ValueList::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => out.id = r.read_string()?,
            (2, Len) => out.values.push(decode_value(r.read_bytes()?)?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}

pub fn decode_value(buf: &[u8]) -> Result<Value, DecodeError> {
    let mut r = WireReader::new(buf);
    let mut out = Value::default();
    while !r.is_empty() {
        let tag = r.read_tag()?;
        match (tag.field, tag.wire_type) {
            (1, Len) => out.str = Some(r.read_string()?),
            (2, Varint) => out.number = Some(r.read_varint()?),
            (3, Varint) => out.numbers.push(r.read_varint()?),
            (3, Len) => {
                let mut packed = WireReader::new(r.read_bytes()?);
                while !packed.is_empty() {
                    out.numbers.push(packed.read_varint()?);
                }
            }
            (4, Len) => out.strs.push(r.read_string()?),
            (5, Varint) => out.boolean = Some(r.read_bool()?),
            (_, wt) => r.skip(wt)?,
        }
    }
    Ok(out)
}
