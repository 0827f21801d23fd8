//! Encoder producing the same field layout the decoder reads. Used to build
//! fixtures and to feed tests with realistic payloads.

use buildscope_core::types::{
    Dictionary, DictionaryProperty, DictionaryRef, Dimension, DimensionCount, SearchResult, Value, ValueList,
};

use crate::reader::WireType;

#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn varint(&mut self, mut value: u64) -> &mut Self {
        loop {
            #[allow(clippy::cast_possible_truncation)]
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return self;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn tag(&mut self, field: u32, wire_type: WireType) -> &mut Self {
        self.varint((u64::from(field) << 3) | u64::from(wire_type.bits()))
    }

    pub fn uint_field(&mut self, field: u32, value: u64) -> &mut Self {
        self.tag(field, WireType::Varint).varint(value)
    }

    pub fn bool_field(&mut self, field: u32, value: bool) -> &mut Self {
        self.uint_field(field, u64::from(value))
    }

    pub fn bytes_field(&mut self, field: u32, bytes: &[u8]) -> &mut Self {
        self.tag(field, WireType::LengthDelimited).varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn string_field(&mut self, field: u32, value: &str) -> &mut Self {
        self.bytes_field(field, value.as_bytes())
    }

    pub fn fixed32_field(&mut self, field: u32, value: u32) -> &mut Self {
        self.tag(field, WireType::Fixed32);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn fixed64_field(&mut self, field: u32, value: u64) -> &mut Self {
        self.tag(field, WireType::Fixed64);
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Packed repeated varints in one length-delimited field.
    pub fn packed_field(&mut self, field: u32, values: &[u64]) -> &mut Self {
        let mut inner = WireWriter::new();
        for v in values {
            inner.varint(*v);
        }
        self.bytes_field(field, &inner.into_bytes())
    }

    pub fn message_field(&mut self, field: u32, build: impl FnOnce(&mut WireWriter)) -> &mut Self {
        let mut inner = WireWriter::new();
        build(&mut inner);
        self.bytes_field(field, &inner.into_bytes())
    }
}

fn write_count(w: &mut WireWriter, c: &DimensionCount) {
    w.uint_field(1, c.key).uint_field(2, c.count);
}

fn write_dimension(w: &mut WireWriter, d: &Dimension) {
    w.string_field(1, &d.id).string_field(2, &d.dictionary_id);
    for c in &d.counts {
        w.message_field(3, |m| write_count(m, c));
    }
}

fn write_value(w: &mut WireWriter, v: &Value) {
    if let Some(s) = &v.str {
        w.string_field(1, s);
    }
    if let Some(n) = v.number {
        w.uint_field(2, n);
    }
    if !v.numbers.is_empty() {
        w.packed_field(3, &v.numbers);
    }
    for s in &v.strs {
        w.string_field(4, s);
    }
    if let Some(b) = v.boolean {
        w.bool_field(5, b);
    }
}

fn write_value_list(w: &mut WireWriter, l: &ValueList) {
    w.string_field(1, &l.id);
    for v in &l.values {
        w.message_field(2, |m| write_value(m, v));
    }
}

fn write_dictionary_ref(w: &mut WireWriter, r: &DictionaryRef) {
    w.string_field(1, &r.id).string_field(2, &r.hash);
}

fn write_search_result(w: &mut WireWriter, r: &SearchResult) {
    w.uint_field(1, r.total);
    for d in &r.dimensions {
        w.message_field(2, |m| write_dimension(m, d));
    }
    for l in &r.value_lists {
        w.message_field(5, |m| write_value_list(m, l));
    }
    for dr in &r.dictionary_refs {
        w.message_field(6, |m| write_dictionary_ref(m, dr));
    }
}

fn write_property(w: &mut WireWriter, p: &DictionaryProperty) {
    w.string_field(1, &p.id);
    for v in &p.values {
        w.string_field(2, v);
    }
}

pub fn encode_search_result(result: &SearchResult) -> Vec<u8> {
    let mut w = WireWriter::new();
    write_search_result(&mut w, result);
    w.into_bytes()
}

/// Top-level response envelope wrapping a search result in field 1.
pub fn encode_envelope(result: &SearchResult) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.message_field(1, |m| write_search_result(m, result));
    w.into_bytes()
}

pub fn encode_dictionary(dict: &Dictionary) -> Vec<u8> {
    let mut w = WireWriter::new();
    w.string_field(1, &dict.id);
    for v in &dict.values {
        w.string_field(2, v);
    }
    for p in &dict.properties {
        w.message_field(3, |m| write_property(m, p));
    }
    w.into_bytes()
}
