use buildscope_core::error::DecodeError;
use buildscope_core::types::{
    Dictionary, DictionaryProperty, DictionaryRef, Dimension, DimensionCount, SearchResult, Value, ValueList,
};
use buildscope_wire::messages::{decode_dimension, decode_value};
use buildscope_wire::{encode_dictionary, encode_envelope, encode_search_result, WireDecoder, WireWriter};

fn sample() -> SearchResult {
    SearchResult {
        total: 1234,
        dimensions: vec![
            Dimension {
                id: "itembasetypes-Helmet".to_string(),
                dictionary_id: "bt".to_string(),
                counts: vec![DimensionCount { key: 0, count: 30 }, DimensionCount { key: 1, count: 70 }],
            },
            Dimension {
                id: "secondascendancy".to_string(),
                dictionary_id: "asc".to_string(),
                counts: vec![DimensionCount { key: 2, count: 100 }],
            },
        ],
        value_lists: vec![ValueList {
            id: "levels".to_string(),
            values: vec![Value { numbers: vec![90, 91, 300], boolean: Some(true), ..Value::default() }],
        }],
        dictionary_refs: vec![DictionaryRef { id: "bt".to_string(), hash: "h-bt".to_string() }],
    }
}

#[test]
fn decodes_encoded_envelope() {
    let expected = sample();
    let decoded = WireDecoder::default().decode(&encode_envelope(&expected)).expect("decode");
    assert_eq!(decoded, expected);
}

#[test]
fn decode_is_idempotent() {
    let bytes = encode_envelope(&sample());
    let decoder = WireDecoder::default();
    assert_eq!(decoder.decode(&bytes).expect("first"), decoder.decode(&bytes).expect("second"));
}

#[test]
fn envelope_without_result_is_rejected() {
    let mut w = WireWriter::new();
    w.uint_field(9, 1);
    assert_eq!(WireDecoder::default().decode(&w.into_bytes()), Err(DecodeError::MissingField("result")));
}

#[test]
fn unknown_fields_of_every_wire_type_are_skipped() {
    let mut w = WireWriter::new();
    w.message_field(1, |m| {
        m.uint_field(40, 7)
            .fixed64_field(41, u64::MAX)
            .string_field(42, "ignored")
            .fixed32_field(43, 5)
            .uint_field(1, 42);
    });
    let decoded = WireDecoder::default().decode(&w.into_bytes()).expect("decode");
    assert_eq!(decoded.total, 42);
}

#[test]
fn unsupported_wire_type_fails() {
    // field 3, wire type 3 (start group)
    let mut w = WireWriter::new();
    w.message_field(1, |m| {
        m.varint((3 << 3) | 3);
    });
    let err = WireDecoder::default().decode(&w.into_bytes()).expect_err("group marker");
    assert!(matches!(err, DecodeError::UnsupportedWireType { wire_type: 3, .. }));
}

#[test]
fn known_field_with_wrong_wire_type_is_skipped() {
    let mut w = WireWriter::new();
    // id encoded as a varint instead of a string
    w.uint_field(1, 5).string_field(2, "dict");
    let dim = decode_dimension(&w.into_bytes()).expect("decode");
    assert_eq!(dim.id, "");
    assert_eq!(dim.dictionary_id, "dict");
}

#[test]
fn truncated_embedded_message_fails() {
    let mut bytes = encode_envelope(&sample());
    bytes.truncate(bytes.len() - 3);
    let err = WireDecoder::default().decode(&bytes).expect_err("truncated");
    assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
}

#[test]
fn oversized_message_rejected() {
    let bytes = encode_envelope(&sample());
    let err = WireDecoder::new(4).decode(&bytes).expect_err("too large");
    assert_eq!(err, DecodeError::MessageTooLarge { len: bytes.len(), max: 4 });
}

#[test]
fn invalid_utf8_reported() {
    let mut w = WireWriter::new();
    w.bytes_field(1, &[0xFF, 0xFE]);
    assert!(matches!(decode_dimension(&w.into_bytes()), Err(DecodeError::InvalidUtf8 { .. })));
}

#[test]
fn numbers_accept_packed_and_unpacked() {
    let mut w = WireWriter::new();
    w.uint_field(3, 1).packed_field(3, &[2, 300]).uint_field(3, 4);
    let value = decode_value(&w.into_bytes()).expect("decode");
    assert_eq!(value.numbers, vec![1, 2, 300, 4]);
}

#[test]
fn dictionary_decodes_values_and_properties() {
    let dict = Dictionary {
        id: "bt".to_string(),
        values: vec!["Leather Cap".to_string(), "Chestplate".to_string()],
        properties: vec![DictionaryProperty { id: "tier".to_string(), values: vec!["1".to_string(), "2".to_string()] }],
        ..Dictionary::default()
    };
    let decoded = WireDecoder::default().decode_dictionary(&encode_dictionary(&dict)).expect("decode");
    assert_eq!(decoded, dict);
}

#[test]
fn bare_search_result_needs_envelope() {
    // A bare result starts with field 1 as a varint, which the envelope skips.
    let bytes = encode_search_result(&sample());
    assert_eq!(WireDecoder::default().decode(&bytes), Err(DecodeError::MissingField("result")));
}
