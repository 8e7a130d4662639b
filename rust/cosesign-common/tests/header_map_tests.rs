// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for header parameter decode/encode.
//!
//! Each test builds the two header buckets by hand and runs them through
//! `decode_headers`, so the checks cover the exact wire shapes.

mod common;

use common::*;
use cosesign_abstractions::{
    CoseError, ErrorKind, HeaderLabel, HeaderLocation, HeaderParameter, HeaderValue, LABEL_ALG, LABEL_CRIT,
};
use cosesign_common::{decode_headers, encode_headers, CoseEncoder, DecodedHeaders, MAX_HEADER_NESTING};
use minicbor::data::Tag;
use minicbor::{Decoder, Encoder};

fn decode<'m>(bytes: &'m [u8], understood: &[HeaderLabel]) -> Result<DecodedHeaders<'m>, CoseError> {
    let mut dec = Decoder::new(bytes);
    decode_headers(&mut dec, HeaderLocation::Body, understood)
}

fn decode_err(protected: &[u8], unprotected: &[(TestCborValue, TestCborValue)]) -> CoseError {
    let msg = buckets(protected, unprotected);
    let err = decode(&msg, &[]).unwrap_err();
    err
}

/// Decodes standard parameters and keeps the protected bytes verbatim.
#[test]
fn decodes_parameters_and_raw_protected_bytes() {
    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(3), Text("application/cbor"))]);
    let msg = buckets(&protected, &[(Int(4), Bytes(b"key-1"))]);

    let decoded = decode(&msg, &[]).unwrap();
    assert_eq!(decoded.protected_bytes, protected.as_slice());
    assert_eq!(decoded.parameters.find_alg_id(), Some(-7));
    assert_eq!(decoded.parameters.find_kid(), Some(&b"key-1"[..]));
    assert_eq!(
        decoded.parameters.find_content_type(),
        Some(&HeaderValue::Text("application/cbor".to_string()))
    );

    let kid = decoded.parameters.get_int(4).unwrap();
    assert!(!kid.protected);
    assert_eq!(kid.location, HeaderLocation::Body);
}

/// A zero-length protected bstr decodes as an empty bucket.
#[test]
fn empty_protected_bstr_is_empty_bucket() {
    let msg = buckets(&[], &[]);
    let decoded = decode(&msg, &[]).unwrap();
    assert!(decoded.parameters.is_empty());
    assert!(decoded.protected_bytes.is_empty());
}

/// Decoded parameters carry the location they were decoded for.
#[test]
fn signature_location_is_recorded() {
    let protected = map_bytes(&[(Int(1), Int(-8))]);
    let msg = buckets(&protected, &[]);
    let mut dec = Decoder::new(&msg);
    let decoded = decode_headers(&mut dec, HeaderLocation::Signature(2), &[]).unwrap();
    assert_eq!(decoded.parameters.get_int(LABEL_ALG).unwrap().location, HeaderLocation::Signature(2));
    assert_eq!(dec.position(), msg.len());
}

/// `crit` naming a label that is absent from the protected bucket fails.
#[test]
fn crit_naming_absent_label_fails() {
    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(2), IntArray(&[-70000]))]);
    let err = decode_err(&protected, &[]);
    assert!(matches!(err, CoseError::CritHeaderParam(_)), "{err:?}");
    assert_eq!(err.kind(), ErrorKind::Header);
}

/// `crit` naming a label the caller does not understand fails.
#[test]
fn crit_naming_unknown_label_fails() {
    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(-70000), Int(1)), (Int(2), IntArray(&[-70000]))]);
    let msg = buckets(&protected, &[]);
    assert_eq!(decode(&msg, &[]).unwrap_err(), CoseError::UnknownCriticalHeader(HeaderLabel::Int(-70000)));

    let decoded = decode(&msg, &[HeaderLabel::Int(-70000)]).unwrap();
    assert!(decoded.parameters.get_int(-70000).unwrap().critical);
    assert!(!decoded.parameters.get_int(LABEL_ALG).unwrap().critical);
}

/// Standard labels may be critical without registration.
#[test]
fn crit_naming_standard_label_is_accepted() {
    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(3), Int(60)), (Int(2), IntArray(&[1, 3]))]);
    let msg = buckets(&protected, &[]);
    let decoded = decode(&msg, &[]).unwrap();
    assert!(decoded.parameters.iter().all(|p| p.critical));
    assert!(decoded.parameters.get_int(LABEL_CRIT).is_none());
}

/// A critical label that only appears unprotected does not satisfy `crit`.
#[test]
fn crit_label_present_only_unprotected_fails() {
    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(2), IntArray(&[4]))]);
    let err = decode_err(&protected, &[(Int(4), Bytes(b"k"))]);
    assert!(matches!(err, CoseError::CritHeaderParam(_)), "{err:?}");
}

/// `crit` must be protected, non-empty, unique and hold only int/text labels.
#[test]
fn malformed_crit_fails() {
    let empty = map_bytes(&[(Int(1), Int(-7)), (Int(2), IntArray(&[]))]);
    assert!(matches!(decode_err(&empty, &[]), CoseError::CritHeaderParam(_)));

    let not_array = map_bytes(&[(Int(1), Int(-7)), (Int(2), Int(1))]);
    assert!(matches!(decode_err(&not_array, &[]), CoseError::CritHeaderParam(_)));

    let bstr_label = raw(|e| {
        e.array(1).unwrap().bytes(b"x").unwrap();
    });
    let bad_label = map_bytes(&[(Int(1), Int(-7)), (Int(2), bstr_label)]);
    assert!(matches!(decode_err(&bad_label, &[]), CoseError::CritHeaderParam(_)));

    let twice = map_bytes(&[(Int(1), Int(-7)), (Int(2), IntArray(&[1, 1]))]);
    assert!(matches!(decode_err(&twice, &[]), CoseError::CritHeaderParam(_)));

    let protected = map_bytes(&[(Int(1), Int(-7))]);
    assert_eq!(
        decode_err(&protected, &[(Int(2), IntArray(&[1]))]),
        CoseError::HeaderNotProtected(HeaderLabel::Int(LABEL_CRIT))
    );
}

/// The same label twice in one location fails, in one bucket or across both.
#[test]
fn duplicate_labels_fail() {
    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(1), Int(-7))]);
    assert_eq!(decode_err(&protected, &[]), CoseError::DuplicateHeader(HeaderLabel::Int(1)));

    let protected = map_bytes(&[(Int(1), Int(-7)), (Int(4), Bytes(b"a"))]);
    assert_eq!(decode_err(&protected, &[(Int(4), Bytes(b"b"))]), CoseError::DuplicateHeader(HeaderLabel::Int(4)));

    assert_eq!(
        decode_err(&[], &[(Text("x"), Int(1)), (Text("x"), Int(2))]),
        CoseError::DuplicateHeader(HeaderLabel::Text("x".into()))
    );
}

/// `alg` must be protected and a non-zero 32-bit integer.
#[test]
fn alg_placement_and_type_are_enforced() {
    assert_eq!(decode_err(&[], &[(Int(1), Int(-7))]), CoseError::HeaderNotProtected(HeaderLabel::Int(1)));

    for bad in [Text("ES256"), Int(0), Int(1 << 40)] {
        let protected = map_bytes(&[(Int(1), bad)]);
        assert_eq!(decode_err(&protected, &[]), CoseError::NonIntegerAlgId);
    }
}

/// Standard byte-string parameters and content type are type checked.
#[test]
fn standard_parameter_types_are_enforced() {
    for label in [4, 5, 6] {
        assert_eq!(decode_err(&[], &[(Int(label), Text("nope"))]).kind(), ErrorKind::Header);
    }

    let too_big = map_bytes(&[(Int(3), Int(70000))]);
    assert_eq!(decode_err(&too_big, &[]), CoseError::BadContentType);

    let negative = map_bytes(&[(Int(3), Int(-1))]);
    assert_eq!(decode_err(&negative, &[]), CoseError::BadContentType);

    let ok = map_bytes(&[(Int(3), Int(60))]);
    let msg = buckets(&ok, &[]);
    let decoded = decode(&msg, &[]).unwrap();
    assert_eq!(decoded.parameters.find_content_type(), Some(&HeaderValue::Int(60)));
}

/// Tags, floats, byte-string labels and indefinite-length items are rejected.
#[test]
fn rejects_unsupported_cbor_items() {
    let tagged = raw(|e| {
        e.tag(Tag::new(1)).unwrap().i64(0).unwrap();
    });
    let protected = map_bytes(&[(Int(-1), tagged)]);
    let err = decode_err(&protected, &[]);
    assert!(err.to_string().contains("unsupported header value type"), "{err}");

    let float = raw(|e| {
        e.f64(1.5).unwrap();
    });
    assert_eq!(decode_err(&[], &[(Int(-1), float)]).kind(), ErrorKind::Header);

    let err = decode_err(&[], &[(Bytes(b"k"), Int(1))]);
    assert!(err.to_string().contains("unsupported header label type"), "{err}");

    let mut indefinite = Encoder::new(Vec::new());
    indefinite.bytes(&[]).unwrap().begin_map().unwrap().end().unwrap();
    assert_eq!(decode(indefinite.writer(), &[]).unwrap_err().kind(), ErrorKind::Header);
}

/// `depth` nested single-element arrays around a zero.
fn nested_arrays(depth: usize) -> TestCborValue {
    let mut bytes = vec![0x81; depth];
    bytes.push(0x00);
    Raw(bytes)
}

/// Header values nest up to a fixed depth; deeper input is a header error, not a crash.
#[test]
fn deeply_nested_values_are_bounded() {
    let protected = map_bytes(&[(Int(1), Int(-7))]);

    let msg = buckets(&protected, &[(Int(-65537), nested_arrays(MAX_HEADER_NESTING))]);
    assert!(decode(&msg, &[]).is_ok());

    for depth in [MAX_HEADER_NESTING + 1, 1_000_000] {
        let err = decode_err(&protected, &[(Int(-65537), nested_arrays(depth))]);
        assert_eq!(err, CoseError::HeaderCbor("header value nested too deeply".to_string()));
        assert_eq!(err.kind(), ErrorKind::Header);
    }

    let mut nested_maps = [0xa1, 0x01].repeat(100_000);
    nested_maps.push(0x00);
    let err = decode_err(&protected, &[(Int(-65537), Raw(nested_maps))]);
    assert_eq!(err.kind(), ErrorKind::Header);

    // The protected bucket is bounded the same way.
    let deep_protected = map_bytes(&[(Int(1), Int(-7)), (Int(-65537), nested_arrays(100_000))]);
    assert_eq!(decode_err(&deep_protected, &[]).kind(), ErrorKind::Header);
}

/// Trailing bytes inside the protected bstr are rejected.
#[test]
fn trailing_bytes_in_protected_bucket_fail() {
    let mut protected = map_bytes(&[(Int(1), Int(-7))]);
    protected.push(0x00);
    let err = decode_err(&protected, &[]);
    assert!(err.to_string().contains("trailing bytes"), "{err}");
}

/// Nested arrays and maps survive a decode/encode cycle byte for byte.
#[test]
fn encode_reproduces_decoded_buckets() {
    let nested = raw(|e| {
        e.map(2).unwrap().i64(1).unwrap().bool(true).unwrap().str("k").unwrap().null().unwrap();
    });
    let protected = map_bytes(&[(Int(1), Int(-35)), (Text("nested"), nested)]);
    let msg = buckets(&protected, &[(Int(4), Bytes(b"kid")), (Int(-9), IntArray(&[1, 2, 3]))]);
    let decoded = decode(&msg, &[]).unwrap();

    let mut out = vec![0u8; msg.len()];
    let mut enc = CoseEncoder::writing(&mut out);
    let written_protected = encode_headers(&mut enc, decoded.parameters.iter()).unwrap();
    assert_eq!(enc.finish(), msg.len());
    assert_eq!(written_protected, protected);
    assert_eq!(out, msg);
}

/// Critical parameters produce a `crit` list the decoder accepts.
#[test]
fn encoded_crit_is_accepted_by_decoder() {
    let params = [
        HeaderParameter::alg_id(-7),
        HeaderParameter::new("ext", "v").critical(),
        HeaderParameter::kid(b"k".to_vec()),
    ];
    let mut sizer = CoseEncoder::sizing();
    encode_headers(&mut sizer, params.iter()).unwrap();
    let mut out = vec![0u8; sizer.finish()];
    let mut enc = CoseEncoder::writing(&mut out);
    encode_headers(&mut enc, params.iter()).unwrap();

    let understood = [HeaderLabel::from("ext")];
    let decoded = decode(&out, &understood).unwrap();
    assert!(decoded.parameters.get(&"ext".into()).unwrap().critical);
    assert_eq!(decoded.parameters.len(), 3);
}

/// Encoding rejects duplicates, unprotected critical parameters and a hand-built `crit`.
#[test]
fn encode_validates_parameters() {
    let mut enc = CoseEncoder::sizing();
    let dup = [HeaderParameter::kid(b"a".to_vec()), HeaderParameter::kid(b"b".to_vec())];
    assert_eq!(encode_headers(&mut enc, dup.iter()), Err(CoseError::DuplicateHeader(HeaderLabel::Int(4))));

    let unprotected_critical = [HeaderParameter::new(-5i64, 1i64).critical().unprotected()];
    assert_eq!(
        encode_headers(&mut enc, unprotected_critical.iter()),
        Err(CoseError::HeaderNotProtected(HeaderLabel::Int(-5)))
    );

    let explicit_crit = [HeaderParameter::new(LABEL_CRIT, HeaderValue::Array(vec![])).protected()];
    assert!(matches!(encode_headers(&mut enc, explicit_crit.iter()), Err(CoseError::CritHeaderParam(_))));
}
