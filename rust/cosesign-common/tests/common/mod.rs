// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for `cosesign-common` integration tests.
//!
//! Header buckets are built by hand from [`TestCborValue`] so tests control the
//! exact bytes fed to the decoder, including shapes the encoder never produces.

#![allow(dead_code)]

use minicbor::Encoder;

/// Minimal CBOR value model for building test inputs.
#[derive(Clone, Debug)]
pub enum TestCborValue {
    Int(i64),
    Bytes(&'static [u8]),
    Text(&'static str),
    IntArray(&'static [i64]),
    /// Pre-encoded CBOR, written verbatim.
    Raw(Vec<u8>),
}

pub use TestCborValue::*;

pub fn encode_value(e: &mut Encoder<Vec<u8>>, v: &TestCborValue) {
    match v {
        Int(i) => {
            e.i64(*i).unwrap();
        }
        Bytes(b) => {
            e.bytes(b).unwrap();
        }
        Text(s) => {
            e.str(s).unwrap();
        }
        IntArray(items) => {
            e.array(items.len() as u64).unwrap();
            for i in items.iter() {
                e.i64(*i).unwrap();
            }
        }
        Raw(bytes) => e.writer_mut().extend_from_slice(bytes),
    }
}

/// Encode a definite-length map from `(label, value)` pairs.
pub fn map_bytes(entries: &[(TestCborValue, TestCborValue)]) -> Vec<u8> {
    let mut e = Encoder::new(Vec::new());
    e.map(entries.len() as u64).unwrap();
    for (k, v) in entries {
        encode_value(&mut e, k);
        encode_value(&mut e, v);
    }
    e.into_writer()
}

/// `bstr(protected) || unprotected-map`, as the two buckets appear in a message.
pub fn buckets(protected: &[u8], unprotected: &[(TestCborValue, TestCborValue)]) -> Vec<u8> {
    let mut e = Encoder::new(Vec::new());
    e.bytes(protected).unwrap();
    let mut out = e.into_writer();
    out.extend(map_bytes(unprotected));
    out
}

/// Encode a single item with a closure and return its bytes.
pub fn raw(f: impl FnOnce(&mut Encoder<Vec<u8>>)) -> TestCborValue {
    let mut e = Encoder::new(Vec::new());
    f(&mut e);
    Raw(e.into_writer())
}
