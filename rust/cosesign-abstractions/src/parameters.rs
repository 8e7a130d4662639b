// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE header parameter types.
//!
//! A message carries header parameters in two buckets per location:
//! - protected: a CBOR map wrapped in a bstr, covered by the signature
//! - unprotected: an inline CBOR map, not covered by the signature
//!
//! Locations are the message body and each COSE_Signature of a COSE_Sign.
//! [`HeaderParameters`] keeps parameters in the order they were decoded or added,
//! which is also the order they are encoded in.

use std::collections::BTreeMap;
use std::fmt;

/// `alg`: algorithm identifier.
pub const LABEL_ALG: i64 = 1;
/// `crit`: labels the recipient must understand.
pub const LABEL_CRIT: i64 = 2;
/// `content type`.
pub const LABEL_CONTENT_TYPE: i64 = 3;
/// `kid`: key identifier.
pub const LABEL_KID: i64 = 4;
/// `IV`.
pub const LABEL_IV: i64 = 5;
/// `Partial IV`.
pub const LABEL_PARTIAL_IV: i64 = 6;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderLabel {
    /// Integer label (the most common COSE header key form).
    Int(i64),
    /// Text label.
    Text(String),
}

impl HeaderLabel {
    /// Labels with built-in decode rules. These may always be marked critical.
    pub fn is_standard(&self) -> bool {
        matches!(self, HeaderLabel::Int(LABEL_ALG..=LABEL_PARTIAL_IV))
    }
}

impl fmt::Display for HeaderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderLabel::Int(i) => write!(f, "{i}"),
            HeaderLabel::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<i64> for HeaderLabel {
    fn from(value: i64) -> Self {
        HeaderLabel::Int(value)
    }
}

impl From<&str> for HeaderLabel {
    fn from(value: &str) -> Self {
        HeaderLabel::Text(value.to_string())
    }
}

impl From<String> for HeaderLabel {
    fn from(value: String) -> Self {
        HeaderLabel::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<HeaderValue>),
    Map(BTreeMap<HeaderLabel, HeaderValue>),
    Bool(bool),
    Null,
}

impl HeaderValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HeaderValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HeaderValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for HeaderValue {
    fn from(value: i64) -> Self {
        HeaderValue::Int(value)
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(value: Vec<u8>) -> Self {
        HeaderValue::Bytes(value)
    }
}

impl From<&[u8]> for HeaderValue {
    fn from(value: &[u8]) -> Self {
        HeaderValue::Bytes(value.to_vec())
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

impl From<bool> for HeaderValue {
    fn from(value: bool) -> Self {
        HeaderValue::Bool(value)
    }
}

/// Where a parameter sits in the message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeaderLocation {
    /// The headers of the COSE_Sign1 / COSE_Sign body.
    #[default]
    Body,
    /// The headers of the n-th COSE_Signature of a COSE_Sign.
    Signature(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderParameter {
    pub label: HeaderLabel,
    pub value: HeaderValue,
    pub protected: bool,
    /// Listed in the `crit` parameter of the protected bucket.
    pub critical: bool,
    pub location: HeaderLocation,
}

impl HeaderParameter {
    /// An unprotected, non-critical body parameter.
    pub fn new(label: impl Into<HeaderLabel>, value: impl Into<HeaderValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            protected: false,
            critical: false,
            location: HeaderLocation::Body,
        }
    }

    /// Protected `alg` parameter.
    pub fn alg_id(alg: i64) -> Self {
        Self::new(LABEL_ALG, alg).protected()
    }

    /// Unprotected `kid` parameter.
    pub fn kid(kid: impl Into<Vec<u8>>) -> Self {
        Self::new(LABEL_KID, HeaderValue::Bytes(kid.into()))
    }

    /// Protected `content type` given as a CoAP content format number.
    pub fn content_type_uint(content_format: u16) -> Self {
        Self::new(LABEL_CONTENT_TYPE, i64::from(content_format)).protected()
    }

    /// Protected `content type` given as a media type string.
    pub fn content_type_text(media_type: &str) -> Self {
        Self::new(LABEL_CONTENT_TYPE, media_type).protected()
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn unprotected(mut self) -> Self {
        self.protected = false;
        self
    }

    /// Mark critical. Critical parameters must be protected.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self.protected = true;
        self
    }

    pub fn at(mut self, location: HeaderLocation) -> Self {
        self.location = location;
        self
    }
}

/// An ordered collection of header parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderParameters(Vec<HeaderParameter>);

impl HeaderParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, parameter: HeaderParameter) {
        self.0.push(parameter);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeaderParameter> {
        self.0.iter()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// First parameter with `label`, in either bucket.
    pub fn get(&self, label: &HeaderLabel) -> Option<&HeaderParameter> {
        self.0.iter().find(|p| &p.label == label)
    }

    pub fn get_int(&self, label: i64) -> Option<&HeaderParameter> {
        self.0.iter().find(|p| p.label == HeaderLabel::Int(label))
    }

    /// The `alg` value, if present and an integer.
    pub fn find_alg_id(&self) -> Option<i64> {
        self.get_int(LABEL_ALG).and_then(|p| p.value.as_i64())
    }

    /// The `kid` value, if present and a byte string.
    pub fn find_kid(&self) -> Option<&[u8]> {
        self.get_int(LABEL_KID).and_then(|p| p.value.as_bytes())
    }

    pub fn find_content_type(&self) -> Option<&HeaderValue> {
        self.get_int(LABEL_CONTENT_TYPE).map(|p| &p.value)
    }

    pub fn as_slice(&self) -> &[HeaderParameter] {
        &self.0
    }
}

impl Extend<HeaderParameter> for HeaderParameters {
    fn extend<T: IntoIterator<Item = HeaderParameter>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<HeaderParameter> for HeaderParameters {
    fn from_iter<T: IntoIterator<Item = HeaderParameter>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for HeaderParameters {
    type Item = HeaderParameter;
    type IntoIter = std::vec::IntoIter<HeaderParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a HeaderParameters {
    type Item = &'a HeaderParameter;
    type IntoIter = std::slice::Iter<'a, HeaderParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
