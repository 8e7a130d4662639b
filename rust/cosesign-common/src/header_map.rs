// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Header parameter store: decode and encode of the protected/unprotected buckets.
//!
//! The protected bucket is a CBOR map wrapped in a bstr. The raw bstr content is
//! kept as-is for the Sig_structure and is never re-encoded on the verify side.
//!
//! Decoding is strict:
//! - rejects indefinite-length arrays/maps, tags and floats
//! - rejects duplicate labels within a location, across both buckets
//! - enforces the `crit` list (protected, non-empty, present, understood)
//! - enforces placement and value types of the standard labels

use std::collections::BTreeMap;

use cosesign_abstractions::{
    CoseError, HeaderLabel, HeaderLocation, HeaderParameter, HeaderParameters, HeaderValue, LABEL_ALG,
    LABEL_CONTENT_TYPE, LABEL_CRIT, LABEL_IV, LABEL_KID, LABEL_PARTIAL_IV,
};
use minicbor::data::Type;
use minicbor::encode::Write;
use minicbor::{Decoder, Encoder};

use crate::encoder::CoseEncoder;

/// Deepest array/map nesting accepted inside one header value.
pub const MAX_HEADER_NESTING: usize = 16;

/// Headers of one location, as decoded from a message.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHeaders<'m> {
    pub parameters: HeaderParameters,
    /// Content of the protected bstr, exactly as it appeared on the wire.
    pub protected_bytes: &'m [u8],
}

/// Decode the protected bstr and the unprotected map at the decoder's position.
///
/// `understood` lists non-standard labels the caller processes; only those (and
/// the standard labels) may appear in `crit`.
pub fn decode_headers<'m>(
    dec: &mut Decoder<'m>,
    location: HeaderLocation,
    understood: &[HeaderLabel],
) -> Result<DecodedHeaders<'m>, CoseError> {
    if dec.datatype().map_err(cbor_err)? != Type::Bytes {
        return Err(CoseError::HeaderCbor("protected headers must be a byte string".to_string()));
    }
    let protected_bytes = dec.bytes().map_err(cbor_err)?;

    let mut entries = Vec::new();
    if !protected_bytes.is_empty() {
        let mut pdec = Decoder::new(protected_bytes);
        read_map_entries(&mut pdec, true, &mut entries)?;
        if pdec.position() != protected_bytes.len() {
            return Err(CoseError::HeaderCbor("trailing bytes after protected header map".to_string()));
        }
    }

    if dec.datatype().map_err(cbor_err)? != Type::Map {
        return Err(CoseError::HeaderCbor("unprotected headers must be a map".to_string()));
    }
    read_map_entries(dec, false, &mut entries)?;

    let mut parameters = HeaderParameters::new();
    let mut crit: Option<Vec<HeaderLabel>> = None;
    let mut seen: Vec<HeaderLabel> = Vec::with_capacity(entries.len());

    for (label, value, protected) in entries {
        if seen.contains(&label) {
            return Err(CoseError::DuplicateHeader(label));
        }
        seen.push(label.clone());

        if label == HeaderLabel::Int(LABEL_CRIT) {
            if !protected {
                return Err(CoseError::HeaderNotProtected(label));
            }
            crit = Some(decode_crit_list(value)?);
            continue;
        }

        check_standard_parameter(&label, &value, protected)?;
        parameters.push(HeaderParameter { label, value, protected, critical: false, location });
    }

    if let Some(crit) = crit {
        apply_crit_list(&mut parameters, &crit, understood)?;
    }

    Ok(DecodedHeaders { parameters, protected_bytes })
}

/// Encode both buckets: the protected bstr followed by the unprotected map.
///
/// Parameters are emitted in the order given; a `crit` entry listing every
/// critical parameter is appended to the protected map. Returns the protected
/// bstr content, which is what goes into the Sig_structure.
pub fn encode_headers<'p>(
    enc: &mut CoseEncoder<'_>,
    parameters: impl IntoIterator<Item = &'p HeaderParameter>,
) -> Result<Vec<u8>, CoseError> {
    let parameters: Vec<&HeaderParameter> = parameters.into_iter().collect();
    let protected = encode_protected_headers(parameters.iter().copied())?;
    enc.bytes(&protected)?;

    let unprotected: Vec<&HeaderParameter> = parameters.iter().copied().filter(|p| !p.protected).collect();
    enc.map(unprotected.len() as u64)?;
    for p in unprotected {
        let result = encode_entry(enc.inner_mut(), &p.label, &p.value);
        if let Err(e) = result {
            return Err(enc.map_encode_error(e));
        }
    }

    Ok(protected)
}

/// Encode only the protected bucket, returning the bstr content.
///
/// An empty bucket encodes as a zero-length bstr, not as an empty map.
pub fn encode_protected_headers<'p>(
    parameters: impl IntoIterator<Item = &'p HeaderParameter>,
) -> Result<Vec<u8>, CoseError> {
    let parameters: Vec<&HeaderParameter> = parameters.into_iter().collect();
    check_encodable(&parameters)?;

    let protected: Vec<&HeaderParameter> = parameters.iter().copied().filter(|p| p.protected).collect();
    if protected.is_empty() {
        return Ok(Vec::new());
    }
    let critical: Vec<&HeaderLabel> = protected.iter().filter(|p| p.critical).map(|p| &p.label).collect();

    let mut e = Encoder::new(Vec::new());
    let entries = protected.len() + usize::from(!critical.is_empty());
    e.map(entries as u64).map_err(vec_err)?;
    for p in &protected {
        encode_entry(&mut e, &p.label, &p.value).map_err(vec_err)?;
    }
    if !critical.is_empty() {
        e.i64(LABEL_CRIT).map_err(vec_err)?;
        e.array(critical.len() as u64).map_err(vec_err)?;
        for label in critical {
            encode_label(&mut e, label).map_err(vec_err)?;
        }
    }
    Ok(e.into_writer())
}

fn check_encodable(parameters: &[&HeaderParameter]) -> Result<(), CoseError> {
    for (i, p) in parameters.iter().enumerate() {
        if parameters[..i].iter().any(|q| q.label == p.label) {
            return Err(CoseError::DuplicateHeader(p.label.clone()));
        }
        if p.label == HeaderLabel::Int(LABEL_CRIT) {
            return Err(CoseError::CritHeaderParam(
                "crit is generated from the critical flag and cannot be added directly".to_string(),
            ));
        }
        if !p.protected && (p.critical || p.label == HeaderLabel::Int(LABEL_ALG)) {
            return Err(CoseError::HeaderNotProtected(p.label.clone()));
        }
    }
    Ok(())
}

fn check_standard_parameter(label: &HeaderLabel, value: &HeaderValue, protected: bool) -> Result<(), CoseError> {
    let HeaderLabel::Int(id) = label else {
        return Ok(());
    };
    match *id {
        LABEL_ALG => {
            match value {
                HeaderValue::Int(alg) if *alg != 0 && i32::try_from(*alg).is_ok() => {}
                _ => return Err(CoseError::NonIntegerAlgId),
            }
            if !protected {
                return Err(CoseError::HeaderNotProtected(label.clone()));
            }
        }
        LABEL_KID | LABEL_IV | LABEL_PARTIAL_IV => {
            if !matches!(value, HeaderValue::Bytes(_)) {
                return Err(CoseError::HeaderCbor(format!("header parameter {label} must be a byte string")));
            }
        }
        LABEL_CONTENT_TYPE => match value {
            HeaderValue::Text(_) => {}
            HeaderValue::Int(ct) if u16::try_from(*ct).is_ok() => {}
            _ => return Err(CoseError::BadContentType),
        },
        _ => {}
    }
    Ok(())
}

fn decode_crit_list(value: HeaderValue) -> Result<Vec<HeaderLabel>, CoseError> {
    let HeaderValue::Array(items) = value else {
        return Err(CoseError::CritHeaderParam("crit must be an array".to_string()));
    };
    if items.is_empty() {
        return Err(CoseError::CritHeaderParam("crit must not be empty".to_string()));
    }

    let mut labels = Vec::with_capacity(items.len());
    for item in items {
        let label = match item {
            HeaderValue::Int(i) => HeaderLabel::Int(i),
            HeaderValue::Text(s) => HeaderLabel::Text(s),
            other => return Err(CoseError::CritHeaderParam(format!("unsupported crit label: {other:?}"))),
        };
        if labels.contains(&label) {
            return Err(CoseError::CritHeaderParam(format!("label {label} listed twice")));
        }
        labels.push(label);
    }
    Ok(labels)
}

fn apply_crit_list(
    parameters: &mut HeaderParameters,
    crit: &[HeaderLabel],
    understood: &[HeaderLabel],
) -> Result<(), CoseError> {
    for label in crit {
        let present = parameters.iter().any(|p| p.protected && &p.label == label);
        if !present {
            return Err(CoseError::CritHeaderParam(format!("label {label} is not in the protected headers")));
        }
        if !label.is_standard() && !understood.contains(label) {
            return Err(CoseError::UnknownCriticalHeader(label.clone()));
        }
    }

    *parameters = std::mem::take(parameters)
        .into_iter()
        .map(|mut p| {
            p.critical = p.protected && crit.contains(&p.label);
            p
        })
        .collect();
    Ok(())
}

fn read_map_entries(
    dec: &mut Decoder<'_>,
    protected: bool,
    out: &mut Vec<(HeaderLabel, HeaderValue, bool)>,
) -> Result<(), CoseError> {
    let len = dec
        .map()
        .map_err(|e| CoseError::HeaderCbor(format!("failed to read map: {e}")))?
        .ok_or_else(|| CoseError::HeaderCbor("indefinite-length maps are not supported".to_string()))?;

    for _ in 0..len {
        let label = decode_label(dec)?;
        let value = decode_value(dec, 0)?;
        out.push((label, value, protected));
    }
    Ok(())
}

fn decode_label(dec: &mut Decoder<'_>) -> Result<HeaderLabel, CoseError> {
    match dec.datatype().map_err(cbor_err)? {
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => {
            let i = dec
                .i64()
                .map_err(|e| CoseError::HeaderCbor(format!("failed to decode int header label: {e}")))?;
            Ok(HeaderLabel::Int(i))
        }
        Type::String => {
            let s = dec
                .str()
                .map_err(|e| CoseError::HeaderCbor(format!("failed to decode text header label: {e}")))?;
            Ok(HeaderLabel::Text(s.to_string()))
        }
        other => Err(CoseError::HeaderCbor(format!("unsupported header label type: {other:?}"))),
    }
}

fn decode_value(dec: &mut Decoder<'_>, depth: usize) -> Result<HeaderValue, CoseError> {
    let datatype = dec.datatype().map_err(cbor_err)?;
    if matches!(datatype, Type::Array | Type::Map) && depth >= MAX_HEADER_NESTING {
        return Err(CoseError::HeaderCbor("header value nested too deeply".to_string()));
    }
    match datatype {
        Type::Null => {
            dec.null().map_err(cbor_err)?;
            Ok(HeaderValue::Null)
        }
        Type::Bool => Ok(HeaderValue::Bool(dec.bool().map_err(cbor_err)?)),
        Type::Bytes => Ok(HeaderValue::Bytes(dec.bytes().map_err(cbor_err)?.to_vec())),
        Type::String => Ok(HeaderValue::Text(dec.str().map_err(cbor_err)?.to_string())),
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => {
            let i = dec
                .i64()
                .map_err(|e| CoseError::HeaderCbor(format!("integer header value out of range: {e}")))?;
            Ok(HeaderValue::Int(i))
        }
        Type::Array => {
            let len = dec
                .array()
                .map_err(cbor_err)?
                .ok_or_else(|| CoseError::HeaderCbor("indefinite-length arrays are not supported".to_string()))?;
            let mut items = Vec::with_capacity(len.min(64) as usize);
            for _ in 0..len {
                items.push(decode_value(dec, depth + 1)?);
            }
            Ok(HeaderValue::Array(items))
        }
        Type::Map => {
            let len = dec
                .map()
                .map_err(cbor_err)?
                .ok_or_else(|| CoseError::HeaderCbor("indefinite-length maps are not supported".to_string()))?;
            let mut map = BTreeMap::new();
            for _ in 0..len {
                let k = decode_label(dec)?;
                let v = decode_value(dec, depth + 1)?;
                if map.insert(k.clone(), v).is_some() {
                    return Err(CoseError::HeaderCbor(format!("duplicate key {k} in nested map")));
                }
            }
            Ok(HeaderValue::Map(map))
        }
        other => Err(CoseError::HeaderCbor(format!("unsupported header value type: {other:?}"))),
    }
}

fn encode_entry<W: Write>(
    e: &mut Encoder<W>,
    label: &HeaderLabel,
    value: &HeaderValue,
) -> Result<(), minicbor::encode::Error<W::Error>> {
    encode_label(e, label)?;
    encode_value(e, value)
}

fn encode_label<W: Write>(e: &mut Encoder<W>, label: &HeaderLabel) -> Result<(), minicbor::encode::Error<W::Error>> {
    match label {
        HeaderLabel::Int(i) => e.i64(*i)?,
        HeaderLabel::Text(s) => e.str(s)?,
    };
    Ok(())
}

fn encode_value<W: Write>(e: &mut Encoder<W>, value: &HeaderValue) -> Result<(), minicbor::encode::Error<W::Error>> {
    match value {
        HeaderValue::Int(i) => {
            e.i64(*i)?;
        }
        HeaderValue::Bytes(b) => {
            e.bytes(b)?;
        }
        HeaderValue::Text(s) => {
            e.str(s)?;
        }
        HeaderValue::Bool(b) => {
            e.bool(*b)?;
        }
        HeaderValue::Null => {
            e.null()?;
        }
        HeaderValue::Array(items) => {
            e.array(items.len() as u64)?;
            for item in items {
                encode_value(e, item)?;
            }
        }
        HeaderValue::Map(map) => {
            e.map(map.len() as u64)?;
            for (k, v) in map {
                encode_entry(e, k, v)?;
            }
        }
    }
    Ok(())
}

fn cbor_err(e: minicbor::decode::Error) -> CoseError {
    CoseError::CborNotWellFormed(e.to_string())
}

fn vec_err(e: minicbor::encode::Error<std::convert::Infallible>) -> CoseError {
    CoseError::CborNotWellFormed(e.to_string())
}
