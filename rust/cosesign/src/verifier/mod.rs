// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verifier variants.
//!
//! A verifier first applies its algorithm gate: a signature whose algorithm the
//! verifier does not handle is rejected with `UnsupportedSigningAlg`, which lets
//! the COSE_Sign orchestrator move on to the next verifier. Then it checks the
//! key ID, stops if `decode_only` is set, and finally checks the signature.

mod eddsa;
mod main;
#[cfg(feature = "short-circuit")]
mod short_circuit;

pub use eddsa::EddsaVerifier;
pub use main::MainVerifier;
#[cfg(feature = "short-circuit")]
pub use short_circuit::ShortCircuitVerifier;

use cosesign_abstractions::{CoseError, CoseOptions, HeaderLabel, HeaderLocation, HeaderParameters};
use cosesign_common::{decode_headers, DecodedHeaders};
use minicbor::data::Type;
use minicbor::Decoder;

pub trait CoseVerifier {
    /// Verify one signature.
    ///
    /// `protected_signature_headers` is `None` for COSE_Sign1. `parameters` are
    /// the parameters of the location the signature belongs to (the body for
    /// COSE_Sign1, the `COSE_Signature` for COSE_Sign).
    #[allow(clippy::too_many_arguments)]
    fn verify1(
        &self,
        options: &CoseOptions,
        protected_body_headers: &[u8],
        protected_signature_headers: Option<&[u8]>,
        payload: &[u8],
        aad: &[u8],
        parameters: &HeaderParameters,
        signature: &[u8],
    ) -> Result<(), CoseError>;

    /// Decode one `COSE_Signature` at the decoder's position and verify it.
    ///
    /// Decoded parameters are appended to `out_parameters` even when
    /// verification then fails.
    #[allow(clippy::too_many_arguments)]
    fn verify(
        &self,
        options: &CoseOptions,
        location: HeaderLocation,
        protected_body_headers: &[u8],
        payload: &[u8],
        aad: &[u8],
        understood: &[HeaderLabel],
        decoder: &mut Decoder<'_>,
        out_parameters: &mut HeaderParameters,
    ) -> Result<(), CoseError> {
        let decoded = decode_signature(decoder, location, understood)?;
        out_parameters.extend(decoded.headers.parameters.iter().cloned());
        self.verify1(
            options,
            protected_body_headers,
            Some(decoded.headers.protected_bytes),
            payload,
            aad,
            &decoded.headers.parameters,
            decoded.signature,
        )
    }
}

/// One decoded `COSE_Signature`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSignature<'m> {
    pub headers: DecodedHeaders<'m>,
    pub signature: &'m [u8],
}

/// Decode `[protected, unprotected, signature]` at the decoder's position.
pub fn decode_signature<'m>(
    decoder: &mut Decoder<'m>,
    location: HeaderLocation,
    understood: &[HeaderLabel],
) -> Result<DecodedSignature<'m>, CoseError> {
    match decoder.array() {
        Ok(Some(3)) => {}
        Ok(_) => return Err(CoseError::SignatureFormat("COSE_Signature must be an array(3)".to_string())),
        Err(e) => return Err(CoseError::SignatureFormat(format!("expected COSE_Signature array: {e}"))),
    }
    let headers = decode_headers(decoder, location, understood)?;

    if decoder.datatype().map_err(|e| CoseError::CborNotWellFormed(e.to_string()))? != Type::Bytes {
        return Err(CoseError::SignatureFormat("signature must be a byte string".to_string()));
    }
    let signature = decoder.bytes().map_err(|e| CoseError::CborNotWellFormed(e.to_string()))?;
    Ok(DecodedSignature { headers, signature })
}

/// `KidUnmatched` when the verifier is bound to a kid and the message names a different one.
pub(crate) fn check_kid(expected: Option<&[u8]>, parameters: &HeaderParameters) -> Result<(), CoseError> {
    match (expected, parameters.find_kid()) {
        (Some(expected), Some(actual)) if expected != actual => Err(CoseError::KidUnmatched),
        _ => Ok(()),
    }
}
