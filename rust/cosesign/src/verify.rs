// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verify orchestrator.
//!
//! Decodes the outer array and the body headers, then hands the signature(s) to
//! the registered verifiers. For COSE_Sign each `COSE_Signature` is offered to
//! the verifiers in registration order; a verifier that does not handle the
//! algorithm passes it on, any other failure ends verification.

use cosesign_abstractions::{CoseError, CoseOptions, HeaderLabel, HeaderLocation, HeaderParameters, MessageType};
use cosesign_common::decode_headers;
use minicbor::data::Type;
use minicbor::Decoder;
use tracing::debug;

use crate::verifier::{decode_signature, CoseVerifier};

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedMessage<'m> {
    pub message_type: MessageType,
    /// The embedded payload, or the detached payload passed in.
    pub payload: &'m [u8],
    pub body_parameters: HeaderParameters,
    /// Parameters of each `COSE_Signature`, in message order. Empty for COSE_Sign1.
    pub signature_parameters: Vec<HeaderParameters>,
    /// Signatures a verifier accepted (or, in decode-only mode, checked).
    pub verified_signatures: usize,
}

/// Verification context: options, registered verifiers and understood labels.
pub struct VerifyContext<'a> {
    options: CoseOptions,
    verifiers: Vec<&'a dyn CoseVerifier>,
    understood: Vec<HeaderLabel>,
}

impl<'a> VerifyContext<'a> {
    pub fn new(options: CoseOptions) -> Self {
        Self { options, verifiers: Vec::new(), understood: Vec::new() }
    }

    pub fn add_verifier(&mut self, verifier: &'a dyn CoseVerifier) {
        self.verifiers.push(verifier);
    }

    /// Declare a non-standard header label the caller processes, so messages
    /// may list it in `crit`.
    pub fn with_understood_label(mut self, label: impl Into<HeaderLabel>) -> Self {
        let label = label.into();
        if !self.understood.contains(&label) {
            self.understood.push(label);
        }
        self
    }

    pub fn options(&self) -> &CoseOptions {
        &self.options
    }

    /// Verify a message that carries its payload.
    pub fn verify<'m>(&self, message: &'m [u8], aad: &[u8]) -> Result<VerifiedMessage<'m>, CoseError> {
        self.verify_inner(message, aad, None)
    }

    /// Verify a message whose payload is detached (`null` in the message).
    pub fn verify_detached<'m>(
        &self,
        message: &'m [u8],
        aad: &[u8],
        payload: &'m [u8],
    ) -> Result<VerifiedMessage<'m>, CoseError> {
        self.verify_inner(message, aad, Some(payload))
    }

    fn verify_inner<'m>(
        &self,
        message: &'m [u8],
        aad: &[u8],
        detached: Option<&'m [u8]>,
    ) -> Result<VerifiedMessage<'m>, CoseError> {
        let mut dec = Decoder::new(message);

        let tagged = match datatype(&dec)? {
            Type::Tag => {
                let tag = dec.tag().map_err(cbor_err)?.as_u64();
                let t = MessageType::from_cbor_tag(tag)
                    .ok_or_else(|| CoseError::MessageFormat(format!("unexpected CBOR tag {tag}")))?;
                Some(t)
            }
            _ => None,
        };
        if let (Some(expected), Some(t)) = (self.options.message_type, tagged) {
            if expected != t {
                return Err(CoseError::MessageFormat(format!("tagged as {t:?} but {expected:?} was requested")));
            }
        }

        match dec.array() {
            Ok(Some(4)) => {}
            Ok(_) => return Err(CoseError::MessageFormat("COSE message must be an array(4)".to_string())),
            Err(e) => return Err(CoseError::MessageFormat(format!("expected COSE message array: {e}"))),
        }

        let body = decode_headers(&mut dec, HeaderLocation::Body, &self.understood)?;

        let embedded = match datatype(&dec)? {
            Type::Null => {
                dec.null().map_err(cbor_err)?;
                None
            }
            Type::Bytes => Some(dec.bytes().map_err(cbor_err)?),
            other => return Err(CoseError::MessageFormat(format!("payload must be a bstr or null, got {other:?}"))),
        };
        let payload = match (embedded, detached) {
            (Some(p), None) => p,
            (None, Some(p)) => p,
            (None, None) => return Err(CoseError::DetachedPayloadMissing),
            (Some(_), Some(_)) => return Err(CoseError::PayloadNotDetached),
        };

        let message_type = match self.options.message_type.or(tagged) {
            Some(t) => t,
            None => match datatype(&dec)? {
                Type::Bytes => MessageType::Sign1,
                Type::Array => MessageType::Sign,
                other => return Err(CoseError::MessageFormat(format!("unexpected signature element {other:?}"))),
            },
        };
        let options = CoseOptions { message_type: Some(message_type), ..self.options.clone() };
        debug!(?message_type, verifiers = self.verifiers.len(), "verifying COSE message");

        let (signature_parameters, verified_signatures) = match message_type {
            MessageType::Sign1 => {
                let verified =
                    self.verify_sign1(&options, &mut dec, body.protected_bytes, payload, aad, &body.parameters)?;
                (Vec::new(), verified)
            }
            MessageType::Sign => self.verify_sign(&options, &mut dec, body.protected_bytes, payload, aad)?,
        };

        if dec.position() != message.len() {
            return Err(CoseError::MessageFormat("trailing bytes after COSE message".to_string()));
        }

        Ok(VerifiedMessage {
            message_type,
            payload,
            body_parameters: body.parameters,
            signature_parameters,
            verified_signatures,
        })
    }

    /// Inspection only: decode-only mode with nothing registered.
    fn decode_without_verifiers(&self, options: &CoseOptions) -> bool {
        options.decode_only && self.verifiers.is_empty()
    }

    fn verify_sign1(
        &self,
        options: &CoseOptions,
        dec: &mut Decoder<'_>,
        protected_body_headers: &[u8],
        payload: &[u8],
        aad: &[u8],
        body_parameters: &HeaderParameters,
    ) -> Result<usize, CoseError> {
        if datatype(dec)? != Type::Bytes {
            return Err(CoseError::MessageFormat("COSE_Sign1 signature must be a byte string".to_string()));
        }
        let signature = dec.bytes().map_err(cbor_err)?;

        if self.decode_without_verifiers(options) {
            return Ok(0);
        }
        let [verifier] = self.verifiers.as_slice() else {
            return Err(CoseError::WrongVerifierCount(self.verifiers.len()));
        };
        verifier.verify1(options, protected_body_headers, None, payload, aad, body_parameters, signature)?;
        Ok(1)
    }

    fn verify_sign(
        &self,
        options: &CoseOptions,
        dec: &mut Decoder<'_>,
        protected_body_headers: &[u8],
        payload: &[u8],
        aad: &[u8],
    ) -> Result<(Vec<HeaderParameters>, usize), CoseError> {
        let count = match dec.array() {
            Ok(Some(n)) if n > 0 => n,
            Ok(_) => {
                return Err(CoseError::MessageFormat(
                    "COSE_Sign signatures must be a non-empty definite-length array".to_string(),
                ))
            }
            Err(e) => return Err(CoseError::MessageFormat(format!("expected signatures array: {e}"))),
        };
        let inspect_only = self.decode_without_verifiers(options);

        let mut all_parameters = Vec::new();
        let mut verified = 0;
        for index in 0..count as usize {
            let location = HeaderLocation::Signature(index);
            let start = dec.position();
            let mut accepted = None;

            for (i, verifier) in self.verifiers.iter().enumerate() {
                dec.set_position(start);
                let mut parameters = HeaderParameters::new();
                match verifier.verify(
                    options,
                    location,
                    protected_body_headers,
                    payload,
                    aad,
                    &self.understood,
                    dec,
                    &mut parameters,
                ) {
                    Ok(()) => {
                        accepted = Some(parameters);
                        break;
                    }
                    Err(e) if e.is_unsupported_alg() => {
                        debug!(signature = index, verifier = i, error = %e, "verifier declined signature");
                    }
                    Err(e) => return Err(e),
                }
            }

            match accepted {
                Some(parameters) => {
                    verified += 1;
                    all_parameters.push(parameters);
                }
                None => {
                    dec.set_position(start);
                    let decoded = decode_signature(dec, location, &self.understood)?;
                    if options.verify_all_signatures && !inspect_only {
                        return Err(CoseError::NoSignatureVerified);
                    }
                    debug!(signature = index, "no verifier handles this signature; skipped");
                    all_parameters.push(decoded.headers.parameters);
                }
            }
        }

        if verified == 0 && !inspect_only {
            return Err(CoseError::NoSignatureVerified);
        }
        Ok((all_parameters, verified))
    }
}

fn datatype(dec: &Decoder<'_>) -> Result<Type, CoseError> {
    dec.datatype().map_err(cbor_err)
}

fn cbor_err(e: minicbor::decode::Error) -> CoseError {
    CoseError::CborNotWellFormed(e.to_string())
}
