// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Sign orchestrator.
//!
//! Builds `COSE_Sign1` or `COSE_Sign`:
//! 1. collect body header parameters (from the signer for COSE_Sign1, plus any
//!    added to the context)
//! 2. encode the body buckets and the payload (or `null` when detached)
//! 3. let each signer append its signature
//!
//! Output goes to a caller buffer. [`SignContext::encoded_size`] runs the same
//! steps against a sizing encoder to find the exact buffer size first.

use cosesign_abstractions::{CoseError, CoseOptions, HeaderParameter, HeaderParameters, MessageType};
use cosesign_common::{encode_headers, CoseEncoder};
use tracing::debug;

use crate::signer::CoseSigner;

/// Signing context: options, registered signers and extra body parameters.
///
/// Signers are borrowed and must outlive the context. They are invoked in
/// registration order.
pub struct SignContext<'a> {
    options: CoseOptions,
    signers: Vec<&'a mut dyn CoseSigner>,
    body_parameters: HeaderParameters,
}

impl<'a> SignContext<'a> {
    pub fn new(options: CoseOptions) -> Self {
        Self { options, signers: Vec::new(), body_parameters: HeaderParameters::new() }
    }

    pub fn add_signer(&mut self, signer: &'a mut dyn CoseSigner) {
        self.signers.push(signer);
    }

    /// Parameters for the message body (content type, custom labels...).
    pub fn add_body_header_parameters(&mut self, parameters: impl IntoIterator<Item = HeaderParameter>) {
        self.body_parameters.extend(parameters);
    }

    pub fn options(&self) -> &CoseOptions {
        &self.options
    }

    /// Sign with the payload embedded, writing into `out`.
    pub fn sign<'o>(&mut self, aad: &[u8], payload: &[u8], out: &'o mut [u8]) -> Result<&'o [u8], CoseError> {
        self.sign_into(aad, payload, false, out)
    }

    /// Sign with a detached payload: the message carries `null`, the payload is
    /// still covered by the signature.
    pub fn sign_detached<'o>(
        &mut self,
        aad: &[u8],
        payload: &[u8],
        out: &'o mut [u8],
    ) -> Result<&'o [u8], CoseError> {
        self.sign_into(aad, payload, true, out)
    }

    /// Exact length `sign`/`sign_detached` would produce. No cryptographic work is done.
    pub fn encoded_size(&mut self, aad: &[u8], payload: &[u8], detached: bool) -> Result<usize, CoseError> {
        let mut enc = CoseEncoder::sizing();
        self.encode(aad, payload, detached, &mut enc)?;
        Ok(enc.finish())
    }

    /// Size, allocate and sign in one call.
    pub fn sign_to_vec(&mut self, aad: &[u8], payload: &[u8]) -> Result<Vec<u8>, CoseError> {
        self.sign_to_vec_inner(aad, payload, false)
    }

    pub fn sign_detached_to_vec(&mut self, aad: &[u8], payload: &[u8]) -> Result<Vec<u8>, CoseError> {
        self.sign_to_vec_inner(aad, payload, true)
    }

    fn sign_to_vec_inner(&mut self, aad: &[u8], payload: &[u8], detached: bool) -> Result<Vec<u8>, CoseError> {
        let size = self.encoded_size(aad, payload, detached)?;
        let mut out = vec![0u8; size];
        let len = self.sign_into(aad, payload, detached, &mut out)?.len();
        out.truncate(len);
        Ok(out)
    }

    fn sign_into<'o>(
        &mut self,
        aad: &[u8],
        payload: &[u8],
        detached: bool,
        out: &'o mut [u8],
    ) -> Result<&'o [u8], CoseError> {
        let mut enc = CoseEncoder::writing(&mut *out);
        self.encode(aad, payload, detached, &mut enc)?;
        let len = enc.finish();
        Ok(&out[..len])
    }

    fn message_type(&self) -> Result<MessageType, CoseError> {
        let count = self.signers.len();
        let message_type = match self.options.message_type {
            Some(t) => t,
            None if count == 1 => MessageType::Sign1,
            None => MessageType::Sign,
        };
        match message_type {
            MessageType::Sign1 if count != 1 => Err(CoseError::WrongSignerCount(count)),
            MessageType::Sign if count == 0 => Err(CoseError::WrongSignerCount(0)),
            t => Ok(t),
        }
    }

    fn encode(
        &mut self,
        aad: &[u8],
        payload: &[u8],
        detached: bool,
        enc: &mut CoseEncoder<'_>,
    ) -> Result<(), CoseError> {
        let message_type = self.message_type()?;
        let options = CoseOptions { message_type: Some(message_type), ..self.options.clone() };
        debug!(?message_type, signers = self.signers.len(), detached, sizing = enc.is_sizing(), "encoding COSE message");

        let mut body = HeaderParameters::new();
        if message_type == MessageType::Sign1 {
            for signer in self.signers.iter_mut() {
                body.extend(signer.body_header_parameters());
            }
        }
        body.extend(self.body_parameters.iter().cloned());

        if !options.omit_cbor_tag {
            enc.tag(message_type.cbor_tag())?;
        }
        enc.array(4)?;
        let protected = encode_headers(enc, &body)?;
        if detached {
            enc.null()?;
        } else {
            enc.bytes(payload)?;
        }

        if message_type == MessageType::Sign {
            enc.array(self.signers.len() as u64)?;
        }
        for signer in self.signers.iter_mut() {
            signer.sign(&options, &protected, aad, payload, enc)?;
        }
        Ok(())
    }
}
