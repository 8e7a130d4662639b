// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signer variants.
//!
//! Every signer implements [`CoseSigner`]. The orchestrator drives it in two steps:
//! 1. (COSE_Sign1 only) [`CoseSigner::body_header_parameters`] collects the
//!    parameters the signer wants in the body, before the body's protected
//!    bucket is encoded.
//! 2. [`CoseSigner::sign`] emits the signature: a bare bstr for COSE_Sign1, or a
//!    full `COSE_Signature` array for COSE_Sign.
//!
//! When the encoder is sizing, signers emit a placeholder of the exact signature
//! length and do no cryptographic work.

mod eddsa;
mod main;
#[cfg(feature = "short-circuit")]
mod short_circuit;

pub use eddsa::EddsaSigner;
pub use main::MainSigner;
#[cfg(feature = "short-circuit")]
pub use short_circuit::ShortCircuitSigner;

use cosesign_abstractions::{CoseError, CoseOptions, HeaderParameters};
use cosesign_common::{encode_headers, CoseEncoder, Tbs};

pub trait CoseSigner {
    /// Body header parameters for a COSE_Sign1.
    ///
    /// Must not fail. A problem found here is stored in the signer and returned
    /// by the next call to [`CoseSigner::sign`].
    fn body_header_parameters(&mut self) -> HeaderParameters;

    /// Emit this signer's signature for the message.
    ///
    /// `options.message_type` is always set by the orchestrator.
    fn sign(
        &mut self,
        options: &CoseOptions,
        protected_body_headers: &[u8],
        aad: &[u8],
        payload: &[u8],
        encoder: &mut CoseEncoder<'_>,
    ) -> Result<(), CoseError>;
}

/// Inputs shared by the built-in signers' emit step.
pub(crate) struct SignatureInput<'a> {
    pub options: &'a CoseOptions,
    pub signature_parameters: &'a HeaderParameters,
    pub protected_body_headers: &'a [u8],
    pub aad: &'a [u8],
    pub payload: &'a [u8],
    pub signature_len: usize,
}

/// Write the signature element.
///
/// For COSE_Sign this opens the `COSE_Signature` array and encodes
/// `signature_parameters` first, since their protected bucket is part of the
/// Sig_structure. `produce` is skipped while sizing.
pub(crate) fn emit_signature(
    input: SignatureInput<'_>,
    encoder: &mut CoseEncoder<'_>,
    produce: impl FnOnce(&Tbs<'_>) -> Result<Vec<u8>, CoseError>,
) -> Result<(), CoseError> {
    let sign_protected;
    let tbs = if input.options.is_sign() {
        encoder.array(3)?;
        sign_protected = encode_headers(encoder, input.signature_parameters)?;
        Tbs::sign(input.protected_body_headers, &sign_protected, input.aad, input.payload)
    } else {
        Tbs::sign1(input.protected_body_headers, input.aad, input.payload)
    };

    if encoder.is_sizing() {
        encoder.bytes(&vec![0u8; input.signature_len])?;
        return Ok(());
    }

    let signature = produce(&tbs)?;
    if signature.len() != input.signature_len {
        return Err(CoseError::Signing(format!(
            "signature is {} bytes, expected {}",
            signature.len(),
            input.signature_len
        )));
    }
    encoder.bytes(&signature)?;
    Ok(())
}
