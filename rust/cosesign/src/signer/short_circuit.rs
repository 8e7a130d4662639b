// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cosesign_abstractions::{CoseAlgorithm, CoseError, CoseOptions, HeaderParameter, HeaderParameters};
use cosesign_common::{tbs_hash, CoseEncoder};
use tracing::warn;

use super::{emit_signature, CoseSigner, SignatureInput};
use crate::crypto::{self, SigningKey};
use crate::short_circuit::SHORT_CIRCUIT_KID;

/// Test signer whose "signature" is the Sig_structure hash.
///
/// Produces messages with the same shape and size as a real signer, using the
/// null key. Refuses to sign unless [`CoseOptions::allow_short_circuit`] is set.
#[derive(Debug)]
pub struct ShortCircuitSigner {
    algorithm: CoseAlgorithm,
    header_parameters: HeaderParameters,
    pending_error: Option<CoseError>,
}

impl Default for ShortCircuitSigner {
    fn default() -> Self {
        Self::new(CoseAlgorithm::ShortCircuit256)
    }
}

impl ShortCircuitSigner {
    /// `algorithm` must be one of the short-circuit identifiers; anything else
    /// is reported when signing.
    pub fn new(algorithm: CoseAlgorithm) -> Self {
        Self { algorithm, header_parameters: HeaderParameters::new(), pending_error: None }
    }

    pub fn with_header_parameters(mut self, parameters: impl IntoIterator<Item = HeaderParameter>) -> Self {
        self.header_parameters.extend(parameters);
        self
    }

    fn check(&self) -> Result<(), CoseError> {
        if !self.algorithm.is_short_circuit() {
            return Err(CoseError::UnsupportedSigningAlg(self.algorithm.id()));
        }
        Ok(())
    }

    fn parameters(&self) -> HeaderParameters {
        let mut params = HeaderParameters::new();
        params.push(HeaderParameter::alg_id(self.algorithm.id()));
        params.push(HeaderParameter::kid(SHORT_CIRCUIT_KID.to_vec()));
        params.extend(self.header_parameters.iter().cloned());
        params
    }
}

impl CoseSigner for ShortCircuitSigner {
    fn body_header_parameters(&mut self) -> HeaderParameters {
        match self.check() {
            Ok(()) => self.parameters(),
            Err(e) => {
                self.pending_error = Some(e);
                HeaderParameters::new()
            }
        }
    }

    fn sign(
        &mut self,
        options: &CoseOptions,
        protected_body_headers: &[u8],
        aad: &[u8],
        payload: &[u8],
        encoder: &mut CoseEncoder<'_>,
    ) -> Result<(), CoseError> {
        // COSE_Sign1 validated in `body_header_parameters`; COSE_Sign never calls it.
        if let Some(e) = self.pending_error.take() {
            return Err(e);
        }
        if options.is_sign() {
            self.check()?;
        }
        if !options.allow_short_circuit {
            return Err(CoseError::ShortCircuitDisabled);
        }

        let algorithm = self.algorithm;
        let hash_alg = algorithm
            .hash_algorithm()
            .ok_or(CoseError::UnsupportedSigningAlg(algorithm.id()))?;
        let signature_parameters = if options.is_sign() { self.parameters() } else { HeaderParameters::new() };

        let input = SignatureInput {
            options,
            signature_parameters: &signature_parameters,
            protected_body_headers,
            aad,
            payload,
            signature_len: crypto::signature_size(algorithm, &SigningKey::Null)?,
        };
        emit_signature(input, encoder, |tbs| {
            warn!(?algorithm, "producing a short-circuit signature; it is not a real signature");
            let hash = tbs_hash(hash_alg, tbs)?;
            crypto::sign_prehash(algorithm, &SigningKey::Null, hash.as_slice())
        })
    }
}
