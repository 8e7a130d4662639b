// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cosesign_abstractions::{CoseAlgorithm, CoseError, CoseOptions, HeaderParameter, HeaderParameters};
use cosesign_common::{tbs_hash, CoseEncoder};
use tracing::debug;

use super::{emit_signature, CoseSigner, SignatureInput};
use crate::crypto::{self, SigningKey};

/// ECDSA (ES256/384/512) and RSA (PS256/384/512, RS256) signer.
///
/// Signs the Sig_structure digest with the hash implied by the algorithm.
#[derive(Debug)]
pub struct MainSigner {
    algorithm: CoseAlgorithm,
    key: SigningKey,
    kid: Option<Vec<u8>>,
    header_parameters: HeaderParameters,
    pending_error: Option<CoseError>,
}

impl MainSigner {
    pub fn new(algorithm: CoseAlgorithm, key: impl Into<SigningKey>) -> Self {
        Self {
            algorithm,
            key: key.into(),
            kid: None,
            header_parameters: HeaderParameters::new(),
            pending_error: None,
        }
    }

    /// Put `kid` in the unprotected bucket next to the algorithm.
    pub fn with_kid(mut self, kid: impl Into<Vec<u8>>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Extra parameters emitted alongside `alg` and `kid`.
    pub fn with_header_parameters(mut self, parameters: impl IntoIterator<Item = HeaderParameter>) -> Self {
        self.header_parameters.extend(parameters);
        self
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        self.algorithm
    }

    fn check(&self) -> Result<(), CoseError> {
        if !(self.algorithm.is_ecdsa() || self.algorithm.is_rsa()) {
            return Err(CoseError::UnsupportedSigningAlg(self.algorithm.id()));
        }
        if !self.key.supports(self.algorithm) {
            return Err(CoseError::WrongKeyType);
        }
        Ok(())
    }

    fn parameters(&self) -> HeaderParameters {
        let mut params = HeaderParameters::new();
        params.push(HeaderParameter::alg_id(self.algorithm.id()));
        if let Some(kid) = &self.kid {
            params.push(HeaderParameter::kid(kid.clone()));
        }
        params.extend(self.header_parameters.iter().cloned());
        params
    }
}

impl CoseSigner for MainSigner {
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

        let algorithm = self.algorithm;
        let hash_alg = algorithm
            .hash_algorithm()
            .ok_or(CoseError::UnsupportedSigningAlg(algorithm.id()))?;
        let signature_parameters = if options.is_sign() { self.parameters() } else { HeaderParameters::new() };
        let key = &self.key;

        let input = SignatureInput {
            options,
            signature_parameters: &signature_parameters,
            protected_body_headers,
            aad,
            payload,
            signature_len: crypto::signature_size(algorithm, key)?,
        };
        emit_signature(input, encoder, |tbs| {
            let hash = tbs_hash(hash_alg, tbs)?;
            debug!(?algorithm, context = tbs.context(), "signing Sig_structure digest");
            crypto::sign_prehash(algorithm, key, hash.as_slice())
        })
    }
}
