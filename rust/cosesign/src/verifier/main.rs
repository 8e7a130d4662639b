// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cosesign_abstractions::{CoseAlgorithm, CoseError, CoseOptions, HeaderParameters};
use cosesign_common::{build_tbs_hash, Tbs};

use super::{check_kid, CoseVerifier};
use crate::crypto::{self, VerificationKey};

/// ECDSA and RSA verifier.
///
/// Accepts only the algorithms its key can check: a P-256 key handles ES256,
/// an RSA key handles PS256/384/512 and RS256, and so on.
#[derive(Debug, Clone)]
pub struct MainVerifier {
    key: VerificationKey,
    kid: Option<Vec<u8>>,
}

impl MainVerifier {
    pub fn new(key: impl Into<VerificationKey>) -> Self {
        Self { key: key.into(), kid: None }
    }

    /// Build from a DER SubjectPublicKeyInfo or DER X.509 certificate.
    pub fn from_der(algorithm: CoseAlgorithm, der_key_or_cert: &[u8]) -> Result<Self, CoseError> {
        if !(algorithm.is_ecdsa() || algorithm.is_rsa()) {
            return Err(CoseError::UnsupportedSigningAlg(algorithm.id()));
        }
        Ok(Self::new(VerificationKey::from_der(algorithm, der_key_or_cert)?))
    }

    /// Only accept messages whose `kid` (when present) equals `kid`.
    pub fn with_kid(mut self, kid: impl Into<Vec<u8>>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    fn algorithm(&self, parameters: &HeaderParameters) -> Result<CoseAlgorithm, CoseError> {
        let id = parameters.find_alg_id().ok_or(CoseError::NoAlgId)?;
        CoseAlgorithm::from_id(id)
            .filter(|alg| (alg.is_ecdsa() || alg.is_rsa()) && self.key.supports(*alg))
            .ok_or(CoseError::UnsupportedSigningAlg(id))
    }
}

impl CoseVerifier for MainVerifier {
    fn verify1(
        &self,
        options: &CoseOptions,
        protected_body_headers: &[u8],
        protected_signature_headers: Option<&[u8]>,
        payload: &[u8],
        aad: &[u8],
        parameters: &HeaderParameters,
        signature: &[u8],
    ) -> Result<(), CoseError> {
        let algorithm = self.algorithm(parameters)?;
        check_kid(self.kid.as_deref(), parameters)?;
        if options.decode_only {
            return Ok(());
        }

        let tbs = Tbs { protected_body_headers, protected_signature_headers, aad, payload };
        let hash = build_tbs_hash(algorithm.id(), &tbs)?;
        crypto::verify_prehash(algorithm, &self.key, hash.as_slice(), signature)
    }
}
