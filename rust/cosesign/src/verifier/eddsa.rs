// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cosesign_abstractions::{CoseAlgorithm, CoseError, CoseOptions, HeaderParameters};
use cosesign_common::{encode_tbs, Tbs};

use super::{check_kid, CoseVerifier};
use crate::crypto::{self, VerificationKey};

/// Ed25519 verifier.
#[derive(Debug, Clone)]
pub struct EddsaVerifier {
    key: VerificationKey,
    kid: Option<Vec<u8>>,
}

impl EddsaVerifier {
    pub fn new(key: ed25519_dalek::VerifyingKey) -> Self {
        Self { key: VerificationKey::Ed25519(key), kid: None }
    }

    pub fn from_der(der_key_or_cert: &[u8]) -> Result<Self, CoseError> {
        Ok(Self { key: VerificationKey::from_der(CoseAlgorithm::EdDSA, der_key_or_cert)?, kid: None })
    }

    pub fn with_kid(mut self, kid: impl Into<Vec<u8>>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}

impl CoseVerifier for EddsaVerifier {
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
        let id = parameters.find_alg_id().ok_or(CoseError::NoAlgId)?;
        if id != CoseAlgorithm::EdDSA.id() {
            return Err(CoseError::UnsupportedSigningAlg(id));
        }
        check_kid(self.kid.as_deref(), parameters)?;
        if options.decode_only {
            return Ok(());
        }

        let encoded = encode_tbs(&Tbs { protected_body_headers, protected_signature_headers, aad, payload })?;
        crypto::verify_eddsa(&self.key, &encoded, signature)
    }
}
