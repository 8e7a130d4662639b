// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cosesign_abstractions::{CoseAlgorithm, CoseError, CoseOptions, HeaderParameter, HeaderParameters};
use cosesign_common::{encode_tbs, CoseEncoder};

use super::{emit_signature, CoseSigner, SignatureInput};
use crate::crypto::{self, SigningKey};

/// Ed25519 signer. EdDSA signs the encoded Sig_structure, not a digest of it.
#[derive(Debug)]
pub struct EddsaSigner {
    key: SigningKey,
    kid: Option<Vec<u8>>,
    header_parameters: HeaderParameters,
}

impl EddsaSigner {
    pub fn new(key: ed25519_dalek::SigningKey) -> Self {
        Self { key: SigningKey::Ed25519(key), kid: None, header_parameters: HeaderParameters::new() }
    }

    pub fn with_kid(mut self, kid: impl Into<Vec<u8>>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn with_header_parameters(mut self, parameters: impl IntoIterator<Item = HeaderParameter>) -> Self {
        self.header_parameters.extend(parameters);
        self
    }

    fn parameters(&self) -> HeaderParameters {
        let mut params = HeaderParameters::new();
        params.push(HeaderParameter::alg_id(CoseAlgorithm::EdDSA.id()));
        if let Some(kid) = &self.kid {
            params.push(HeaderParameter::kid(kid.clone()));
        }
        params.extend(self.header_parameters.iter().cloned());
        params
    }
}

impl CoseSigner for EddsaSigner {
    fn body_header_parameters(&mut self) -> HeaderParameters {
        self.parameters()
    }

    fn sign(
        &mut self,
        options: &CoseOptions,
        protected_body_headers: &[u8],
        aad: &[u8],
        payload: &[u8],
        encoder: &mut CoseEncoder<'_>,
    ) -> Result<(), CoseError> {
        let signature_parameters = if options.is_sign() { self.parameters() } else { HeaderParameters::new() };
        let key = &self.key;

        let input = SignatureInput {
            options,
            signature_parameters: &signature_parameters,
            protected_body_headers,
            aad,
            payload,
            signature_len: crypto::signature_size(CoseAlgorithm::EdDSA, key)?,
        };
        emit_signature(input, encoder, |tbs| crypto::sign_eddsa(key, &encode_tbs(tbs)?))
    }
}
