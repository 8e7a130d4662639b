// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! To-be-signed bytes.
//!
//! ```text
//! Sig_structure = [
//!     context : "Signature" / "Signature1",
//!     body_protected : bstr,
//!     ? sign_protected : bstr,   ; COSE_Sign only
//!     external_aad : bstr,
//!     payload : bstr
//! ]
//! ```
//!
//! Hashing streams the encoding straight into the digest, so the payload is
//! never copied into an intermediate buffer.

use std::convert::Infallible;

use cosesign_abstractions::{CoseAlgorithm, CoseError, CoseHashAlgorithm};
use minicbor::encode::Write;
use minicbor::Encoder;
use sha2::{Digest, Sha256, Sha384, Sha512};

pub const SIG_STRUCTURE_CONTEXT_SIGNATURE1: &str = "Signature1";
pub const SIG_STRUCTURE_CONTEXT_SIGNATURE: &str = "Signature";

/// Capacity of [`TbsHash`]; the largest supported digest (SHA-512).
pub const MAX_HASH_SIZE: usize = 64;

/// Inputs to the Sig_structure for one signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tbs<'a> {
    pub protected_body_headers: &'a [u8],
    /// `None` for COSE_Sign1. `Some` (possibly empty) for a COSE_Signature.
    pub protected_signature_headers: Option<&'a [u8]>,
    pub aad: &'a [u8],
    pub payload: &'a [u8],
}

impl<'a> Tbs<'a> {
    pub fn sign1(protected_body_headers: &'a [u8], aad: &'a [u8], payload: &'a [u8]) -> Self {
        Self { protected_body_headers, protected_signature_headers: None, aad, payload }
    }

    pub fn sign(
        protected_body_headers: &'a [u8],
        protected_signature_headers: &'a [u8],
        aad: &'a [u8],
        payload: &'a [u8],
    ) -> Self {
        Self {
            protected_body_headers,
            protected_signature_headers: Some(protected_signature_headers),
            aad,
            payload,
        }
    }

    pub fn context(&self) -> &'static str {
        match self.protected_signature_headers {
            Some(_) => SIG_STRUCTURE_CONTEXT_SIGNATURE,
            None => SIG_STRUCTURE_CONTEXT_SIGNATURE1,
        }
    }
}

/// Fixed-capacity digest of a Sig_structure.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TbsHash {
    bytes: [u8; MAX_HASH_SIZE],
    len: usize,
}

impl TbsHash {
    fn from_digest(digest: &[u8]) -> Result<Self, CoseError> {
        let mut bytes = [0u8; MAX_HASH_SIZE];
        bytes.get_mut(..digest.len()).ok_or(CoseError::HashBufferTooSmall)?.copy_from_slice(digest);
        Ok(Self { bytes, len: digest.len() })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for TbsHash {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl std::fmt::Debug for TbsHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TbsHash").field(&self.as_slice()).finish()
    }
}

/// The encoded Sig_structure, for algorithms that sign it without pre-hashing (EdDSA).
pub fn encode_tbs(tbs: &Tbs<'_>) -> Result<Vec<u8>, CoseError> {
    let mut e = Encoder::new(Vec::new());
    encode_sig_structure(&mut e, tbs).map_err(|err| CoseError::CborNotWellFormed(err.to_string()))?;
    Ok(e.into_writer())
}

/// Hash the Sig_structure with `hash`.
pub fn tbs_hash(hash: CoseHashAlgorithm, tbs: &Tbs<'_>) -> Result<TbsHash, CoseError> {
    match hash {
        CoseHashAlgorithm::Sha256 => digest_sig_structure::<Sha256>(tbs),
        CoseHashAlgorithm::Sha384 => digest_sig_structure::<Sha384>(tbs),
        CoseHashAlgorithm::Sha512 => digest_sig_structure::<Sha512>(tbs),
    }
}

/// Hash the Sig_structure with the hash implied by a COSE algorithm identifier.
pub fn build_tbs_hash(alg_id: i64, tbs: &Tbs<'_>) -> Result<TbsHash, CoseError> {
    let hash = CoseAlgorithm::try_from(alg_id)?
        .hash_algorithm()
        .ok_or(CoseError::UnsupportedSigningAlg(alg_id))?;
    tbs_hash(hash, tbs)
}

fn digest_sig_structure<D: Digest>(tbs: &Tbs<'_>) -> Result<TbsHash, CoseError> {
    let mut e = Encoder::new(HashSink(D::new()));
    encode_sig_structure(&mut e, tbs).map_err(|err| CoseError::CborNotWellFormed(err.to_string()))?;
    let digest = e.into_writer().0.finalize();
    TbsHash::from_digest(digest.as_slice())
}

fn encode_sig_structure<W: Write>(e: &mut Encoder<W>, tbs: &Tbs<'_>) -> Result<(), minicbor::encode::Error<W::Error>> {
    let len = if tbs.protected_signature_headers.is_some() { 5 } else { 4 };
    e.array(len)?.str(tbs.context())?.bytes(tbs.protected_body_headers)?;
    if let Some(sign_protected) = tbs.protected_signature_headers {
        e.bytes(sign_protected)?;
    }
    e.bytes(tbs.aad)?.bytes(tbs.payload)?;
    Ok(())
}

struct HashSink<D>(D);

impl<D: Digest> Write for HashSink<D> {
    type Error = Infallible;

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.0.update(buf);
        Ok(())
    }
}
