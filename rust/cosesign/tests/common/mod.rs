// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for `cosesign` integration tests.
//!
//! Keys: EC and Ed25519 keys are generated per test with `OsRng`; the RSA key
//! and the X.509 certificate are fixtures under `tests/data` so tests do not
//! pay for RSA key generation.

#![allow(dead_code)]

use cosesign::{
    CoseAlgorithm, CoseError, CoseOptions, CoseSigner, CoseVerifier, EddsaSigner, EddsaVerifier, MainSigner,
    MainVerifier, SignContext, SigningKey, VerifiedMessage, VerifyContext,
};
use minicbor::data::Tag;
use rand_core::OsRng;
use rsa::pkcs8::DecodePrivateKey as _;

pub const RSA_KEY_PEM: &str = include_str!("../data/rsa2048_pkcs8.pem");
pub const P256_KEY_PEM: &str = include_str!("../data/p256_pkcs8.pem");
/// Self-signed certificate for [`P256_KEY_PEM`].
pub const P256_CERT_DER: &[u8] = include_bytes!("../data/p256_cert.der");

/// Every real (non short-circuit) algorithm.
pub const REAL_ALGORITHMS: [CoseAlgorithm; 8] = [
    CoseAlgorithm::ES256,
    CoseAlgorithm::ES384,
    CoseAlgorithm::ES512,
    CoseAlgorithm::EdDSA,
    CoseAlgorithm::PS256,
    CoseAlgorithm::PS384,
    CoseAlgorithm::PS512,
    CoseAlgorithm::RS256,
];

pub fn rsa_key() -> rsa::RsaPrivateKey {
    rsa::RsaPrivateKey::from_pkcs8_pem(RSA_KEY_PEM).unwrap()
}

pub fn p256_key() -> p256::ecdsa::SigningKey {
    p256::ecdsa::SigningKey::random(&mut OsRng)
}

/// A fresh key suited to `alg`.
pub fn signing_key(alg: CoseAlgorithm) -> SigningKey {
    match alg {
        CoseAlgorithm::ES256 => p256_key().into(),
        CoseAlgorithm::ES384 => p384::ecdsa::SigningKey::random(&mut OsRng).into(),
        CoseAlgorithm::ES512 => p521::ecdsa::SigningKey::random(&mut OsRng).into(),
        CoseAlgorithm::EdDSA => ed25519_dalek::SigningKey::generate(&mut OsRng).into(),
        CoseAlgorithm::PS256 | CoseAlgorithm::PS384 | CoseAlgorithm::PS512 | CoseAlgorithm::RS256 => {
            rsa_key().into()
        }
        _ => SigningKey::Null,
    }
}

/// A signer for `alg` and a verifier holding the matching public key.
pub fn signer_and_verifier(alg: CoseAlgorithm) -> (Box<dyn CoseSigner>, Box<dyn CoseVerifier>) {
    if let Some(pair) = short_circuit_pair(alg) {
        return pair;
    }

    let key = signing_key(alg);
    let verification_key = key.verification_key();
    let signer: Box<dyn CoseSigner>;
    let verifier: Box<dyn CoseVerifier>;
    match key {
        SigningKey::Ed25519(k) => {
            verifier = Box::new(EddsaVerifier::new(k.verifying_key()));
            signer = Box::new(EddsaSigner::new(k));
        }
        key => {
            verifier = Box::new(MainVerifier::new(verification_key));
            signer = Box::new(MainSigner::new(alg, key));
        }
    }
    (signer, verifier)
}

#[cfg(feature = "short-circuit")]
fn short_circuit_pair(alg: CoseAlgorithm) -> Option<(Box<dyn CoseSigner>, Box<dyn CoseVerifier>)> {
    if !alg.is_short_circuit() {
        return None;
    }
    let signer: Box<dyn CoseSigner> = Box::new(cosesign::ShortCircuitSigner::new(alg));
    let verifier: Box<dyn CoseVerifier> = Box::new(cosesign::ShortCircuitVerifier::new());
    Some((signer, verifier))
}

#[cfg(not(feature = "short-circuit"))]
fn short_circuit_pair(_alg: CoseAlgorithm) -> Option<(Box<dyn CoseSigner>, Box<dyn CoseVerifier>)> {
    None
}

/// Options that let short-circuit algorithms run.
pub fn options_for(alg: CoseAlgorithm) -> CoseOptions {
    if alg.is_short_circuit() {
        CoseOptions::default().with_short_circuit()
    } else {
        CoseOptions::default()
    }
}

pub fn sign_one(
    signer: &mut dyn CoseSigner,
    options: CoseOptions,
    aad: &[u8],
    payload: &[u8],
) -> Result<Vec<u8>, CoseError> {
    let mut ctx = SignContext::new(options);
    ctx.add_signer(signer);
    ctx.sign_to_vec(aad, payload)
}

pub fn verify_one<'m>(
    verifier: &dyn CoseVerifier,
    options: CoseOptions,
    message: &'m [u8],
    aad: &[u8],
) -> Result<VerifiedMessage<'m>, CoseError> {
    let mut ctx = VerifyContext::new(options);
    ctx.add_verifier(verifier);
    ctx.verify(message, aad)
}

/// Index of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .unwrap_or_else(|| panic!("{} not found", hex::encode(needle)))
}

/// Copy of `message` with the low bit of byte `index` flipped.
pub fn flip_bit(message: &[u8], index: usize) -> Vec<u8> {
    let mut out = message.to_vec();
    out[index] ^= 0x01;
    out
}

/// Encode a COSE_Sign1 from raw parts. `unprotected` is a pre-encoded CBOR map.
pub fn encode_cose_sign1(
    tagged: bool,
    protected: &[u8],
    unprotected: &[u8],
    payload: Option<&[u8]>,
    signature: &[u8],
) -> Vec<u8> {
    let mut enc = minicbor::Encoder::new(Vec::new());
    if tagged {
        enc.tag(Tag::new(18)).unwrap();
    }
    enc.array(4).unwrap();
    enc.bytes(protected).unwrap();
    enc.writer_mut().extend_from_slice(unprotected);
    match payload {
        Some(p) => enc.bytes(p).unwrap(),
        None => enc.null().unwrap(),
    };
    enc.bytes(signature).unwrap();
    enc.into_writer()
}

/// Encode a CBOR map with integer labels and pre-encoded values.
pub fn int_map(entries: &[(i64, &[u8])]) -> Vec<u8> {
    let mut enc = minicbor::Encoder::new(Vec::new());
    enc.map(entries.len() as u64).unwrap();
    for (label, value) in entries {
        enc.i64(*label).unwrap();
        enc.writer_mut().extend_from_slice(value);
    }
    enc.into_writer()
}

/// CBOR encoding of a single integer.
pub fn cbor_int(i: i64) -> Vec<u8> {
    let mut enc = minicbor::Encoder::new(Vec::new());
    enc.i64(i).unwrap();
    enc.into_writer()
}
