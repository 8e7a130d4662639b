// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cryptographic primitive boundary.
//!
//! Keys are opaque handles addressed together with a COSE algorithm. ECDSA and
//! RSA operate on the Sig_structure digest; EdDSA signs the encoded
//! Sig_structure itself. [`SigningKey::Null`] / [`VerificationKey::Null`] stand
//! for "no real key" and are only usable with the short-circuit algorithms.

use std::fmt;

use cosesign_abstractions::{CoseAlgorithm, CoseError};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use rsa::pkcs1v15::Pkcs1v15Sign;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::pss::Pss;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use signature::hazmat::{PrehashSigner, PrehashVerifier};
use signature::{Signer as _, Verifier as _};
use x509_parser::prelude::FromDer as _;

pub enum SigningKey {
    EcP256(p256::ecdsa::SigningKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP521(p521::ecdsa::SigningKey),
    Rsa(RsaPrivateKey),
    Ed25519(ed25519_dalek::SigningKey),
    /// No real key. Only valid with the short-circuit algorithms.
    Null,
}

#[derive(Clone)]
pub enum VerificationKey {
    EcP256(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::VerifyingKey),
    EcP521(p521::ecdsa::VerifyingKey),
    Rsa(RsaPublicKey),
    Ed25519(ed25519_dalek::VerifyingKey),
    /// No real key. Only valid with the short-circuit algorithms.
    Null,
}

macro_rules! ec_verifying_key {
    ($curve:ident, $name:literal, $spki:expr) => {{
        let pk = $curve::PublicKey::from_public_key_der($spki)
            .map_err(|e| CoseError::InvalidKey(format!("bad {} public key: {e}", $name)))?;
        let ep = pk.to_encoded_point(false);
        $curve::ecdsa::VerifyingKey::from_sec1_bytes(ep.as_bytes())
            .map_err(|e| CoseError::InvalidKey(format!("bad {} public key: {e}", $name)))?
    }};
}

impl SigningKey {
    fn kind(&self) -> &'static str {
        match self {
            SigningKey::EcP256(_) => "P-256",
            SigningKey::EcP384(_) => "P-384",
            SigningKey::EcP521(_) => "P-521",
            SigningKey::Rsa(_) => "RSA",
            SigningKey::Ed25519(_) => "Ed25519",
            SigningKey::Null => "null",
        }
    }

    /// Public half of this key.
    #[allow(clippy::clone_on_copy)]
    pub fn verification_key(&self) -> VerificationKey {
        match self {
            SigningKey::EcP256(k) => VerificationKey::EcP256(k.verifying_key().clone()),
            SigningKey::EcP384(k) => VerificationKey::EcP384(k.verifying_key().clone()),
            SigningKey::EcP521(k) => VerificationKey::EcP521(p521::ecdsa::VerifyingKey::from(k)),
            SigningKey::Rsa(k) => VerificationKey::Rsa(k.to_public_key()),
            SigningKey::Ed25519(k) => VerificationKey::Ed25519(k.verifying_key()),
            SigningKey::Null => VerificationKey::Null,
        }
    }

    /// Whether this key can produce signatures for `alg`.
    pub fn supports(&self, alg: CoseAlgorithm) -> bool {
        key_matches(alg, self.kind())
    }
}

impl VerificationKey {
    /// Parse a DER SubjectPublicKeyInfo or DER X.509 certificate for `alg`.
    pub fn from_der(alg: CoseAlgorithm, der_key_or_cert: &[u8]) -> Result<Self, CoseError> {
        let spki = extract_spki_der_from_der_key_or_cert(der_key_or_cert);
        let key = match alg {
            CoseAlgorithm::ES256 => VerificationKey::EcP256(ec_verifying_key!(p256, "P-256", &spki)),
            CoseAlgorithm::ES384 => VerificationKey::EcP384(ec_verifying_key!(p384, "P-384", &spki)),
            CoseAlgorithm::ES512 => VerificationKey::EcP521(ec_verifying_key!(p521, "P-521", &spki)),
            CoseAlgorithm::PS256 | CoseAlgorithm::PS384 | CoseAlgorithm::PS512 | CoseAlgorithm::RS256 => {
                VerificationKey::Rsa(
                    RsaPublicKey::from_public_key_der(&spki)
                        .map_err(|e| CoseError::InvalidKey(format!("bad RSA public key: {e}")))?,
                )
            }
            CoseAlgorithm::EdDSA => VerificationKey::Ed25519(
                ed25519_dalek::VerifyingKey::from_public_key_der(&spki)
                    .map_err(|e| CoseError::InvalidKey(format!("bad Ed25519 public key: {e}")))?,
            ),
            other => return Err(CoseError::UnsupportedSigningAlg(other.id())),
        };
        Ok(key)
    }

    fn kind(&self) -> &'static str {
        match self {
            VerificationKey::EcP256(_) => "P-256",
            VerificationKey::EcP384(_) => "P-384",
            VerificationKey::EcP521(_) => "P-521",
            VerificationKey::Rsa(_) => "RSA",
            VerificationKey::Ed25519(_) => "Ed25519",
            VerificationKey::Null => "null",
        }
    }

    /// Whether signatures made with `alg` can be checked with this key.
    pub fn supports(&self, alg: CoseAlgorithm) -> bool {
        key_matches(alg, self.kind())
    }
}

fn key_matches(alg: CoseAlgorithm, kind: &str) -> bool {
    match alg {
        CoseAlgorithm::ES256 => kind == "P-256",
        CoseAlgorithm::ES384 => kind == "P-384",
        CoseAlgorithm::ES512 => kind == "P-521",
        CoseAlgorithm::PS256 | CoseAlgorithm::PS384 | CoseAlgorithm::PS512 | CoseAlgorithm::RS256 => kind == "RSA",
        CoseAlgorithm::EdDSA => kind == "Ed25519",
        CoseAlgorithm::ShortCircuit256 | CoseAlgorithm::ShortCircuit384 | CoseAlgorithm::ShortCircuit512 => {
            kind == "null"
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({})", self.kind())
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerificationKey({})", self.kind())
    }
}

macro_rules! impl_key_from {
    ($($ty:ty => $target:ident :: $variant:ident),* $(,)?) => {
        $(impl From<$ty> for $target {
            fn from(key: $ty) -> Self {
                $target::$variant(key)
            }
        })*
    };
}

impl_key_from!(
    p256::ecdsa::SigningKey => SigningKey::EcP256,
    p384::ecdsa::SigningKey => SigningKey::EcP384,
    p521::ecdsa::SigningKey => SigningKey::EcP521,
    RsaPrivateKey => SigningKey::Rsa,
    ed25519_dalek::SigningKey => SigningKey::Ed25519,
    p256::ecdsa::VerifyingKey => VerificationKey::EcP256,
    p384::ecdsa::VerifyingKey => VerificationKey::EcP384,
    p521::ecdsa::VerifyingKey => VerificationKey::EcP521,
    RsaPublicKey => VerificationKey::Rsa,
    ed25519_dalek::VerifyingKey => VerificationKey::Ed25519,
);

fn extract_spki_der_from_der_key_or_cert(der: &[u8]) -> Vec<u8> {
    if let Ok((_, cert)) = x509_parser::parse_x509_certificate(der) {
        return cert.tbs_certificate.subject_pki.raw.to_vec();
    }
    if let Ok((_, spki)) = x509_parser::x509::SubjectPublicKeyInfo::from_der(der) {
        return spki.raw.to_vec();
    }
    der.to_vec()
}

/// Exact length of the signature `key` produces for `alg`.
pub fn signature_size(alg: CoseAlgorithm, key: &SigningKey) -> Result<usize, CoseError> {
    if !key.supports(alg) {
        return Err(CoseError::WrongKeyType);
    }
    let size = match (alg, key) {
        (CoseAlgorithm::ES256, _) => 64,
        (CoseAlgorithm::ES384, _) => 96,
        (CoseAlgorithm::ES512, _) => 132,
        (CoseAlgorithm::EdDSA, _) => ed25519_dalek::SIGNATURE_LENGTH,
        (_, SigningKey::Rsa(k)) => k.size(),
        #[cfg(feature = "short-circuit")]
        (_, SigningKey::Null) => crate::short_circuit::SHORT_CIRCUIT_SIG_SIZE,
        _ => return Err(CoseError::UnsupportedSigningAlg(alg.id())),
    };
    Ok(size)
}

/// Sign a Sig_structure digest.
pub fn sign_prehash(alg: CoseAlgorithm, key: &SigningKey, hash: &[u8]) -> Result<Vec<u8>, CoseError> {
    if !key.supports(alg) {
        return Err(CoseError::WrongKeyType);
    }
    let signing_err = |e: signature::Error| CoseError::Signing(format!("{alg:?}: {e}"));
    let rsa_err = |e: rsa::Error| CoseError::Signing(format!("{alg:?}: {e}"));

    match key {
        SigningKey::EcP256(k) => {
            let sig: p256::ecdsa::Signature = k.sign_prehash(hash).map_err(signing_err)?;
            Ok(sig.to_bytes().to_vec())
        }
        SigningKey::EcP384(k) => {
            let sig: p384::ecdsa::Signature = k.sign_prehash(hash).map_err(signing_err)?;
            Ok(sig.to_bytes().to_vec())
        }
        SigningKey::EcP521(k) => {
            let sig: p521::ecdsa::Signature = k.sign_prehash(hash).map_err(signing_err)?;
            Ok(sig.to_bytes().to_vec())
        }
        SigningKey::Rsa(k) => match alg {
            CoseAlgorithm::RS256 => k.sign(Pkcs1v15Sign::new::<Sha256>(), hash).map_err(rsa_err),
            CoseAlgorithm::PS256 => k.sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), hash).map_err(rsa_err),
            CoseAlgorithm::PS384 => k.sign_with_rng(&mut OsRng, Pss::new::<Sha384>(), hash).map_err(rsa_err),
            CoseAlgorithm::PS512 => k.sign_with_rng(&mut OsRng, Pss::new::<Sha512>(), hash).map_err(rsa_err),
            _ => Err(CoseError::UnsupportedSigningAlg(alg.id())),
        },
        #[cfg(feature = "short-circuit")]
        SigningKey::Null => Ok(crate::short_circuit::short_circuit_signature(hash).to_vec()),
        _ => Err(CoseError::UnsupportedSigningAlg(alg.id())),
    }
}

/// Verify a signature over a Sig_structure digest.
///
/// Malformed signature bytes are reported the same way as a signature that
/// does not validate.
pub fn verify_prehash(
    alg: CoseAlgorithm,
    key: &VerificationKey,
    hash: &[u8],
    signature: &[u8],
) -> Result<(), CoseError> {
    if !key.supports(alg) {
        return Err(CoseError::WrongKeyType);
    }
    let bad = |_: signature::Error| CoseError::SignatureVerificationFailed;

    match key {
        VerificationKey::EcP256(k) => {
            let sig = p256::ecdsa::Signature::from_slice(signature).map_err(bad)?;
            k.verify_prehash(hash, &sig).map_err(bad)
        }
        VerificationKey::EcP384(k) => {
            let sig = p384::ecdsa::Signature::from_slice(signature).map_err(bad)?;
            k.verify_prehash(hash, &sig).map_err(bad)
        }
        VerificationKey::EcP521(k) => {
            let sig = p521::ecdsa::Signature::from_slice(signature).map_err(bad)?;
            k.verify_prehash(hash, &sig).map_err(bad)
        }
        VerificationKey::Rsa(k) => {
            let result = match alg {
                CoseAlgorithm::RS256 => k.verify(Pkcs1v15Sign::new::<Sha256>(), hash, signature),
                CoseAlgorithm::PS256 => k.verify(Pss::new::<Sha256>(), hash, signature),
                CoseAlgorithm::PS384 => k.verify(Pss::new::<Sha384>(), hash, signature),
                CoseAlgorithm::PS512 => k.verify(Pss::new::<Sha512>(), hash, signature),
                _ => return Err(CoseError::UnsupportedSigningAlg(alg.id())),
            };
            result.map_err(|_| CoseError::SignatureVerificationFailed)
        }
        #[cfg(feature = "short-circuit")]
        VerificationKey::Null => {
            if crate::short_circuit::short_circuit_signature(hash).as_slice() == signature {
                Ok(())
            } else {
                Err(CoseError::SignatureVerificationFailed)
            }
        }
        _ => Err(CoseError::UnsupportedSigningAlg(alg.id())),
    }
}

/// Sign the encoded Sig_structure with Ed25519.
pub fn sign_eddsa(key: &SigningKey, tbs: &[u8]) -> Result<Vec<u8>, CoseError> {
    match key {
        SigningKey::Ed25519(k) => Ok(k.sign(tbs).to_bytes().to_vec()),
        _ => Err(CoseError::WrongKeyType),
    }
}

/// Verify an Ed25519 signature over the encoded Sig_structure.
pub fn verify_eddsa(key: &VerificationKey, tbs: &[u8], signature: &[u8]) -> Result<(), CoseError> {
    let VerificationKey::Ed25519(k) = key else {
        return Err(CoseError::WrongKeyType);
    };
    let sig = ed25519_dalek::Signature::from_slice(signature).map_err(|_| CoseError::SignatureVerificationFailed)?;
    k.verify(tbs, &sig).map_err(|_| CoseError::SignatureVerificationFailed)
}
