// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign and COSE_Sign1 signing and verification.
//!
//! Signers and verifiers are trait objects registered on a [`SignContext`] or
//! [`VerifyContext`]. Built-in variants:
//! - [`MainSigner`] / [`MainVerifier`]: ECDSA (P-256/384/521) and RSA (PSS, PKCS#1 v1.5)
//! - [`EddsaSigner`] / [`EddsaVerifier`]: Ed25519
//! - `ShortCircuitSigner` / `ShortCircuitVerifier` (feature `short-circuit`):
//!   non-cryptographic test signatures, also gated by `CoseOptions::allow_short_circuit`
//!
//! ```no_run
//! use cosesign::{CoseAlgorithm, CoseOptions, MainSigner, MainVerifier, SignContext, SigningKey, VerifyContext};
//!
//! let key = SigningKey::from(p256::ecdsa::SigningKey::random(&mut rand_core::OsRng));
//! let verifier = MainVerifier::new(key.verification_key());
//! let mut signer = MainSigner::new(CoseAlgorithm::ES256, key);
//!
//! let mut sign = SignContext::new(CoseOptions::default());
//! sign.add_signer(&mut signer);
//! let message = sign.sign_to_vec(b"", b"payload")?;
//!
//! let mut verify = VerifyContext::new(CoseOptions::default());
//! verify.add_verifier(&verifier);
//! assert_eq!(verify.verify(&message, b"")?.payload, b"payload");
//! # Ok::<(), cosesign::CoseError>(())
//! ```

pub mod crypto;
#[cfg(feature = "short-circuit")]
pub mod short_circuit;
pub mod sign;
pub mod signer;
pub mod verifier;
pub mod verify;

pub use cosesign_abstractions::{
    CoseAlgorithm, CoseError, CoseHashAlgorithm, CoseOptions, ErrorKind, HeaderLabel, HeaderLocation,
    HeaderParameter, HeaderParameters, HeaderValue, MessageType,
};
pub use crypto::{SigningKey, VerificationKey};
pub use sign::SignContext;
pub use signer::{CoseSigner, EddsaSigner, MainSigner};
pub use verifier::{decode_signature, CoseVerifier, DecodedSignature, EddsaVerifier, MainVerifier};
pub use verify::{VerifiedMessage, VerifyContext};

#[cfg(feature = "short-circuit")]
pub use short_circuit::{SHORT_CIRCUIT_KID, SHORT_CIRCUIT_SIGN1_OVERHEAD, SHORT_CIRCUIT_SIG_SIZE};
#[cfg(feature = "short-circuit")]
pub use signer::ShortCircuitSigner;
#[cfg(feature = "short-circuit")]
pub use verifier::ShortCircuitVerifier;
