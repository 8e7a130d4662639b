// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Short-circuit signing: shape, gating and isolation from real algorithms.

#![cfg(feature = "short-circuit")]

mod common;

use common::*;
use cosesign::{
    CoseAlgorithm, CoseError, CoseOptions, MainSigner, MainVerifier, MessageType, ShortCircuitSigner,
    ShortCircuitVerifier, SignContext, SigningKey, VerifyContext, SHORT_CIRCUIT_KID, SHORT_CIRCUIT_SIGN1_OVERHEAD,
};

fn allowed() -> CoseOptions {
    CoseOptions::default().with_short_circuit()
}

/// A 128-byte payload yields a message of payload plus the fixed overhead.
#[test]
fn sign1_size_and_round_trip() {
    let payload = [0x5a; 128];
    let mut signer = ShortCircuitSigner::default();
    let msg = sign_one(&mut signer, allowed(), b"", &payload).unwrap();
    assert_eq!(msg.len(), payload.len() + SHORT_CIRCUIT_SIGN1_OVERHEAD);

    let verified = verify_one(&ShortCircuitVerifier::new(), allowed(), &msg, b"").unwrap();
    assert_eq!(verified.payload, payload);
    assert_eq!(verified.body_parameters.find_kid(), Some(SHORT_CIRCUIT_KID.as_slice()));
    assert_eq!(verified.body_parameters.find_alg_id(), Some(CoseAlgorithm::ShortCircuit256.id()));
}

/// All three short-circuit algorithms round-trip and detect tampering.
#[test]
fn all_short_circuit_algorithms() {
    for alg in [CoseAlgorithm::ShortCircuit256, CoseAlgorithm::ShortCircuit384, CoseAlgorithm::ShortCircuit512] {
        let (mut signer, verifier) = signer_and_verifier(alg);
        let options = options_for(alg);
        let msg = sign_one(signer.as_mut(), options.clone(), b"aad", b"short circuit payload").unwrap();
        assert!(verify_one(verifier.as_ref(), options.clone(), &msg, b"aad").is_ok(), "{alg:?}");

        let tampered = flip_bit(&msg, find(&msg, b"short circuit payload"));
        assert_eq!(
            verify_one(verifier.as_ref(), options, &tampered, b"aad").unwrap_err(),
            CoseError::SignatureVerificationFailed
        );
    }
}

/// Short-circuit and real algorithms never accept each other's messages.
#[test]
fn isolated_from_real_algorithms() {
    let mut sc_signer = ShortCircuitSigner::default();
    let sc_msg = sign_one(&mut sc_signer, allowed(), b"", b"payload").unwrap();
    let real = MainVerifier::new(SigningKey::from(p256_key()).verification_key());
    assert_eq!(
        verify_one(&real, allowed(), &sc_msg, b"").unwrap_err(),
        CoseError::UnsupportedSigningAlg(CoseAlgorithm::ShortCircuit256.id())
    );

    let mut es_signer = MainSigner::new(CoseAlgorithm::ES256, p256_key());
    let es_msg = sign_one(&mut es_signer, allowed(), b"", b"payload").unwrap();
    assert_eq!(
        verify_one(&ShortCircuitVerifier::new(), allowed(), &es_msg, b"").unwrap_err(),
        CoseError::UnsupportedSigningAlg(CoseAlgorithm::ES256.id())
    );

    let mut wrong = ShortCircuitSigner::new(CoseAlgorithm::ES256);
    assert_eq!(
        sign_one(&mut wrong, allowed(), b"", b"payload").unwrap_err(),
        CoseError::UnsupportedSigningAlg(CoseAlgorithm::ES256.id())
    );
}

/// Both sides refuse short-circuit unless the option is set.
#[test]
fn disabled_by_default() {
    let mut signer = ShortCircuitSigner::default();
    assert_eq!(sign_one(&mut signer, CoseOptions::default(), b"", b"x").unwrap_err(), CoseError::ShortCircuitDisabled);

    let mut sizing = SignContext::new(CoseOptions::default());
    sizing.add_signer(&mut signer);
    assert_eq!(sizing.encoded_size(b"", b"x", false).unwrap_err(), CoseError::ShortCircuitDisabled);
    drop(sizing);

    let msg = sign_one(&mut signer, allowed(), b"", b"x").unwrap();
    assert_eq!(
        verify_one(&ShortCircuitVerifier::new(), CoseOptions::default(), &msg, b"").unwrap_err(),
        CoseError::ShortCircuitDisabled
    );
    // The flag is checked even when only decoding.
    assert_eq!(
        verify_one(&ShortCircuitVerifier::new(), CoseOptions::default().with_decode_only(), &msg, b"").unwrap_err(),
        CoseError::ShortCircuitDisabled
    );
}

/// The reserved key ID must be present and exact.
#[test]
fn reserved_kid_required() {
    let mut signer = ShortCircuitSigner::default();
    let msg = sign_one(&mut signer, allowed(), b"", b"x").unwrap();

    let mut other_kid = msg.clone();
    let at = find(&msg, &SHORT_CIRCUIT_KID);
    other_kid[at..at + SHORT_CIRCUIT_KID.len()].fill(0x11);
    assert_eq!(
        verify_one(&ShortCircuitVerifier::new(), allowed(), &other_kid, b"").unwrap_err(),
        CoseError::KidUnmatched
    );

    // Same message without the unprotected kid: protected bytes and signature unchanged.
    let protected = int_map(&[(1, &cbor_int(CoseAlgorithm::ShortCircuit256.id()))]);
    let signature = &msg[msg.len() - 64..];
    let no_kid = encode_cose_sign1(true, &protected, &int_map(&[]), Some(b"x"), signature);
    assert_eq!(
        verify_one(&ShortCircuitVerifier::new(), allowed(), &no_kid, b"").unwrap_err(),
        CoseError::KidUnmatched
    );
}

/// Short-circuit and real signatures can share a COSE_Sign.
#[test]
fn mixed_sign_message() {
    let key = SigningKey::from(p256_key());
    let real_verifier = MainVerifier::new(key.verification_key());
    let mut real = MainSigner::new(CoseAlgorithm::ES256, key);
    let mut sc = ShortCircuitSigner::new(CoseAlgorithm::ShortCircuit384);

    let mut ctx = SignContext::new(allowed());
    ctx.add_signer(&mut sc);
    ctx.add_signer(&mut real);
    let msg = ctx.sign_to_vec(b"", b"mixed").unwrap();
    drop(ctx);

    let sc_verifier = ShortCircuitVerifier::new();
    let mut vctx = VerifyContext::new(allowed());
    vctx.add_verifier(&real_verifier);
    vctx.add_verifier(&sc_verifier);
    let verified = vctx.verify(&msg, b"").unwrap();
    assert_eq!(verified.message_type, MessageType::Sign);
    assert_eq!(verified.verified_signatures, 2);

    // Only the real signature counts when the short-circuit verifier is absent.
    let mut vctx = VerifyContext::new(allowed());
    vctx.add_verifier(&real_verifier);
    assert_eq!(vctx.verify(&msg, b"").unwrap().verified_signatures, 1);
}
