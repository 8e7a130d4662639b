// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Short-circuit "signatures" for tests and size planning.
//!
//! The signature is the Sig_structure hash repeated to a fixed width. It has the
//! same structure as a real signature but proves nothing. The well-known key ID
//! lets verifiers recognize it, and only the short-circuit algorithm IDs are
//! ever accepted for it.

/// Width of every short-circuit signature, independent of the hash used.
pub const SHORT_CIRCUIT_SIG_SIZE: usize = 64;

/// Reserved key ID carried by every short-circuit signature.
pub const SHORT_CIRCUIT_KID: [u8; 32] = [
    0xef, 0x95, 0x4b, 0x4b, 0xd9, 0xbd, 0xf6, 0x70, 0xd0, 0x33, 0x60, 0x82, 0xf5, 0xef, 0x15, 0x2a, 0xf8, 0xf3,
    0x5b, 0x6a, 0x6c, 0x00, 0xef, 0xa6, 0xa9, 0xa7, 0x1f, 0x49, 0x51, 0x7e, 0x18, 0xc6,
];

/// Bytes a tagged short-circuit COSE_Sign1 adds on top of a payload of
/// 24..=255 bytes, with no other header parameters.
///
/// tag (1) + array (1) + protected `{1: alg}` bstr (8) + unprotected `{4: kid}` (36)
/// + payload bstr head (2) + signature bstr (2 + 64).
pub const SHORT_CIRCUIT_SIGN1_OVERHEAD: usize = 114;

/// The short-circuit signature for a Sig_structure hash.
pub fn short_circuit_signature(hash: &[u8]) -> [u8; SHORT_CIRCUIT_SIG_SIZE] {
    let mut sig = [0u8; SHORT_CIRCUIT_SIG_SIZE];
    for (dst, src) in sig.iter_mut().zip(hash.iter().cycle()) {
        *dst = *src;
    }
    sig
}
