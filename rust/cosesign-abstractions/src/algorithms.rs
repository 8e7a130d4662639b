// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// COSE signing algorithms understood by the engine (IANA COSE Algorithms registry).
///
/// The short-circuit identifiers are private-use values reserved for the
/// non-cryptographic test signer. They are never accepted by a real verifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum CoseAlgorithm {
    /// ECDSA w/ SHA-256 over P-256.
    ES256 = -7,
    /// ECDSA w/ SHA-384 over P-384.
    ES384 = -35,
    /// ECDSA w/ SHA-512 over P-521.
    ES512 = -36,
    /// Ed25519 (pure EdDSA, no pre-hash).
    EdDSA = -8,
    /// RSASSA-PSS w/ SHA-256.
    PS256 = -37,
    /// RSASSA-PSS w/ SHA-384.
    PS384 = -38,
    /// RSASSA-PSS w/ SHA-512.
    PS512 = -39,
    /// RSASSA-PKCS1v1.5 w/ SHA-256.
    RS256 = -257,
    /// Short-circuit test signature over a SHA-256 TBS hash.
    ShortCircuit256 = -1_000_256,
    /// Short-circuit test signature over a SHA-384 TBS hash.
    ShortCircuit384 = -1_000_384,
    /// Short-circuit test signature over a SHA-512 TBS hash.
    ShortCircuit512 = -1_000_512,
}

/// Hash algorithms used to reduce the Sig_structure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CoseHashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl CoseHashAlgorithm {
    pub fn digest_len(self) -> usize {
        match self {
            CoseHashAlgorithm::Sha256 => 32,
            CoseHashAlgorithm::Sha384 => 48,
            CoseHashAlgorithm::Sha512 => 64,
        }
    }
}

impl CoseAlgorithm {
    pub const ALL: [CoseAlgorithm; 11] = [
        CoseAlgorithm::ES256,
        CoseAlgorithm::ES384,
        CoseAlgorithm::ES512,
        CoseAlgorithm::EdDSA,
        CoseAlgorithm::PS256,
        CoseAlgorithm::PS384,
        CoseAlgorithm::PS512,
        CoseAlgorithm::RS256,
        CoseAlgorithm::ShortCircuit256,
        CoseAlgorithm::ShortCircuit384,
        CoseAlgorithm::ShortCircuit512,
    ];

    /// The integer carried in the `alg` header parameter.
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.id() == id)
    }

    /// Hash applied to the Sig_structure before signing.
    ///
    /// `None` for EdDSA, which signs the encoded Sig_structure directly.
    pub fn hash_algorithm(self) -> Option<CoseHashAlgorithm> {
        match self {
            CoseAlgorithm::ES256 | CoseAlgorithm::PS256 | CoseAlgorithm::RS256 | CoseAlgorithm::ShortCircuit256 => {
                Some(CoseHashAlgorithm::Sha256)
            }
            CoseAlgorithm::ES384 | CoseAlgorithm::PS384 | CoseAlgorithm::ShortCircuit384 => {
                Some(CoseHashAlgorithm::Sha384)
            }
            CoseAlgorithm::ES512 | CoseAlgorithm::PS512 | CoseAlgorithm::ShortCircuit512 => {
                Some(CoseHashAlgorithm::Sha512)
            }
            CoseAlgorithm::EdDSA => None,
        }
    }

    pub fn is_ecdsa(self) -> bool {
        matches!(self, CoseAlgorithm::ES256 | CoseAlgorithm::ES384 | CoseAlgorithm::ES512)
    }

    pub fn is_rsa(self) -> bool {
        matches!(
            self,
            CoseAlgorithm::PS256 | CoseAlgorithm::PS384 | CoseAlgorithm::PS512 | CoseAlgorithm::RS256
        )
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(
            self,
            CoseAlgorithm::ShortCircuit256 | CoseAlgorithm::ShortCircuit384 | CoseAlgorithm::ShortCircuit512
        )
    }
}

impl TryFrom<i64> for CoseAlgorithm {
    type Error = crate::CoseError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(crate::CoseError::UnsupportedSigningAlg(id))
    }
}
