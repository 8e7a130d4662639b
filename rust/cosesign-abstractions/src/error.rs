// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error taxonomy shared by the signing and verification crates.

use crate::parameters::HeaderLabel;

/// Coarse classification of a [`CoseError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// CBOR is malformed or the message shape is wrong.
    Format,
    /// A header parameter is duplicated, misplaced, malformed or an unknown critical label.
    Header,
    /// The algorithm is not supported by the invoked signer/verifier.
    Algorithm,
    /// Key ID mismatch or unusable key material.
    Key,
    /// Cryptographic verification failed.
    Signature,
    /// An output or digest buffer is too small.
    Buffer,
    /// The engine was configured or called incorrectly.
    Usage,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoseError {
    #[error("CBOR is not well formed: {0}")]
    CborNotWellFormed(String),

    #[error("malformed COSE message: {0}")]
    MessageFormat(String),

    #[error("malformed COSE_Signature: {0}")]
    SignatureFormat(String),

    #[error("malformed header parameter: {0}")]
    HeaderCbor(String),

    #[error("duplicate header parameter {0}")]
    DuplicateHeader(HeaderLabel),

    #[error("critical header parameter {0} is not understood")]
    UnknownCriticalHeader(HeaderLabel),

    #[error("invalid crit header parameter: {0}")]
    CritHeaderParam(String),

    #[error("header parameter {0} must be in the protected bucket")]
    HeaderNotProtected(HeaderLabel),

    #[error("content type must be a text string or an unsigned integer <= 65535")]
    BadContentType,

    #[error("algorithm identifier must be a non-zero 32-bit integer")]
    NonIntegerAlgId,

    #[error("no algorithm identifier in protected headers")]
    NoAlgId,

    #[error("unsupported signing algorithm {0}")]
    UnsupportedSigningAlg(i64),

    #[error("key ID does not match the verifier's key")]
    KidUnmatched,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("key type does not match the algorithm")]
    WrongKeyType,

    #[error("signature verification failed")]
    SignatureVerificationFailed,

    #[error("no signature was verified")]
    NoSignatureVerified,

    #[error("output buffer too small")]
    BufferTooSmall,

    #[error("digest larger than the hash buffer capacity")]
    HashBufferTooSmall,

    #[error("wrong number of signers ({0}) for the message type")]
    WrongSignerCount(usize),

    #[error("wrong number of verifiers ({0}) for the message type")]
    WrongVerifierCount(usize),

    #[error("short-circuit signing is not enabled")]
    ShortCircuitDisabled,

    #[error("payload is detached but none was supplied")]
    DetachedPayloadMissing,

    #[error("a detached payload was supplied but the message carries one")]
    PayloadNotDetached,

    #[error("signing failed: {0}")]
    Signing(String),
}

impl CoseError {
    pub fn kind(&self) -> ErrorKind {
        use CoseError::*;
        match self {
            CborNotWellFormed(_) | MessageFormat(_) | SignatureFormat(_) => ErrorKind::Format,
            HeaderCbor(_)
            | DuplicateHeader(_)
            | UnknownCriticalHeader(_)
            | CritHeaderParam(_)
            | HeaderNotProtected(_)
            | BadContentType
            | NonIntegerAlgId
            | NoAlgId => ErrorKind::Header,
            UnsupportedSigningAlg(_) => ErrorKind::Algorithm,
            KidUnmatched | InvalidKey(_) | WrongKeyType => ErrorKind::Key,
            SignatureVerificationFailed | NoSignatureVerified => ErrorKind::Signature,
            BufferTooSmall | HashBufferTooSmall => ErrorKind::Buffer,
            WrongSignerCount(_)
            | WrongVerifierCount(_)
            | ShortCircuitDisabled
            | DetachedPayloadMissing
            | PayloadNotDetached
            | Signing(_) => ErrorKind::Usage,
        }
    }

    /// `true` for the one error class the COSE_Sign verifier chain recovers from.
    pub fn is_unsupported_alg(&self) -> bool {
        matches!(self, CoseError::UnsupportedSigningAlg(_))
    }
}
