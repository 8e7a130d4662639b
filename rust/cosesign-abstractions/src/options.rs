// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// CBOR tag for COSE_Sign1.
pub const COSE_SIGN1_TAG: u64 = 18;

/// CBOR tag for COSE_Sign.
pub const COSE_SIGN_TAG: u64 = 98;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageType {
    /// Single signature, `[protected, unprotected, payload, signature]`.
    Sign1,
    /// One or more signatures, `[protected, unprotected, payload, [COSE_Signature, ...]]`.
    Sign,
}

impl MessageType {
    pub fn cbor_tag(self) -> u64 {
        match self {
            MessageType::Sign1 => COSE_SIGN1_TAG,
            MessageType::Sign => COSE_SIGN_TAG,
        }
    }

    pub fn from_cbor_tag(tag: u64) -> Option<Self> {
        match tag {
            COSE_SIGN1_TAG => Some(MessageType::Sign1),
            COSE_SIGN_TAG => Some(MessageType::Sign),
            _ => None,
        }
    }
}

/// Options passed down from the orchestrators to every signer and verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoseOptions {
    /// Message shape. `None` lets the orchestrator decide (signer count when
    /// signing, CBOR tag or array shape when verifying).
    pub message_type: Option<MessageType>,

    /// Do not emit the leading CBOR tag when signing.
    pub omit_cbor_tag: bool,

    /// Check structure, algorithm and key ID but skip cryptographic verification.
    pub decode_only: bool,

    /// Runtime switch for the short-circuit signer/verifier. Off unless set.
    pub allow_short_circuit: bool,

    /// For COSE_Sign, fail when any signature is not accepted by a verifier.
    pub verify_all_signatures: bool,
}

impl CoseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    pub fn without_cbor_tag(mut self) -> Self {
        self.omit_cbor_tag = true;
        self
    }

    pub fn with_decode_only(mut self) -> Self {
        self.decode_only = true;
        self
    }

    pub fn with_short_circuit(mut self) -> Self {
        self.allow_short_circuit = true;
        self
    }

    pub fn with_all_signatures_required(mut self) -> Self {
        self.verify_all_signatures = true;
        self
    }

    /// `true` when the caller explicitly asked for COSE_Sign.
    pub fn is_sign(&self) -> bool {
        self.message_type == Some(MessageType::Sign)
    }
}
