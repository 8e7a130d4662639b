// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared datatypes for the COSE_Sign / COSE_Sign1 signing crates.
//!
//! This crate keeps the types every other crate needs in one place:
//! - header parameter labels, values and their location metadata
//! - the COSE algorithm registry used by signers and verifiers
//! - the option set threaded through sign/verify calls
//! - the error taxonomy

pub mod algorithms;
pub mod error;
pub mod options;
pub mod parameters;

pub use algorithms::{CoseAlgorithm, CoseHashAlgorithm};
pub use error::{CoseError, ErrorKind};
pub use options::{CoseOptions, MessageType, COSE_SIGN1_TAG, COSE_SIGN_TAG};
pub use parameters::{
    HeaderLabel, HeaderLocation, HeaderParameter, HeaderParameters, HeaderValue, LABEL_ALG, LABEL_CONTENT_TYPE,
    LABEL_CRIT, LABEL_IV, LABEL_KID, LABEL_PARTIAL_IV,
};
