// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! CBOR plumbing shared by COSE signers and verifiers.
//!
//! - [`encoder`]: an encoder that either writes into a fixed-capacity buffer or only counts bytes
//! - [`header_map`]: header parameter decode/encode with `crit` and placement enforcement
//! - [`sig_structure`]: the to-be-signed `Sig_structure` and its digest

pub mod encoder;
pub mod header_map;
pub mod sig_structure;

pub use encoder::{CoseEncoder, EncodeMode};
pub use header_map::{decode_headers, encode_headers, encode_protected_headers, DecodedHeaders, MAX_HEADER_NESTING};
pub use sig_structure::{
    build_tbs_hash, encode_tbs, tbs_hash, Tbs, TbsHash, MAX_HASH_SIZE, SIG_STRUCTURE_CONTEXT_SIGNATURE,
    SIG_STRUCTURE_CONTEXT_SIGNATURE1,
};
