// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The tpm module provides decoders (and matching encoders) for the TPM 2.0
//! structures involved in key attestation: the [`SAttest`] signed by the
//! attestation key and the [`TPublic`] area of the certified object, plus
//! the algorithm tables and the computation of object names.
//!
//! # Example
//!
//! ```
//! use tpmattest::tpm::{compute_name, SAttest, TPM_ALG_SHA256};
//!
//! let object = b"marshalled TPMT_PUBLIC";
//!
//! let mut certify_info = SAttest::new();
//! certify_info.extra_data = b"nonce".to_vec();
//! certify_info.attested.name = compute_name(TPM_ALG_SHA256, object).unwrap();
//!
//! let buf = certify_info.encode().unwrap();
//!
//! let decoded = SAttest::decode(&buf).expect("decoding TPMS_ATTEST");
//! assert_eq!(decoded, certify_info);
//! ```

pub use self::common::*;
pub use self::errors::Error;
pub use self::name::{compute_name, name_alg};
pub use self::sattest::{CertifyInfo, ClockInfo, SAttest};
pub use self::tpublic::{PublicParms, Scheme, SymDefObject, TPublic};

mod common;
mod errors;
mod marshal;
mod name;
mod sattest;
mod tpublic;
