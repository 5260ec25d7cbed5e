// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The attestation module provides a [`KeyAttestation`] object holding the
//! evidence produced by TPM2_Certify together with the verifier's
//! expectations, and the business logic to verify it.
//!
//! # Example
//!
//! The following example assumes that `statement` contains a CBOR encoded
//! TPM attestation statement, `ak` the PEM encoded attestation key and
//! `challenge` the qualifying data that was handed to the TPM.
//!
//! ```no_run
//! use openssl::pkey::PKey;
//! use tpmattest::attestation::Statement;
//!
//! # let statement: Vec<u8> = vec![];
//! # let ak: Vec<u8> = vec![];
//! # let challenge: Vec<u8> = vec![];
//! let st = Statement::decode(statement.as_slice()).expect("decoding statement");
//!
//! let key = PKey::public_key_from_pem(&ak).expect("loading AK");
//!
//! let ka = st
//!     .key_attestation(key, &challenge)
//!     .expect("setting up verification");
//!
//! // verify the signature over certInfo, then check the TPM magic, the
//! // qualifying data and the name of the certified key
//! match ka.verify() {
//!     Ok(()) => println!("key attested"),
//!     Err(e) => println!("attestation rejected: {e}"),
//! }
//!
//! // or, as an AR4SI trustworthiness vector
//! let tvec = ka.appraise();
//! ```

pub use self::base64::decode_str;
pub use self::errors::Error;
pub use self::keyattestation::KeyAttestation;
pub use self::signature::verify_signature;
pub use self::statement::Statement;

mod base64;
mod errors;
mod keyattestation;
mod signature;
mod statement;
