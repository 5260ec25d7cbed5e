// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! TPM 2.0 key attestation verification.
//!
//! This crate provides an API to decode and verify the evidence produced by
//! a TPM when an attestation key certifies another object (TPM2_Certify).
//! For detailed information about the structures involved, see "TPM 2.0
//! Library, Part 2: Structures" [TPM2].
//!
//! The API allows:
//! * Decoding the signed TPMS_ATTEST and the TPMT_PUBLIC of the certified key
//! * Decoding a CBOR-encoded "tpm" attestation statement as used by WebAuthn
//! * Cryptographically verifying the certification and its binding to the
//!   certified object and to the relying party's qualifying data
//!
//! [TPM2]: https://trustedcomputinggroup.org/resource/tpm-library-specification/

pub mod attestation;
pub mod tpm;
