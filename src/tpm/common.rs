// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::hash::MessageDigest;
use std::fmt;
use std::str::FromStr;

// See "TPM 2.0 Library, Part 2: Structures", Table 7
pub const TPM_GENERATED_VALUE: u32 = 0xff544347;

// Table 19
pub const TPM_ST_ATTEST_CERTIFY: u16 = 0x8017;

// Table 9
pub const TPM_ALG_RSA: u16 = 0x0001;
pub const TPM_ALG_SHA1: u16 = 0x0004;
pub const TPM_ALG_SHA256: u16 = 0x000b;
pub const TPM_ALG_SHA384: u16 = 0x000c;
pub const TPM_ALG_SHA512: u16 = 0x000d;
pub const TPM_ALG_MGF1: u16 = 0x0007;
pub const TPM_ALG_NULL: u16 = 0x0010;
pub const TPM_ALG_RSASSA: u16 = 0x0014;
pub const TPM_ALG_RSAES: u16 = 0x0015;
pub const TPM_ALG_RSAPSS: u16 = 0x0016;
pub const TPM_ALG_OAEP: u16 = 0x0017;
pub const TPM_ALG_ECDSA: u16 = 0x0018;
pub const TPM_ALG_ECDH: u16 = 0x0019;
pub const TPM_ALG_ECDAA: u16 = 0x001a;
pub const TPM_ALG_SM2: u16 = 0x001b;
pub const TPM_ALG_ECSCHNORR: u16 = 0x001c;
pub const TPM_ALG_ECMQV: u16 = 0x001d;
pub const TPM_ALG_KDF1_SP800_56A: u16 = 0x0020;
pub const TPM_ALG_KDF2: u16 = 0x0021;
pub const TPM_ALG_KDF1_SP800_108: u16 = 0x0022;
pub const TPM_ALG_ECC: u16 = 0x0023;

// Table 10
pub const TPM_ECC_NIST_P256: u16 = 0x0003;
pub const TPM_ECC_NIST_P384: u16 = 0x0004;
pub const TPM_ECC_NIST_P521: u16 = 0x0005;

// See https://www.iana.org/assignments/cose/cose.xhtml#algorithms
const COSE_ALG_RS1: i128 = -65535;
const COSE_ALG_RS256: i128 = -257;
const COSE_ALG_RS384: i128 = -258;
const COSE_ALG_RS512: i128 = -259;
const COSE_ALG_ES256: i128 = -7;
const COSE_ALG_ES384: i128 = -35;
const COSE_ALG_ES512: i128 = -36;

/// Digest algorithms usable both for object names and for signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlg {
    /// Lookup the digest algorithm matching a TPM_ALG_ID
    pub fn from_tpm_alg(id: u16) -> Result<HashAlg, Error> {
        match id {
            TPM_ALG_SHA1 => Ok(HashAlg::Sha1),
            TPM_ALG_SHA256 => Ok(HashAlg::Sha256),
            TPM_ALG_SHA384 => Ok(HashAlg::Sha384),
            TPM_ALG_SHA512 => Ok(HashAlg::Sha512),
            x => Err(Error::UnsupportedAlgorithm(format!(
                "TPM algorithm id {x:#06x}"
            ))),
        }
    }

    /// Lookup the digest algorithm used by a COSE signature algorithm
    pub fn from_cose_alg(alg: i128) -> Result<HashAlg, Error> {
        match alg {
            COSE_ALG_RS1 => Ok(HashAlg::Sha1),
            COSE_ALG_RS256 | COSE_ALG_ES256 => Ok(HashAlg::Sha256),
            COSE_ALG_RS384 | COSE_ALG_ES384 => Ok(HashAlg::Sha384),
            COSE_ALG_RS512 | COSE_ALG_ES512 => Ok(HashAlg::Sha512),
            x => Err(Error::UnsupportedAlgorithm(format!("COSE algorithm {x}"))),
        }
    }

    pub fn tpm_alg(&self) -> u16 {
        match self {
            HashAlg::Sha1 => TPM_ALG_SHA1,
            HashAlg::Sha256 => TPM_ALG_SHA256,
            HashAlg::Sha384 => TPM_ALG_SHA384,
            HashAlg::Sha512 => TPM_ALG_SHA512,
        }
    }

    pub fn message_digest(&self) -> MessageDigest {
        match self {
            HashAlg::Sha1 => MessageDigest::sha1(),
            HashAlg::Sha256 => MessageDigest::sha256(),
            HashAlg::Sha384 => MessageDigest::sha384(),
            HashAlg::Sha512 => MessageDigest::sha512(),
        }
    }
}

/// Accepts the usual spellings of a digest name: "SHA256", "sha256" and the
/// IANA hash function text name "sha-256".
impl FromStr for HashAlg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" => Ok(HashAlg::Sha1),
            "sha256" | "sha-256" => Ok(HashAlg::Sha256),
            "sha384" | "sha-384" => Ok(HashAlg::Sha384),
            "sha512" | "sha-512" => Ok(HashAlg::Sha512),
            _ => Err(Error::UnsupportedAlgorithm(format!("hash algorithm {s:?}"))),
        }
    }
}

impl fmt::Display for HashAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HashAlg::Sha1 => "SHA1",
            HashAlg::Sha256 => "SHA256",
            HashAlg::Sha384 => "SHA384",
            HashAlg::Sha512 => "SHA512",
        };
        f.write_str(s)
    }
}
