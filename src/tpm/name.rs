// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::common::HashAlg;
use super::errors::Error;
use openssl::hash::hash;

/// Compute the TPM name of a marshalled object: the big-endian name
/// algorithm id followed by the digest of the object under that algorithm.
pub fn compute_name(name_alg: u16, object: &[u8]) -> Result<Vec<u8>, Error> {
    let alg = HashAlg::from_tpm_alg(name_alg)?;

    let digest = hash(alg.message_digest(), object)
        .map_err(|e| Error::BadInternalState(format!("computing {alg} digest: {e}")))?;

    let mut name = Vec::with_capacity(2 + digest.len());
    name.extend_from_slice(&name_alg.to_be_bytes());
    name.extend_from_slice(&digest);

    Ok(name)
}

/// Extract the name algorithm id from the first two bytes of a name
pub fn name_alg(name: &[u8]) -> Option<u16> {
    match name {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tpm::common::*;
    use hex_literal::hex;

    #[test]
    fn sha1_name() {
        let name = compute_name(TPM_ALG_SHA1, b"abc").unwrap();

        assert_eq!(
            name,
            hex!("0004 a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }

    #[test]
    fn sha256_name() {
        let name = compute_name(TPM_ALG_SHA256, b"abc").unwrap();

        assert_eq!(
            name,
            hex!("000b ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn unknown_name_alg() {
        assert!(matches!(
            compute_name(TPM_ALG_NULL, b"abc"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn name_alg_prefix() {
        assert_eq!(name_alg(&hex!("000b 00")), Some(TPM_ALG_SHA256));
        assert_eq!(name_alg(&hex!("0004")), Some(TPM_ALG_SHA1));
        assert_eq!(name_alg(&hex!("00")), None);
        assert_eq!(name_alg(&[]), None);
    }
}
