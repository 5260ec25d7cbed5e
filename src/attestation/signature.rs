// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use crate::tpm::HashAlg;
use openssl::pkey::{HasPublic, PKeyRef};
use openssl::sign::Verifier;

/// Verify `sig` over `data` with the given key and digest.  RSA keys use
/// PKCS#1 v1.5 padding, EC keys expect a DER-encoded ECDSA signature.
///
/// Any failure, including a signature that is not well-formed for the key
/// type, is reported as [`Error::SignatureInvalid`].
pub fn verify_signature<T: HasPublic>(
    key: &PKeyRef<T>,
    hash_alg: HashAlg,
    data: &[u8],
    sig: &[u8],
) -> Result<(), Error> {
    let mut verifier = Verifier::new(hash_alg.message_digest(), key).map_err(|e| {
        Error::SignatureInvalid(format!("{:?} key with {hash_alg}: {e}", key.id()))
    })?;

    verifier
        .update(data)
        .map_err(|e| Error::SignatureInvalid(e.to_string()))?;

    match verifier.verify(sig) {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::SignatureInvalid(format!(
            "{hash_alg} signature does not match"
        ))),
        Err(e) => Err(Error::SignatureInvalid(format!(
            "{hash_alg} signature rejected: {e}"
        ))),
    }
}
