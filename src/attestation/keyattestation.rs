// Copyright 2023-2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::signature::verify_signature;
use crate::tpm::{compute_name, name_alg, HashAlg, SAttest, TPM_GENERATED_VALUE};
use ear::claim::*;
use ear::TrustVector;
use openssl::memcmp;
use openssl::pkey::{PKey, Public};

/// Collects the inputs needed to check a TPM2_Certify attestation: the
/// marshalled TPMS_ATTEST and its signature, the marshalled object that was
/// certified, the attestation key with the digest it signs with, and the
/// qualifying data the relying party handed to the TPM.
pub struct KeyAttestation {
    certify_info: Vec<u8>,
    signature: Vec<u8>,
    attested_object: Vec<u8>,
    attestation_key: PKey<Public>,
    hash_alg: String,
    qualifying_data: Vec<u8>,
}

impl KeyAttestation {
    pub fn new(
        certify_info: &[u8],
        signature: &[u8],
        attested_object: &[u8],
        attestation_key: PKey<Public>,
        hash_alg: &str,
        qualifying_data: &[u8],
    ) -> Self {
        Self {
            certify_info: certify_info.to_vec(),
            signature: signature.to_vec(),
            attested_object: attested_object.to_vec(),
            attestation_key,
            hash_alg: hash_alg.to_string(),
            qualifying_data: qualifying_data.to_vec(),
        }
    }

    /// Cryptographically verify the certification and check that it binds
    /// the attested object and the qualifying data.  Checks are run in this
    /// order and the first failing one is reported:
    ///
    /// 1. signature over the certification bytes as received
    /// 2. decoding of the certification
    /// 3. TPM_GENERATED_VALUE magic
    /// 4. extra data against the qualifying data
    /// 5. attested name against the name recomputed from the attested object
    pub fn verify(&self) -> Result<(), Error> {
        self.verify_signature().map_err(|e| {
            log::debug!("certification signature: {e:?}");
            e
        })?;

        let attest = SAttest::decode(&self.certify_info).map_err(|e| {
            log::debug!("decoding certification: {e:?}");
            Error::MalformedCertification(format!("{e:?}"))
        })?;

        if attest.magic != TPM_GENERATED_VALUE {
            log::debug!("magic {:#010x} is not TPM_GENERATED_VALUE", attest.magic);

            return Err(Error::MagicMismatch(format!(
                "expecting {TPM_GENERATED_VALUE:#010x}, got {:#010x}",
                attest.magic
            )));
        }

        if !bytes_eq(&attest.extra_data, &self.qualifying_data) {
            log::debug!("extra data does not match the qualifying data");

            return Err(Error::ExtraDataMismatch(format!(
                "{} bytes of extra data, {} bytes of qualifying data",
                attest.extra_data.len(),
                self.qualifying_data.len()
            )));
        }

        self.check_name(&attest.attested.name).map_err(|e| {
            log::debug!("attested name: {e:?}");
            e
        })
    }

    /// Collapse the outcome of [`KeyAttestation::verify`] into a boolean
    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }

    /// Run the verification and record its outcome in an AR4SI trust vector.
    /// Failures caused by the verifier itself are reported as
    /// `VERIFIER_MALFUNCTION` so that they can be told apart from bad
    /// evidence.
    pub fn appraise(&self) -> TrustVector {
        let mut tvec = TrustVector::default();

        match self.verify() {
            Ok(()) => tvec.instance_identity.set(TRUSTWORTHY_INSTANCE),
            Err(e) => match e {
                Error::SignatureInvalid(_) | Error::MagicMismatch(_) | Error::NameMismatch(_) => {
                    tvec.set_all(CRYPTO_VALIDATION_FAILED)
                }
                Error::BadInternalState(_) => tvec.instance_identity.set(VERIFIER_MALFUNCTION),
                _ => tvec.set_all(UNEXPECTED_EVIDENCE),
            },
        }

        tvec
    }

    fn verify_signature(&self) -> Result<(), Error> {
        let hash_alg: HashAlg = self.hash_alg.parse()?;

        verify_signature(
            &self.attestation_key,
            hash_alg,
            &self.certify_info,
            &self.signature,
        )
    }

    // the name algorithm comes from the attested name itself and is unrelated
    // to the signature digest
    fn check_name(&self, name: &[u8]) -> Result<(), Error> {
        let alg = name_alg(name).ok_or_else(|| {
            Error::NameMismatch(format!("{} bytes are not a valid name", name.len()))
        })?;

        let expected = compute_name(alg, &self.attested_object)?;

        log::trace!(
            "attested name: {}, computed name: {}",
            hex::encode(name),
            hex::encode(&expected)
        );

        if !bytes_eq(&expected, name) {
            return Err(Error::NameMismatch(format!(
                "name with algorithm {alg:#06x} does not match the attested object"
            )));
        }

        Ok(())
    }
}

fn bytes_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && memcmp::eq(a, b)
}
