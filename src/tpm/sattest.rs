// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::common::*;
use super::errors::Error;
use super::marshal::{Reader, Writer};
use serde::Serialize;

/// TPMS_CLOCK_INFO
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ClockInfo {
    pub clock: u64,
    pub reset_count: u32,
    pub restart_count: u32,
    pub safe: u8,
}

/// TPMS_CERTIFY_INFO
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CertifyInfo {
    /// Name of the certified object: `nameAlg || H(TPMT_PUBLIC)`
    #[serde(serialize_with = "hex::serde::serialize")]
    pub name: Vec<u8>,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub qualified_name: Vec<u8>,
}

/// For syntax and semantics of the structure, see §10.12.12 of "TPM 2.0
/// Library, Part 2: Structures".  Only the certify variant of the attested
/// union is supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SAttest {
    pub magic: u32,
    pub attested_type: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub qualified_signer: Vec<u8>,
    /// The qualifying data supplied by the caller of TPM2_Certify
    #[serde(serialize_with = "hex::serde::serialize")]
    pub extra_data: Vec<u8>,
    pub clock_info: ClockInfo,
    pub firmware_version: u64,
    pub attested: CertifyInfo,
}

impl Default for SAttest {
    fn default() -> Self {
        Self::new()
    }
}

impl SAttest {
    /// Return a certify structure carrying the TPM-generated magic and
    /// otherwise empty fields
    pub fn new() -> Self {
        Self {
            magic: TPM_GENERATED_VALUE,
            attested_type: TPM_ST_ATTEST_CERTIFY,
            qualified_signer: Default::default(),
            extra_data: Default::default(),
            clock_info: Default::default(),
            firmware_version: 0,
            attested: Default::default(),
        }
    }

    /// Decode a marshalled TPMS_ATTEST.  The magic is decoded but not
    /// checked: that is up to the verifier.
    pub fn decode(buf: &[u8]) -> Result<SAttest, Error> {
        let mut r = Reader::new(buf);

        let magic = r.read_u32("magic")?;
        let attested_type = r.read_u16("type")?;
        let qualified_signer = r.read_tpm2b("qualifiedSigner")?;
        let extra_data = r.read_tpm2b("extraData")?;

        let clock_info = ClockInfo {
            clock: r.read_u64("clockInfo.clock")?,
            reset_count: r.read_u32("clockInfo.resetCount")?,
            restart_count: r.read_u32("clockInfo.restartCount")?,
            safe: r.read_u8("clockInfo.safe")?,
        };

        let firmware_version = r.read_u64("firmwareVersion")?;

        if attested_type != TPM_ST_ATTEST_CERTIFY {
            return Err(Error::Syntax(format!(
                "unsupported attestation type {attested_type:#06x}"
            )));
        }

        let attested = CertifyInfo {
            name: r.read_tpm2b("attested.name")?,
            qualified_name: r.read_tpm2b("attested.qualifiedName")?,
        };

        r.finish("TPMS_ATTEST")?;

        Ok(SAttest {
            magic,
            attested_type,
            qualified_signer,
            extra_data,
            clock_info,
            firmware_version,
            attested,
        })
    }

    /// Marshal into TPMS_ATTEST wire format
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut w = Writer::new();

        w.u32(self.magic)
            .u16(self.attested_type)
            .tpm2b(&self.qualified_signer, "qualifiedSigner")?
            .tpm2b(&self.extra_data, "extraData")?
            .u64(self.clock_info.clock)
            .u32(self.clock_info.reset_count)
            .u32(self.clock_info.restart_count)
            .u8(self.clock_info.safe)
            .u64(self.firmware_version)
            .tpm2b(&self.attested.name, "attested.name")?
            .tpm2b(&self.attested.qualified_name, "attested.qualifiedName")?;

        Ok(w.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // TPMS_ATTEST from TPM2_Certify with a SHA-256 name and a 4 byte nonce
    const TEST_CERTIFY_INFO: &[u8] = &hex!(
        "ff544347"
        "8017"
        "0000"
        "0004 cafebabe"
        "0000000000001234 00000002 00000003 01"
        "2021030500000000"
        "0022 000b"
        "0101010101010101010101010101010101010101010101010101010101010101"
        "0000"
    );

    #[test]
    fn decode_certify_info() {
        let a = SAttest::decode(TEST_CERTIFY_INFO).expect("decoding TEST_CERTIFY_INFO");

        assert_eq!(a.magic, TPM_GENERATED_VALUE);
        assert_eq!(a.attested_type, TPM_ST_ATTEST_CERTIFY);
        assert!(a.qualified_signer.is_empty());
        assert_eq!(a.extra_data, hex!("cafebabe"));
        assert_eq!(a.clock_info.clock, 0x1234);
        assert_eq!(a.clock_info.reset_count, 2);
        assert_eq!(a.clock_info.restart_count, 3);
        assert_eq!(a.clock_info.safe, 1);
        assert_eq!(a.firmware_version, 0x2021030500000000);
        assert_eq!(a.attested.name.len(), 34);
        assert_eq!(a.attested.name[..2], hex!("000b"));
        assert!(a.attested.qualified_name.is_empty());

        assert_eq!(a.encode().unwrap(), TEST_CERTIFY_INFO);
    }

    #[test]
    fn decode_keeps_bad_magic() {
        let a = SAttest {
            magic: TPM_GENERATED_VALUE + 1,
            ..Default::default()
        };

        let d = SAttest::decode(&a.encode().unwrap()).unwrap();

        assert_eq!(d.magic, TPM_GENERATED_VALUE + 1);
    }

    #[test]
    fn decode_truncated() {
        for n in [0, 3, 6, 10, TEST_CERTIFY_INFO.len() - 1] {
            let r = SAttest::decode(&TEST_CERTIFY_INFO[..n]);

            assert!(matches!(r, Err(Error::Syntax(_))), "truncated at {n}");
        }
    }

    #[test]
    fn decode_trailing_bytes() {
        let mut buf = TEST_CERTIFY_INFO.to_vec();
        buf.push(0);

        let r = SAttest::decode(&buf);

        assert_eq!(
            r,
            Err(Error::Syntax(
                "TPMS_ATTEST: 1 trailing bytes at offset 77".to_string()
            ))
        );
    }

    #[test]
    fn decode_quote_is_unsupported() {
        let mut buf = TEST_CERTIFY_INFO.to_vec();
        buf[4..6].copy_from_slice(&hex!("8018"));

        let r = SAttest::decode(&buf);

        assert_eq!(
            r,
            Err(Error::Syntax("unsupported attestation type 0x8018".to_string()))
        );
    }

    #[test]
    fn serialize_as_json() {
        let a = SAttest::decode(TEST_CERTIFY_INFO).unwrap();

        let j = serde_json::to_value(&a).unwrap();

        assert_eq!(j["magic"], 0xff544347u32);
        assert_eq!(j["extra_data"], "cafebabe");
        assert_eq!(j["attested"]["qualified_name"], "");
    }
}
