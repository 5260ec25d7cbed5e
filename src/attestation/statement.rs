// Copyright 2023-2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use super::keyattestation::KeyAttestation;
use crate::tpm::{HashAlg, TPublic};
use bitmask::*;
use ciborium::de::from_reader;
use ciborium::Value;
use openssl::pkey::{PKey, Public};
use openssl::x509::X509;
use std::io::Read;

const STATEMENT_VERSION: &str = "2.0";

const VER_LABEL: &str = "ver";
const ALG_LABEL: &str = "alg";
const X5C_LABEL: &str = "x5c";
const SIG_LABEL: &str = "sig";
const CERT_INFO_LABEL: &str = "certInfo";
const PUB_AREA_LABEL: &str = "pubArea";

bitmask! {
    #[derive(Debug)]
    mask FieldsSet: u8 where flags Fields {
        Ver      = 0x01,
        Alg      = 0x02,
        X5c      = 0x04,
        Sig      = 0x08,
        CertInfo = 0x10,
        PubArea  = 0x20,
    }
}

/// A TPM attestation statement, as carried in the `attStmt` of a WebAuthn
/// attestation object with the "tpm" format.  See §8.3 of "Web
/// Authentication: An API for accessing Public Key Credentials - Level 2".
#[derive(Debug)]
pub struct Statement {
    pub ver: String,       // "ver", text ("2.0")
    pub alg: i128,         // "alg", COSEAlgorithmIdentifier
    pub x5c: Vec<Vec<u8>>, // "x5c", [ * bytes ], DER certificates, AK first
    pub sig: Vec<u8>,      // "sig", bytes
    pub cert_info: Vec<u8>, // "certInfo", bytes (TPMS_ATTEST)
    pub pub_area: Vec<u8>, // "pubArea", bytes (TPMT_PUBLIC)

    fields_set: FieldsSet,
}

impl Default for Statement {
    fn default() -> Self {
        Self::new()
    }
}

impl Statement {
    pub fn new() -> Self {
        Self {
            ver: String::from(""),
            alg: 0,
            x5c: Default::default(),
            sig: Default::default(),
            cert_info: Default::default(),
            pub_area: Default::default(),
            fields_set: FieldsSet::none(),
        }
    }

    /// Decode a CBOR encoded TPM attestation statement.  The input must hold
    /// exactly one CBOR item.
    pub fn decode<R: Read>(mut buf: R) -> Result<Statement, Error> {
        let v: Value = from_reader(&mut buf).map_err(|e| Error::Syntax(e.to_string()))?;

        let mut rest = [0u8; 1];
        if buf.read(&mut rest).map_err(|e| Error::Syntax(e.to_string()))? != 0 {
            return Err(Error::Syntax(
                "trailing data after attestation statement".to_string(),
            ));
        }

        let mut st: Statement = Default::default();

        if let Value::Map(contents) = v {
            st.parse(&contents)?;
        } else {
            return Err(Error::Syntax("expecting map type".to_string()));
        }

        st.validate()?;

        Ok(st)
    }

    fn parse(&mut self, contents: &[(Value, Value)]) -> Result<(), Error> {
        for (k, v) in contents.iter() {
            if let Value::Text(t) = k {
                match t.as_str() {
                    VER_LABEL => self.set_ver(v)?,
                    ALG_LABEL => self.set_alg(v)?,
                    X5C_LABEL => self.set_x5c(v)?,
                    SIG_LABEL => self.set_sig(v)?,
                    CERT_INFO_LABEL => self.set_cert_info(v)?,
                    PUB_AREA_LABEL => self.set_pub_area(v)?,
                    unknown => {
                        return Err(Error::Syntax(format!(
                            "unknown key {unknown} in attestation statement"
                        )))
                    }
                }
            } else {
                return Err(Error::Syntax("expecting text key".to_string()));
            }
        }
        Ok(())
    }

    fn claim(&mut self, f: Fields, n: &str) -> Result<(), Error> {
        if self.fields_set.contains(f) {
            return Err(Error::Syntax(format!("duplicated {n}")));
        }

        self.fields_set.set(f);

        Ok(())
    }

    fn set_ver(&mut self, v: &Value) -> Result<(), Error> {
        self.claim(Fields::Ver, VER_LABEL)?;

        self.ver = to_tstr(v, VER_LABEL)?;

        Ok(())
    }

    fn set_alg(&mut self, v: &Value) -> Result<(), Error> {
        self.claim(Fields::Alg, ALG_LABEL)?;

        self.alg = to_int(v, ALG_LABEL)?;

        Ok(())
    }

    fn set_x5c(&mut self, v: &Value) -> Result<(), Error> {
        self.claim(Fields::X5c, X5C_LABEL)?;

        let certs = match v {
            Value::Array(a) => a,
            _ => return Err(Error::Syntax(format!("{X5C_LABEL}: expecting array"))),
        };

        for c in certs.iter() {
            self.x5c.push(to_bstr(c, X5C_LABEL)?);
        }

        Ok(())
    }

    fn set_sig(&mut self, v: &Value) -> Result<(), Error> {
        self.claim(Fields::Sig, SIG_LABEL)?;

        self.sig = to_bstr(v, SIG_LABEL)?;

        Ok(())
    }

    fn set_cert_info(&mut self, v: &Value) -> Result<(), Error> {
        self.claim(Fields::CertInfo, CERT_INFO_LABEL)?;

        self.cert_info = to_bstr(v, CERT_INFO_LABEL)?;

        Ok(())
    }

    fn set_pub_area(&mut self, v: &Value) -> Result<(), Error> {
        self.claim(Fields::PubArea, PUB_AREA_LABEL)?;

        self.pub_area = to_bstr(v, PUB_AREA_LABEL)?;

        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        // x5c is optional: the AK may be known to the relying party already
        let mandatory_fields = [
            (Fields::Ver, VER_LABEL),
            (Fields::Alg, ALG_LABEL),
            (Fields::Sig, SIG_LABEL),
            (Fields::CertInfo, CERT_INFO_LABEL),
            (Fields::PubArea, PUB_AREA_LABEL),
        ];

        for (f, n) in mandatory_fields.iter() {
            if !self.fields_set.contains(*f) {
                return Err(Error::Syntax(format!("missing {n}")));
            }
        }

        if self.ver != STATEMENT_VERSION {
            return Err(Error::Syntax(format!(
                "unsupported version {:?}, expecting {STATEMENT_VERSION:?}",
                self.ver
            )));
        }

        Ok(())
    }

    /// The public key of the AK certificate, i.e., the first in x5c.  The
    /// certificate chain is not validated.
    pub fn attestation_key(&self) -> Result<PKey<Public>, Error> {
        let der = self
            .x5c
            .first()
            .ok_or_else(|| Error::Key("no AK certificate in x5c".to_string()))?;

        let cert = X509::from_der(der).map_err(|e| Error::Key(e.to_string()))?;

        cert.public_key().map_err(|e| Error::Key(e.to_string()))
    }

    /// The decoded public area of the certified key
    pub fn public_area(&self) -> Result<TPublic, Error> {
        TPublic::decode(&self.pub_area).map_err(Error::from)
    }

    /// Set up the verification of this statement against the given AK and
    /// qualifying data
    pub fn key_attestation(
        &self,
        attestation_key: PKey<Public>,
        qualifying_data: &[u8],
    ) -> Result<KeyAttestation, Error> {
        let hash_alg = HashAlg::from_cose_alg(self.alg)?;

        Ok(KeyAttestation::new(
            &self.cert_info,
            &self.sig,
            &self.pub_area,
            attestation_key,
            &hash_alg.to_string(),
            qualifying_data,
        ))
    }
}

fn to_bstr(v: &Value, n: &str) -> Result<Vec<u8>, Error> {
    match v {
        Value::Bytes(b) => Ok(b.clone()),
        _ => Err(Error::Syntax(format!("{n}: expecting byte string"))),
    }
}

fn to_tstr(v: &Value, n: &str) -> Result<String, Error> {
    match v {
        Value::Text(t) => Ok(t.clone()),
        _ => Err(Error::Syntax(format!("{n}: expecting text string"))),
    }
}

fn to_int(v: &Value, n: &str) -> Result<i128, Error> {
    match v {
        Value::Integer(i) => Ok((*i).into()),
        _ => Err(Error::Syntax(format!("{n}: expecting integer"))),
    }
}
