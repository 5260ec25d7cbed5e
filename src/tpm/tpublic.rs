// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::common::*;
use super::errors::Error;
use super::marshal::{Reader, Writer};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Public};
use openssl::rsa::Rsa;
use serde::Serialize;

const RSA_DEFAULT_EXPONENT: u32 = 65537;

/// An algorithm selector followed by its details.  Covers TPMT_RSA_SCHEME,
/// TPMT_ECC_SCHEME and TPMT_KDF_SCHEME: TPM_ALG_NULL and TPM_ALG_RSAES carry
/// no details, TPM_ALG_ECDAA carries a hash and a commit count, every other
/// scheme carries a hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scheme {
    pub scheme: u16,
    pub hash_alg: Option<u16>,
    pub count: Option<u16>,
}

impl Default for Scheme {
    fn default() -> Self {
        Self {
            scheme: TPM_ALG_NULL,
            hash_alg: None,
            count: None,
        }
    }
}

enum SchemeDetails {
    Empty,
    Hash,
    HashAndCount,
}

fn scheme_details(scheme: u16) -> Result<SchemeDetails, Error> {
    match scheme {
        TPM_ALG_NULL | TPM_ALG_RSAES => Ok(SchemeDetails::Empty),
        TPM_ALG_ECDAA => Ok(SchemeDetails::HashAndCount),
        TPM_ALG_RSASSA | TPM_ALG_RSAPSS | TPM_ALG_OAEP | TPM_ALG_ECDSA | TPM_ALG_ECDH
        | TPM_ALG_SM2 | TPM_ALG_ECSCHNORR | TPM_ALG_ECMQV | TPM_ALG_MGF1
        | TPM_ALG_KDF1_SP800_56A | TPM_ALG_KDF2 | TPM_ALG_KDF1_SP800_108 => {
            Ok(SchemeDetails::Hash)
        }
        x => Err(Error::UnsupportedAlgorithm(format!("scheme {x:#06x}"))),
    }
}

impl Scheme {
    fn decode(r: &mut Reader, what: &str) -> Result<Scheme, Error> {
        let scheme = r.read_u16(what)?;

        let (hash_alg, count) = match scheme_details(scheme)? {
            SchemeDetails::Empty => (None, None),
            SchemeDetails::Hash => (Some(r.read_u16(what)?), None),
            SchemeDetails::HashAndCount => {
                (Some(r.read_u16(what)?), Some(r.read_u16(what)?))
            }
        };

        Ok(Scheme {
            scheme,
            hash_alg,
            count,
        })
    }

    fn encode(&self, w: &mut Writer, what: &str) -> Result<(), Error> {
        match (scheme_details(self.scheme)?, self.hash_alg, self.count) {
            (SchemeDetails::Empty, None, None) => {
                w.u16(self.scheme);
            }
            (SchemeDetails::Hash, Some(h), None) => {
                w.u16(self.scheme).u16(h);
            }
            (SchemeDetails::HashAndCount, Some(h), Some(c)) => {
                w.u16(self.scheme).u16(h).u16(c);
            }
            _ => {
                return Err(Error::Syntax(format!(
                    "{what}: details do not match scheme {:#06x}",
                    self.scheme
                )))
            }
        }

        Ok(())
    }
}

/// TPMT_SYM_DEF_OBJECT
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymDefObject {
    pub algorithm: u16,
    pub key_bits: Option<u16>,
    pub mode: Option<u16>,
}

impl Default for SymDefObject {
    fn default() -> Self {
        Self {
            algorithm: TPM_ALG_NULL,
            key_bits: None,
            mode: None,
        }
    }
}

impl SymDefObject {
    fn decode(r: &mut Reader) -> Result<SymDefObject, Error> {
        let algorithm = r.read_u16("symmetric.algorithm")?;

        if algorithm == TPM_ALG_NULL {
            return Ok(Default::default());
        }

        Ok(SymDefObject {
            algorithm,
            key_bits: Some(r.read_u16("symmetric.keyBits")?),
            mode: Some(r.read_u16("symmetric.mode")?),
        })
    }

    fn encode(&self, w: &mut Writer) {
        w.u16(self.algorithm);
        if self.algorithm != TPM_ALG_NULL {
            w.u16(self.key_bits.unwrap_or(0))
                .u16(self.mode.unwrap_or(TPM_ALG_NULL));
        }
    }
}

/// Algorithm-specific part of the public area
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicParms {
    Rsa {
        symmetric: SymDefObject,
        scheme: Scheme,
        key_bits: u16,
        exponent: u32,
        #[serde(serialize_with = "hex::serde::serialize")]
        modulus: Vec<u8>,
    },
    Ecc {
        symmetric: SymDefObject,
        scheme: Scheme,
        curve_id: u16,
        kdf: Scheme,
        #[serde(serialize_with = "hex::serde::serialize")]
        x: Vec<u8>,
        #[serde(serialize_with = "hex::serde::serialize")]
        y: Vec<u8>,
    },
}

/// TPMT_PUBLIC, i.e., the public area of a TPM object.  For syntax and
/// semantics, see §12.2.4 of "TPM 2.0 Library, Part 2: Structures".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TPublic {
    pub alg_type: u16,
    pub name_alg: u16,
    pub object_attributes: u32,
    #[serde(serialize_with = "hex::serde::serialize")]
    pub auth_policy: Vec<u8>,
    pub parameters: PublicParms,
}

impl TPublic {
    /// Return an RSA public area with no scheme and no policy
    pub fn new_rsa(name_alg: u16, key_bits: u16, modulus: Vec<u8>) -> Self {
        Self {
            alg_type: TPM_ALG_RSA,
            name_alg,
            object_attributes: 0,
            auth_policy: Default::default(),
            parameters: PublicParms::Rsa {
                symmetric: Default::default(),
                scheme: Default::default(),
                key_bits,
                exponent: 0,
                modulus,
            },
        }
    }

    /// Decode a marshalled TPMT_PUBLIC
    pub fn decode(buf: &[u8]) -> Result<TPublic, Error> {
        let mut r = Reader::new(buf);

        let alg_type = r.read_u16("type")?;
        let name_alg = r.read_u16("nameAlg")?;
        let object_attributes = r.read_u32("objectAttributes")?;
        let auth_policy = r.read_tpm2b("authPolicy")?;

        let parameters = match alg_type {
            TPM_ALG_RSA => PublicParms::Rsa {
                symmetric: SymDefObject::decode(&mut r)?,
                scheme: Scheme::decode(&mut r, "rsa.scheme")?,
                key_bits: r.read_u16("rsa.keyBits")?,
                exponent: r.read_u32("rsa.exponent")?,
                modulus: r.read_tpm2b("unique.rsa")?,
            },
            TPM_ALG_ECC => PublicParms::Ecc {
                symmetric: SymDefObject::decode(&mut r)?,
                scheme: Scheme::decode(&mut r, "ecc.scheme")?,
                curve_id: r.read_u16("ecc.curveID")?,
                kdf: Scheme::decode(&mut r, "ecc.kdf")?,
                x: r.read_tpm2b("unique.ecc.x")?,
                y: r.read_tpm2b("unique.ecc.y")?,
            },
            x => {
                return Err(Error::UnsupportedAlgorithm(format!(
                    "public area type {x:#06x}"
                )))
            }
        };

        r.finish("TPMT_PUBLIC")?;

        Ok(TPublic {
            alg_type,
            name_alg,
            object_attributes,
            auth_policy,
            parameters,
        })
    }

    /// Marshal into TPMT_PUBLIC wire format
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut w = Writer::new();

        w.u16(self.alg_type)
            .u16(self.name_alg)
            .u32(self.object_attributes)
            .tpm2b(&self.auth_policy, "authPolicy")?;

        match &self.parameters {
            PublicParms::Rsa {
                symmetric,
                scheme,
                key_bits,
                exponent,
                modulus,
            } => {
                symmetric.encode(&mut w);
                scheme.encode(&mut w, "rsa.scheme")?;
                w.u16(*key_bits)
                    .u32(*exponent)
                    .tpm2b(modulus, "unique.rsa")?;
            }
            PublicParms::Ecc {
                symmetric,
                scheme,
                curve_id,
                kdf,
                x,
                y,
            } => {
                symmetric.encode(&mut w);
                scheme.encode(&mut w, "ecc.scheme")?;
                w.u16(*curve_id);
                kdf.encode(&mut w, "ecc.kdf")?;
                w.tpm2b(x, "unique.ecc.x")?.tpm2b(y, "unique.ecc.y")?;
            }
        }

        Ok(w.into_bytes())
    }

    /// Convert the public area into an OpenSSL public key
    pub fn key(&self) -> Result<PKey<Public>, Error> {
        match &self.parameters {
            PublicParms::Rsa {
                exponent, modulus, ..
            } => {
                let e = match *exponent {
                    0 => RSA_DEFAULT_EXPONENT,
                    e => e,
                };

                let n = BigNum::from_slice(modulus).map_err(key_error)?;
                let e = BigNum::from_u32(e).map_err(key_error)?;

                let rsa = Rsa::from_public_components(n, e).map_err(key_error)?;

                PKey::from_rsa(rsa).map_err(key_error)
            }
            PublicParms::Ecc { curve_id, x, y, .. } => {
                let nid = match *curve_id {
                    TPM_ECC_NIST_P256 => Nid::X9_62_PRIME256V1,
                    TPM_ECC_NIST_P384 => Nid::SECP384R1,
                    TPM_ECC_NIST_P521 => Nid::SECP521R1,
                    c => {
                        return Err(Error::UnsupportedAlgorithm(format!(
                            "ECC curve {c:#06x}"
                        )))
                    }
                };

                let group = EcGroup::from_curve_name(nid).map_err(key_error)?;
                let x = BigNum::from_slice(x).map_err(key_error)?;
                let y = BigNum::from_slice(y).map_err(key_error)?;

                let ec = EcKey::from_public_key_affine_coordinates(&group, &x, &y)
                    .map_err(key_error)?;

                PKey::from_ec_key(ec).map_err(key_error)
            }
        }
    }
}

fn key_error(e: openssl::error::ErrorStack) -> Error {
    Error::Key(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use openssl::bn::BigNumContext;
    use openssl::ec::PointConversionForm;

    #[test]
    fn rsa_public_area_to_key() {
        let rsa = Rsa::generate(2048).unwrap();

        let mut tp = TPublic::new_rsa(TPM_ALG_SHA256, 2048, rsa.n().to_vec());

        let buf = tp.encode().unwrap();
        let decoded = TPublic::decode(&buf).expect("decoding RSA public area");
        assert_eq!(decoded, tp);

        let key = decoded.key().expect("RSA public area to key");
        let rsa_key = key.rsa().unwrap();
        assert_eq!(rsa_key.n().to_vec(), rsa.n().to_vec());
        assert_eq!(rsa_key.e().to_vec(), hex!("010001"));

        // an explicit exponent wins over the default
        if let PublicParms::Rsa { exponent, .. } = &mut tp.parameters {
            *exponent = 3;
        }
        let key = tp.key().unwrap();
        assert_eq!(key.rsa().unwrap().e().to_vec(), hex!("03"));
    }

    #[test]
    fn ecc_public_area_to_key() {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = EcKey::generate(&group).unwrap();

        let mut ctx = BigNumContext::new().unwrap();
        let mut x = BigNum::new().unwrap();
        let mut y = BigNum::new().unwrap();
        ec.public_key()
            .affine_coordinates(&group, &mut x, &mut y, &mut ctx)
            .unwrap();

        let tp = TPublic {
            alg_type: TPM_ALG_ECC,
            name_alg: TPM_ALG_SHA256,
            object_attributes: 0x00050072,
            auth_policy: Default::default(),
            parameters: PublicParms::Ecc {
                symmetric: Default::default(),
                scheme: Scheme {
                    scheme: TPM_ALG_ECDSA,
                    hash_alg: Some(TPM_ALG_SHA256),
                    count: None,
                },
                curve_id: TPM_ECC_NIST_P256,
                kdf: Default::default(),
                x: x.to_vec(),
                y: y.to_vec(),
            },
        };

        let decoded = TPublic::decode(&tp.encode().unwrap()).expect("decoding ECC public area");
        assert_eq!(decoded, tp);

        let key = decoded.key().expect("ECC public area to key");
        let got = key
            .ec_key()
            .unwrap()
            .public_key()
            .to_bytes(&group, PointConversionForm::UNCOMPRESSED, &mut ctx)
            .unwrap();
        let want = ec
            .public_key()
            .to_bytes(&group, PointConversionForm::UNCOMPRESSED, &mut ctx)
            .unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn ecc_point_not_on_curve() {
        let tp = TPublic {
            alg_type: TPM_ALG_ECC,
            name_alg: TPM_ALG_SHA256,
            object_attributes: 0,
            auth_policy: Default::default(),
            parameters: PublicParms::Ecc {
                symmetric: Default::default(),
                scheme: Default::default(),
                curve_id: TPM_ECC_NIST_P256,
                kdf: Default::default(),
                x: vec![1; 32],
                y: vec![2; 32],
            },
        };

        assert!(matches!(tp.key(), Err(Error::Key(_))));
    }

    #[test]
    fn decode_with_symmetric_and_scheme() {
        // restricted decryption RSA key (e.g., an SRK) with AES-128-CFB
        let buf = hex!(
            "0001 000b 00030472 0000"
            "0006 0080 0043"
            "0010"
            "0800 00000000"
            "0004 c0ffee00"
        );

        let tp = TPublic::decode(&buf).expect("decoding SRK-like public area");

        match &tp.parameters {
            PublicParms::Rsa {
                symmetric,
                scheme,
                key_bits,
                modulus,
                ..
            } => {
                assert_eq!(symmetric.algorithm, 0x0006);
                assert_eq!(symmetric.key_bits, Some(128));
                assert_eq!(symmetric.mode, Some(0x0043));
                assert_eq!(scheme.hash_alg, None);
                assert_eq!(*key_bits, 2048);
                assert_eq!(modulus, &hex!("c0ffee00"));
            }
            p => panic!("unexpected parameters {p:?}"),
        }

        assert_eq!(tp.encode().unwrap(), buf);
    }

    #[test]
    fn decode_unknown_type() {
        let buf = hex!("0008 000b 00000000 0000");

        assert!(matches!(
            TPublic::decode(&buf),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn decode_truncated_unique() {
        let tp = TPublic::new_rsa(TPM_ALG_SHA1, 2048, vec![0xa5; 256]);
        let buf = tp.encode().unwrap();

        assert!(matches!(
            TPublic::decode(&buf[..buf.len() - 1]),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn decode_trailing_bytes() {
        let tp = TPublic::new_rsa(TPM_ALG_SHA1, 2048, vec![0xa5; 256]);
        let mut buf = tp.encode().unwrap();
        buf.push(0);

        assert_eq!(
            TPublic::decode(&buf),
            Err(Error::Syntax(
                "TPMT_PUBLIC: 1 trailing bytes at offset 278".to_string()
            ))
        );
    }

    #[test]
    fn decode_rsaes_scheme() {
        // RSAES decryption key: the scheme has no details
        let buf = hex!(
            "0001 000b 00020072 0000"
            "0010"
            "0015"
            "0800 00000000"
            "0004 c0ffee00"
        );

        let tp = TPublic::decode(&buf).expect("decoding RSAES public area");

        match &tp.parameters {
            PublicParms::Rsa {
                scheme, modulus, ..
            } => {
                assert_eq!(scheme.scheme, TPM_ALG_RSAES);
                assert_eq!(scheme.hash_alg, None);
                assert_eq!(scheme.count, None);
                assert_eq!(modulus, &hex!("c0ffee00"));
            }
            p => panic!("unexpected parameters {p:?}"),
        }

        assert_eq!(tp.encode().unwrap(), buf);
    }

    #[test]
    fn decode_ecdaa_scheme() {
        // ECDAA signing key: the scheme has a hash and a commit count
        let buf = hex!(
            "0023 000b 00040072 0000"
            "0010"
            "001a 000b 0001"
            "0003"
            "0010"
            "0002 aaaa"
            "0002 bbbb"
        );

        let tp = TPublic::decode(&buf).expect("decoding ECDAA public area");

        match &tp.parameters {
            PublicParms::Ecc {
                scheme,
                curve_id,
                kdf,
                x,
                y,
                ..
            } => {
                assert_eq!(scheme.scheme, TPM_ALG_ECDAA);
                assert_eq!(scheme.hash_alg, Some(TPM_ALG_SHA256));
                assert_eq!(scheme.count, Some(1));
                assert_eq!(*curve_id, TPM_ECC_NIST_P256);
                assert_eq!(kdf, &Scheme::default());
                assert_eq!(x, &hex!("aaaa"));
                assert_eq!(y, &hex!("bbbb"));
            }
            p => panic!("unexpected parameters {p:?}"),
        }

        assert_eq!(tp.encode().unwrap(), buf);
    }

    #[test]
    fn decode_unknown_scheme() {
        let buf = hex!(
            "0001 000b 00020072 0000"
            "0010"
            "0099 000b"
            "0800 00000000"
            "0004 c0ffee00"
        );

        assert_eq!(
            TPublic::decode(&buf),
            Err(Error::UnsupportedAlgorithm("scheme 0x0099".to_string()))
        );
    }

    #[test]
    fn encode_scheme_without_hash() {
        let mut tp = TPublic::new_rsa(TPM_ALG_SHA256, 2048, vec![0xa5; 256]);
        if let PublicParms::Rsa { scheme, .. } = &mut tp.parameters {
            scheme.scheme = TPM_ALG_RSASSA;
        }

        assert_eq!(
            tp.encode(),
            Err(Error::Syntax(
                "rsa.scheme: details do not match scheme 0x0014".to_string()
            ))
        );
    }
}
