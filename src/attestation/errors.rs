// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

/// Reasons for rejecting a key attestation.  Everything except
/// [`Error::BadInternalState`] is an expected outcome of verifying untrusted
/// evidence.
#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Signature invalid: {0}")]
    SignatureInvalid(String),
    #[error("Malformed certification: {0}")]
    MalformedCertification(String),
    #[error("Magic mismatch: {0}")]
    MagicMismatch(String),
    #[error("Extra data mismatch: {0}")]
    ExtraDataMismatch(String),
    #[error("Name mismatch: {0}")]
    NameMismatch(String),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Key error: {0}")]
    Key(String),
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Bad internal state: {0}")]
    BadInternalState(String),
}

impl Error {
    /// True if the verifier itself is at fault rather than the evidence
    pub fn is_malfunction(&self) -> bool {
        matches!(self, Error::BadInternalState(_))
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::SignatureInvalid(e)
            | Error::MalformedCertification(e)
            | Error::MagicMismatch(e)
            | Error::ExtraDataMismatch(e)
            | Error::NameMismatch(e)
            | Error::UnsupportedAlgorithm(e)
            | Error::Key(e)
            | Error::Syntax(e)
            | Error::BadInternalState(e) => {
                write!(f, "{}", e)
            }
        }
    }
}

impl From<crate::tpm::Error> for Error {
    fn from(e: crate::tpm::Error) -> Self {
        match e {
            crate::tpm::Error::Syntax(s) => Error::Syntax(s),
            crate::tpm::Error::UnsupportedAlgorithm(s) => Error::UnsupportedAlgorithm(s),
            crate::tpm::Error::Key(s) => Error::Key(s),
            crate::tpm::Error::BadInternalState(s) => Error::BadInternalState(s),
        }
    }
}
