// Copyright 2023 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Key error: {0}")]
    Key(String),
    #[error("Bad internal state: {0}")]
    BadInternalState(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Syntax(e)
            | Error::UnsupportedAlgorithm(e)
            | Error::Key(e)
            | Error::BadInternalState(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
