// SPDX-License-Identifier: Apache-2.0

use base64::{self, engine::general_purpose, Engine as _};

use super::errors::Error;

/// decodes bytes from a base64url-encoded string, as used for WebAuthn
/// challenges
pub fn decode_str(v: &str) -> Result<Vec<u8>, Error> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(v.trim_end_matches('='))
        .map_err(|e| Error::Syntax(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_with_and_without_padding() {
        assert_eq!(decode_str("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_str("-_8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_str("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn decode_rejects_standard_alphabet() {
        assert!(matches!(decode_str("+/8"), Err(Error::Syntax(_))));
    }
}
