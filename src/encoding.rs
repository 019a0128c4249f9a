//! Base64 handling at the API boundary.

#[derive(Debug, Clone, thiserror::Error)]
#[error("input is neither base64url nor standard base64")]
pub struct InvalidEncoding;

/// Decode base64url (padding optional), falling back to the standard alphabet.
pub fn decode_flexible(input: &str) -> Result<Vec<u8>, InvalidEncoding> {
    let input = input.trim();
    base64::decode_config(input, base64::URL_SAFE)
        .or_else(|_| base64::decode_config(input, base64::STANDARD))
        .map_err(|_| InvalidEncoding)
}

/// Standard, padded base64: the encoding handed back to hosts.
pub fn encode_standard(bytes: &[u8]) -> String {
    base64::encode(bytes)
}

pub fn encode_url_safe(bytes: &[u8]) -> String {
    base64::encode_config(bytes, base64::URL_SAFE_NO_PAD)
}

#[cfg(test)]
mod test {
    use super::*;

    const EXPECTED: [u8; 7] = [60, 60, 63, 63, 63, 62, 62];

    #[test]
    fn standard_base64() {
        assert_eq!(decode_flexible("dGVzdA==").unwrap(), b"test");
    }

    #[test]
    fn url_safe_and_standard_alphabets_agree() {
        assert_eq!(decode_flexible("PDw_Pz8-Pg==").unwrap(), EXPECTED);
        assert_eq!(decode_flexible("PDw/Pz8+Pg==").unwrap(), EXPECTED);
    }

    #[test]
    fn padding_is_optional() {
        assert_eq!(decode_flexible("PDw_Pz8-Pg").unwrap(), EXPECTED);
        assert_eq!(decode_flexible("dGVzdA").unwrap(), b"test");
    }

    #[test]
    fn invalid_input() {
        assert!(decode_flexible("123~").is_err());
    }

    #[test]
    fn encoders() {
        assert_eq!(encode_standard(&EXPECTED), "PDw/Pz8+Pg==");
        assert_eq!(encode_url_safe(&EXPECTED), "PDw_Pz8-Pg");
    }
}
