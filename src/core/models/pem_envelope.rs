use crate::core::errors::{KonfigError, Result};

/// PEM label for a PKCS#8 private key.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

/// PEM label for a PKCS#10 certificate request.
pub const CERTIFICATE_REQUEST_LABEL: &str = "CERTIFICATE REQUEST";

/// PEM label for an issued X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Wrap DER bytes in a PEM block with the given label (LF line endings).
pub fn encode_pem(label: &str, der: &[u8]) -> String {
    let block = pem::Pem::new(label, der.to_vec());
    pem::encode_config(
        &block,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Parse the first PEM block and return its DER contents.
///
/// Fails if the data is not PEM or if the block carries a different label.
pub fn decode_pem(label: &str, data: &[u8]) -> Result<Vec<u8>> {
    let malformed = |reason: String| KonfigError::MalformedPem {
        label: label.to_string(),
        reason,
    };
    let block = pem::parse(data).map_err(|e| malformed(e.to_string()))?;

    if block.tag() != label {
        return Err(malformed(format!("found a {} block instead", block.tag())));
    }

    Ok(block.into_contents())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_label_and_lf() {
        let text = encode_pem(CERTIFICATE_REQUEST_LABEL, &[0x30, 0x03, 0x02, 0x01, 0x00]);
        assert!(text.starts_with("-----BEGIN CERTIFICATE REQUEST-----\n"));
        assert!(text.trim_end().ends_with("-----END CERTIFICATE REQUEST-----"));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn decode_returns_original_bytes() {
        let der: Vec<u8> = (0u8..=255).collect();
        let text = encode_pem(PRIVATE_KEY_LABEL, &der);
        assert_eq!(decode_pem(PRIVATE_KEY_LABEL, text.as_bytes()).unwrap(), der);
    }

    #[test]
    fn decode_rejects_wrong_label() {
        let text = encode_pem(CERTIFICATE_LABEL, b"not a request");
        let err = decode_pem(CERTIFICATE_REQUEST_LABEL, text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("found a CERTIFICATE block"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_pem(PRIVATE_KEY_LABEL, b"hello").is_err());
    }
}
