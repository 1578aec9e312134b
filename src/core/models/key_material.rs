use secrecy::{ExposeSecret, SecretString};

use crate::core::models::pem_envelope::{self, CERTIFICATE_REQUEST_LABEL};

/// A freshly generated private key, PEM encoded (`PRIVATE KEY`, PKCS#8).
///
/// Lives only for one issuance run and is redacted from `Debug` output.
#[derive(Debug)]
pub struct KeyMaterial {
    pem: SecretString,
}

impl KeyMaterial {
    pub fn from_pem(pem: String) -> Self {
        Self {
            pem: SecretString::from(pem),
        }
    }

    pub fn expose_pem(&self) -> &str {
        self.pem.expose_secret()
    }

    /// PKCS#8 DER bytes of the key.
    #[cfg(test)]
    pub fn der(&self) -> crate::core::errors::Result<Vec<u8>> {
        pem_envelope::decode_pem(pem_envelope::PRIVATE_KEY_LABEL, self.expose_pem().as_bytes())
    }
}

/// A signed PKCS#10 request, kept in both DER and PEM form. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    der: Vec<u8>,
    pem: String,
}

impl CertificateRequest {
    pub fn from_der(der: Vec<u8>) -> Self {
        let pem = pem_envelope::encode_pem(CERTIFICATE_REQUEST_LABEL, &der);
        Self { der, pem }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn pem(&self) -> &str {
        &self.pem
    }
}
