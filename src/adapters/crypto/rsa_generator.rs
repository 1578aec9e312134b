use rsa::RsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey};
use rsa::pkcs8::EncodePrivateKey;
use sha2::Sha256;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::builder::{Builder, RequestBuilder};
use x509_cert::der::Encode;
use x509_cert::der::asn1::{Any, AnyRef, SetOfVec, Utf8StringRef};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::spki::ObjectIdentifier;

use crate::core::errors::{KonfigError, Result};
use crate::core::models::identity::Identity;
use crate::core::models::key_material::{CertificateRequest, KeyMaterial};
use crate::core::models::pem_envelope::{self, PRIVATE_KEY_LABEL};
use crate::core::traits::request_generator::RequestGenerator;

/// Smallest modulus accepted for client keys.
pub const MIN_KEY_BITS: usize = 2048;

const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");

/// RSA key + PKCS#10 request signed with SHA-256.
///
/// The subject is `CN=<user>` followed by one `O=<group>` per group, which
/// is how the API server reads group membership from a client certificate.
pub struct RsaRequestGenerator {
    bits: usize,
}

impl RsaRequestGenerator {
    /// Create a generator for `bits`-bit keys. Rejects anything below 2048.
    pub fn new(bits: usize) -> Result<Self> {
        if bits < MIN_KEY_BITS {
            return Err(KonfigError::InvalidConfig {
                detail: format!("key size {bits} is below the minimum of {MIN_KEY_BITS} bits"),
            });
        }
        Ok(Self { bits })
    }

    fn subject(identity: &Identity) -> Result<Name> {
        let mut rdns = vec![rdn(COMMON_NAME, identity.common_name())?];
        for group in identity.groups() {
            rdns.push(rdn(ORGANIZATION, group)?);
        }
        Ok(RdnSequence(rdns))
    }
}

/// A single-valued RDN with a UTF8String value.
fn rdn(oid: ObjectIdentifier, value: &str) -> Result<RelativeDistinguishedName> {
    let text = Utf8StringRef::new(value).map_err(|e| generation_failed("subject", e))?;
    let atv = AttributeTypeAndValue {
        oid,
        value: Any::from(AnyRef::from(text)),
    };
    let set = SetOfVec::try_from(vec![atv]).map_err(|e| generation_failed("subject", e))?;
    Ok(RelativeDistinguishedName(set))
}

fn generation_failed(what: &str, e: impl std::fmt::Display) -> KonfigError {
    KonfigError::GenerationFailed {
        reason: format!("{what}: {e}"),
    }
}

impl RequestGenerator for RsaRequestGenerator {
    fn generate(&self, identity: &Identity) -> Result<(KeyMaterial, CertificateRequest)> {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, self.bits)
            .map_err(|e| generation_failed("RSA key generation", e))?;

        let key_der = private_key
            .to_pkcs8_der()
            .map_err(|e| generation_failed("PKCS#8 encoding", e))?;
        let key = KeyMaterial::from_pem(pem_envelope::encode_pem(
            PRIVATE_KEY_LABEL,
            key_der.as_bytes(),
        ));

        let signer = SigningKey::<Sha256>::new(private_key);
        let builder = RequestBuilder::new(Self::subject(identity)?, &signer)
            .map_err(|e| generation_failed("certificate request", e))?;
        let request = builder
            .build::<Signature>()
            .map_err(|e| generation_failed("certificate request signing", e))?;
        let request_der = request
            .to_der()
            .map_err(|e| generation_failed("certificate request encoding", e))?;

        Ok((key, CertificateRequest::from_der(request_der)))
    }
}
