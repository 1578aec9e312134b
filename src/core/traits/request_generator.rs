use crate::core::errors::Result;
use crate::core::models::identity::Identity;
use crate::core::models::key_material::{CertificateRequest, KeyMaterial};

/// Port for producing a keypair and a signed certificate request.
///
/// Implementations live in `adapters::crypto`. Generation is local and
/// in-memory; nothing is written to disk or sent over the network.
pub trait RequestGenerator: Send + Sync {
    /// Generate a fresh key and a request for `identity`, signed with that key.
    fn generate(&self, identity: &Identity) -> Result<(KeyMaterial, CertificateRequest)>;
}
