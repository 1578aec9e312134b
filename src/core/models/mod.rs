pub mod credential_bundle;
pub mod identity;
pub mod key_material;
pub mod pem_envelope;
pub mod signing_request;
