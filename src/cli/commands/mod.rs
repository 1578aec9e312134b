pub mod cert;
pub mod version;
