pub mod bundle_assembler;
pub mod issuance_service;
