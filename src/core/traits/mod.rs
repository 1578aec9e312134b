pub mod bundle_sink;
pub mod connection_store;
pub mod gateway;
pub mod request_generator;
