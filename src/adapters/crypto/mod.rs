pub mod rsa_generator;
