pub mod csr_gateway;
