pub mod memory_gateway;
pub mod seed;
