pub mod car;
pub mod json;
