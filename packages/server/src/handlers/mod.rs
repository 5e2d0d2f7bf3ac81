pub mod car;
pub mod root;
