pub mod client;
pub mod libraries;
