//! HTTP request handlers

pub mod generate;
pub mod health;

pub use generate::generate_code;
pub use health::health;
