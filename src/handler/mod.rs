pub mod error;
pub mod investment;
