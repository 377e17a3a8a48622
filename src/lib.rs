pub mod config;
pub mod parser;
pub mod upgrade;
pub mod version;
