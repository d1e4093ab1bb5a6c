pub mod config;
pub mod error;
pub mod maven;
pub mod publish;
pub mod transport;
pub mod util;
