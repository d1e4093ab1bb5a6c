pub mod publisher;
pub mod reader;
pub mod upload;
