pub mod coordinates;
pub mod metadata;
pub mod metadata_xml;
pub mod paths;
pub mod snapshot;
pub mod timestamp;
