pub mod analyze;
pub mod extract;
pub mod transcode;
