//! CLI command implementations.

pub mod generate;
pub mod init;
pub mod run;
pub mod status;
pub mod version;
