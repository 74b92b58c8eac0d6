//! CLI command implementations.

pub mod common;
pub mod filters;
pub mod init_config;
pub mod probability;
pub mod scan;
pub mod validate;
pub mod watch;
