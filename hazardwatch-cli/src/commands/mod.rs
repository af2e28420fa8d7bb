//! CLI subcommand implementations.

pub mod distance;
pub mod init;
pub mod replay;
