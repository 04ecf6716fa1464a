//! CLI command implementations.

pub mod config;
pub mod login;
pub mod manual;
pub mod page;
pub mod stats;
