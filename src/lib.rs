//! # resilient-dns-deploy
//!
//! Host lifecycle for the resilient DNS proxy: installs the proxy as a
//! systemd or SysVInit service, points the system resolver at it, and
//! puts everything back on uninstall.

pub mod config;
pub mod error;
pub mod menu;
pub mod network;
pub mod observability;
pub mod orchestrator;
pub mod prompt;
pub mod service;
pub mod system;
pub mod template;

// Re-export commonly used types
pub use config::DeployConfig;
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
