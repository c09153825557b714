//! Configuration module for deployment settings

mod deploy_config;

pub use deploy_config::{DeployConfig, LogConfig};
