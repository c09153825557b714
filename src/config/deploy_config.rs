//! Deployment configuration: every path and name the installer touches

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Optional log file in addition to console output
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Immutable deployment configuration passed to every component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Service name used for the unit file / init script
    pub service_name: String,
    /// Human readable service description
    pub description: String,
    /// File name of the proxy artifact (default: resilient_dns.py)
    pub artifact_name: String,
    /// Directory holding the artifact source; searched in the working
    /// directory and next to the installer binary when unset
    pub source_dir: Option<PathBuf>,
    /// Directory the artifact is deployed into (default: /usr/local/bin)
    pub install_dir: PathBuf,
    /// Runtime interpreter that executes the artifact
    pub interpreter: PathBuf,
    /// Persistent storage root owned by the proxy
    pub data_dir: PathBuf,
    /// System resolver configuration
    pub resolv_conf: PathBuf,
    /// DHCP client configuration
    pub dhclient_conf: PathBuf,
    /// Where systemd unit files are written
    pub systemd_unit_dir: PathBuf,
    /// Where SysVInit scripts are written
    pub init_script_dir: PathBuf,
    /// Presence of this directory selects the systemd variant
    pub systemd_runtime_dir: PathBuf,
    /// PID file tracked by the SysVInit script
    pub pid_file: PathBuf,
    /// Service output log for the SysVInit script
    pub log_file: PathBuf,
    /// Address the local proxy listens on
    pub local_nameserver: String,
    /// Resolver written on uninstall when no backup exists
    pub fallback_nameserver: String,
    /// Packages installed through the system package manager
    pub system_packages: Vec<String>,
    /// Packages installed through pip
    pub python_packages: Vec<String>,
    /// Installer logging
    pub log: LogConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            service_name: "resilient-dns".to_string(),
            description: "Resilient DNS Proxy".to_string(),
            artifact_name: "resilient_dns.py".to_string(),
            source_dir: None,
            install_dir: PathBuf::from("/usr/local/bin"),
            interpreter: PathBuf::from("/usr/bin/python3"),
            data_dir: PathBuf::from("/usr/local/share/dns-proxy"),
            resolv_conf: PathBuf::from("/etc/resolv.conf"),
            dhclient_conf: PathBuf::from("/etc/dhcp/dhclient.conf"),
            systemd_unit_dir: PathBuf::from("/etc/systemd/system"),
            init_script_dir: PathBuf::from("/etc/init.d"),
            systemd_runtime_dir: PathBuf::from("/run/systemd/system"),
            pid_file: PathBuf::from("/var/run/resilient-dns.pid"),
            log_file: PathBuf::from("/var/log/resilient-dns.log"),
            local_nameserver: "127.0.0.1".to_string(),
            fallback_nameserver: "8.8.8.8".to_string(),
            system_packages: vec!["python3".to_string(), "python3-pip".to_string()],
            python_packages: vec!["dnslib".to_string(), "dnspython".to_string()],
            log: LogConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Load configuration overrides from a TOML file; missing keys keep
    /// their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the service name and that every managed path is absolute
    pub fn validate(&self) -> Result<()> {
        let name_pattern = Regex::new(r"^[a-zA-Z0-9_.-]{1,64}$")
            .map_err(|e| Error::invalid_config(e.to_string()))?;
        if !name_pattern.is_match(&self.service_name) {
            return Err(Error::invalid_config(format!(
                "service name '{}' must match [a-zA-Z0-9_.-]{{1,64}}",
                self.service_name
            )));
        }

        if self.artifact_name.is_empty() || self.artifact_name.contains('/') {
            return Err(Error::invalid_config(format!(
                "artifact name '{}' must be a plain file name",
                self.artifact_name
            )));
        }

        let paths = [
            ("install_dir", &self.install_dir),
            ("interpreter", &self.interpreter),
            ("data_dir", &self.data_dir),
            ("resolv_conf", &self.resolv_conf),
            ("dhclient_conf", &self.dhclient_conf),
            ("systemd_unit_dir", &self.systemd_unit_dir),
            ("init_script_dir", &self.init_script_dir),
            ("systemd_runtime_dir", &self.systemd_runtime_dir),
            ("pid_file", &self.pid_file),
            ("log_file", &self.log_file),
        ];
        for (key, path) in paths {
            if !path.is_absolute() {
                return Err(Error::invalid_config(format!(
                    "{key} must be an absolute path, got {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }

    /// Re-root every managed host path under `root` (staging trees, tests).
    /// The interpreter and artifact source are left untouched.
    pub fn rebased(&self, root: &Path) -> Self {
        let rebase = |path: &Path| match path.strip_prefix("/") {
            Ok(relative) => root.join(relative),
            Err(_) => root.join(path),
        };

        Self {
            install_dir: rebase(&self.install_dir),
            data_dir: rebase(&self.data_dir),
            resolv_conf: rebase(&self.resolv_conf),
            dhclient_conf: rebase(&self.dhclient_conf),
            systemd_unit_dir: rebase(&self.systemd_unit_dir),
            init_script_dir: rebase(&self.init_script_dir),
            systemd_runtime_dir: rebase(&self.systemd_runtime_dir),
            pid_file: rebase(&self.pid_file),
            log_file: rebase(&self.log_file),
            ..self.clone()
        }
    }

    /// Deployed executable; its presence means "installed"
    pub fn binary_path(&self) -> PathBuf {
        self.install_dir.join(&self.artifact_name)
    }

    /// Backup directory inside the data directory
    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn resolv_backup_path(&self) -> PathBuf {
        self.backup_dir().join(backup_file_name(&self.resolv_conf))
    }

    pub fn dhclient_backup_path(&self) -> PathBuf {
        self.backup_dir().join(backup_file_name(&self.dhclient_conf))
    }

    /// Directory whose absence means the host has no DHCP client config
    pub fn dhcp_dir(&self) -> PathBuf {
        self.dhclient_conf
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    pub fn systemd_unit_path(&self) -> PathBuf {
        self.systemd_unit_dir
            .join(format!("{}.service", self.service_name))
    }

    pub fn init_script_path(&self) -> PathBuf {
        self.init_script_dir.join(&self.service_name)
    }

    /// Resolver content pointing all lookups at the local proxy
    pub fn resolver_content(&self) -> String {
        format!("nameserver {}\n", self.local_nameserver)
    }

    /// Resolver content used when no backup can be restored
    pub fn fallback_resolver_content(&self) -> String {
        format!("nameserver {}\n", self.fallback_nameserver)
    }

    /// DHCP client directive keeping the local proxy across lease renewals
    pub fn persistence_directive(&self) -> String {
        format!("supersede domain-name-servers {};", self.local_nameserver)
    }

    /// Candidate locations of the artifact source, in search order
    pub fn artifact_candidates(&self) -> Vec<PathBuf> {
        if let Some(dir) = &self.source_dir {
            return vec![dir.join(&self.artifact_name)];
        }

        let mut candidates = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(&self.artifact_name));
        }
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            let candidate = exe_dir.join(&self.artifact_name);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }
}

fn backup_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    format!("{name}.bak")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = DeployConfig::default();
        assert_eq!(
            config.binary_path(),
            PathBuf::from("/usr/local/bin/resilient_dns.py")
        );
        assert_eq!(
            config.resolv_backup_path(),
            PathBuf::from("/usr/local/share/dns-proxy/backups/resolv.conf.bak")
        );
        assert_eq!(
            config.dhclient_backup_path(),
            PathBuf::from("/usr/local/share/dns-proxy/backups/dhclient.conf.bak")
        );
        assert_eq!(
            config.systemd_unit_path(),
            PathBuf::from("/etc/systemd/system/resilient-dns.service")
        );
        assert_eq!(
            config.init_script_path(),
            PathBuf::from("/etc/init.d/resilient-dns")
        );
        assert_eq!(config.dhcp_dir(), PathBuf::from("/etc/dhcp"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dns_mutation_lines() {
        let config = DeployConfig::default();
        assert_eq!(config.resolver_content(), "nameserver 127.0.0.1\n");
        assert_eq!(config.fallback_resolver_content(), "nameserver 8.8.8.8\n");
        assert_eq!(
            config.persistence_directive(),
            "supersede domain-name-servers 127.0.0.1;"
        );
    }

    #[test]
    fn test_rebased_keeps_interpreter() {
        let config = DeployConfig::default().rebased(Path::new("/tmp/stage"));
        assert_eq!(config.resolv_conf, PathBuf::from("/tmp/stage/etc/resolv.conf"));
        assert_eq!(
            config.binary_path(),
            PathBuf::from("/tmp/stage/usr/local/bin/resilient_dns.py")
        );
        assert_eq!(config.interpreter, PathBuf::from("/usr/bin/python3"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.toml");
        std::fs::write(
            &path,
            r#"service_name = "dns-proxy"
fallback_nameserver = "1.1.1.1"

[log]
level = "debug"
"#,
        )
        .unwrap();

        let config = DeployConfig::load(&path).unwrap();
        assert_eq!(config.service_name, "dns-proxy");
        assert_eq!(config.fallback_resolver_content(), "nameserver 1.1.1.1\n");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.resolv_conf, PathBuf::from("/etc/resolv.conf"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DeployConfig {
            service_name: "bad name".to_string(),
            ..DeployConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { .. })
        ));

        let config = DeployConfig {
            data_dir: PathBuf::from("relative/data"),
            ..DeployConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_dir_overrides_search() {
        let config = DeployConfig {
            source_dir: Some(PathBuf::from("/srv/dist")),
            ..DeployConfig::default()
        };
        assert_eq!(
            config.artifact_candidates(),
            vec![PathBuf::from("/srv/dist/resilient_dns.py")]
        );
    }
}
