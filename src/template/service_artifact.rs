//! Service supervision artifacts rendered from `tpl/`

use super::TemplateProcessor;
use crate::error::{Error, Result};
use crate::service::{InitVariant, ServiceDefinition};

const SYSTEMD_UNIT_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tpl/resilient-dns.service"
));

const SYSV_INIT_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tpl/resilient-dns.init"
));

/// Render the unit file or init script selected by the definition's variant
pub fn render_service_artifact(definition: &ServiceDefinition) -> Result<String> {
    let template = match definition.variant {
        InitVariant::Systemd => SYSTEMD_UNIT_TEMPLATE,
        InitVariant::SysVInit => SYSV_INIT_TEMPLATE,
    };

    let rendered = TemplateProcessor::new()
        .set("SERVICE_NAME", definition.name.as_str())
        .set("DESCRIPTION", definition.description.as_str())
        .set("INTERPRETER", definition.interpreter.display().to_string())
        .set("EXECUTABLE", definition.executable.display().to_string())
        .set("WORKING_DIR", definition.working_dir.display().to_string())
        .set("RESTART_POLICY", definition.restart.as_str())
        .set("RUN_USER", definition.user.as_str())
        .set("PID_FILE", definition.pid_file.display().to_string())
        .set("LOG_FILE", definition.log_file.display().to_string())
        .process(template);

    let unresolved = TemplateProcessor::unresolved(&rendered);
    if !unresolved.is_empty() {
        return Err(Error::invalid_config(format!(
            "{} template left placeholders unresolved: {}",
            definition.variant,
            unresolved.join(", ")
        )));
    }

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeployConfig;

    #[test]
    fn test_systemd_unit() {
        let definition =
            ServiceDefinition::from_config(&DeployConfig::default(), InitVariant::Systemd);
        let unit = render_service_artifact(&definition).unwrap();

        assert!(unit.contains("Description=Resilient DNS Proxy"));
        assert!(unit.contains("Type=simple"));
        assert!(unit.contains("ExecStart=/usr/bin/python3 /usr/local/bin/resilient_dns.py"));
        assert!(unit.contains("WorkingDirectory=/usr/local/share/dns-proxy"));
        assert!(unit.contains("Restart=always"));
        assert!(unit.contains("User=root"));
        assert!(unit.contains("WantedBy=multi-user.target"));
    }

    #[test]
    fn test_sysv_script() {
        let definition =
            ServiceDefinition::from_config(&DeployConfig::default(), InitVariant::SysVInit);
        let script = render_service_artifact(&definition).unwrap();

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("# Provides:          resilient-dns"));
        assert!(script.contains("PIDFILE=\"/var/run/resilient-dns.pid\""));
        assert!(script.contains("LOGFILE=\"/var/log/resilient-dns.log\""));
        assert!(script.contains("DAEMON=\"/usr/local/bin/resilient_dns.py\""));
        assert!(script.contains("start-stop-daemon --start"));
        for action in ["start)", "stop)", "restart)", "status)"] {
            assert!(script.contains(action), "missing action {action}");
        }
    }
}
