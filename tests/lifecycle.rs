mod common;

use std::fs;
use std::path::Path;

use common::{RecordingRunner, StagedHost};
use resilient_dns_deploy::network::{DhcpRestore, DirectiveOutcome, ResolverRestore};
use resilient_dns_deploy::orchestrator::{Orchestrator, UninstallOutcome};
use resilient_dns_deploy::prompt::FixedAnswer;
use resilient_dns_deploy::service::InitVariant;
use resilient_dns_deploy::system::{BackupOutcome, InstallationState};
use resilient_dns_deploy::Error;

fn removed(outcome: UninstallOutcome) -> resilient_dns_deploy::orchestrator::UninstallReport {
    match outcome {
        UninstallOutcome::Removed(report) => report,
        UninstallOutcome::NothingToRemove => panic!("expected the service to be removed"),
    }
}

#[test]
fn repeated_installs_keep_the_first_backup_and_one_directive() {
    let host = StagedHost::new().with_systemd().with_dhclient();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    let first = orchestrator.install().expect("first install");
    assert_eq!(first.resolv_backup, BackupOutcome::Created);
    assert_eq!(first.dhclient_backup, BackupOutcome::Created);
    assert_eq!(first.directive, DirectiveOutcome::Added);

    for _ in 0..3 {
        let again = orchestrator.install().expect("reinstall");
        assert!(again.reinstall);
        assert_eq!(again.resolv_backup, BackupOutcome::AlreadyExists);
        assert_eq!(again.dhclient_backup, BackupOutcome::AlreadyExists);
        assert_eq!(again.directive, DirectiveOutcome::AlreadyPresent);
    }

    assert_eq!(
        host.read(&host.config.resolv_backup_path()),
        StagedHost::ORIGINAL_RESOLVER
    );
    assert_eq!(
        host.read(&host.config.dhclient_backup_path()),
        StagedHost::ORIGINAL_DHCLIENT
    );
    let backups = fs::read_dir(host.config.backup_dir()).unwrap().count();
    assert_eq!(backups, 2);

    let dhclient = host.read(&host.config.dhclient_conf);
    assert_eq!(
        dhclient
            .lines()
            .filter(|l| l.trim() == "supersede domain-name-servers 127.0.0.1;")
            .count(),
        1
    );
    assert_eq!(runner.count("systemctl restart resilient-dns"), 3);
}

#[test]
fn uninstall_install_uninstall_restores_resolver_byte_for_byte() {
    let host = StagedHost::new().with_systemd().with_dhclient();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    orchestrator.install().unwrap();
    let report = removed(orchestrator.uninstall().unwrap());
    assert_eq!(report.resolver, ResolverRestore::FromBackup);
    assert_eq!(report.dhcp, DhcpRestore::FromBackup);
    assert_eq!(host.read(&host.config.resolv_conf), StagedHost::ORIGINAL_RESOLVER);

    orchestrator.install().unwrap();
    assert_eq!(
        host.read(&host.config.resolv_conf),
        "nameserver 127.0.0.1\n"
    );
    removed(orchestrator.uninstall().unwrap());

    assert_eq!(host.read(&host.config.resolv_conf), StagedHost::ORIGINAL_RESOLVER);
    assert_eq!(
        host.read(&host.config.dhclient_conf),
        StagedHost::ORIGINAL_DHCLIENT
    );
}

#[test]
fn uninstall_without_backup_writes_public_resolver() {
    let host = StagedHost::new().with_systemd();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    orchestrator.install().unwrap();
    fs::remove_file(host.config.resolv_backup_path()).unwrap();

    let report = removed(orchestrator.uninstall().unwrap());
    assert_eq!(report.resolver, ResolverRestore::Defaulted);
    assert_eq!(host.read(&host.config.resolv_conf), "nameserver 8.8.8.8\n");
}

#[test]
fn resolver_symlink_survives_install_and_uninstall() {
    let host = StagedHost::new().with_systemd().with_resolved_stub();
    let stub = host.root().join("run/systemd/resolve/stub-resolv.conf");
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    for _ in 0..2 {
        let install = orchestrator.install().unwrap();
        assert_eq!(host.read(&host.config.resolv_conf), "nameserver 127.0.0.1\n");
        // the managed stub is never written through the link
        assert_eq!(host.read(&stub), StagedHost::RESOLVED_STUB);
        assert_ne!(install.resolv_backup, BackupOutcome::SourceMissing);

        let report = removed(orchestrator.uninstall().unwrap());
        assert_eq!(report.resolver, ResolverRestore::FromBackup);
        let meta = fs::symlink_metadata(&host.config.resolv_conf).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(&host.config.resolv_conf).unwrap(),
            Path::new(StagedHost::RESOLVED_STUB_LINK)
        );
        assert_eq!(host.read(&host.config.resolv_conf), StagedHost::RESOLVED_STUB);
    }
}

#[test]
fn failed_boot_registration_still_starts_the_proxy() {
    let host = StagedHost::new().with_dhclient();
    let runner = RecordingRunner::new().failing("update-rc.d resilient-dns defaults");
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    let report = orchestrator.install().expect("registration failure is not fatal");
    assert!(report.service_started);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("update-rc.d resilient-dns defaults"));
    assert!(host.config.init_script_path().is_file());
    assert_eq!(runner.count("service resilient-dns start"), 1);
    assert_eq!(host.read(&host.config.resolv_conf), "nameserver 127.0.0.1\n");
}

#[test]
fn installation_state_follows_the_executable() {
    let host = StagedHost::new();
    let runner = RecordingRunner::new().failing("service resilient-dns start");
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    assert!(!orchestrator.probe().is_installed());
    assert_eq!(orchestrator.state(), InstallationState::NotInstalled);

    // the service never came up, the installation still counts
    let report = orchestrator.install().unwrap();
    assert!(!report.service_started);
    assert!(orchestrator.probe().is_installed());
    assert_eq!(orchestrator.state(), InstallationState::Installed);
}

#[test]
fn missing_dhcp_directory_is_skipped_both_ways() {
    let host = StagedHost::new().with_systemd();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    let install = orchestrator.install().unwrap();
    assert_eq!(install.dhclient_backup, BackupOutcome::SourceMissing);
    assert_eq!(install.directive, DirectiveOutcome::Skipped);

    let report = removed(orchestrator.uninstall().unwrap());
    assert_eq!(report.dhcp, DhcpRestore::Skipped);
    assert!(!host.config.dhcp_dir().exists());
}

#[test]
fn systemd_unit_is_written_enabled_and_started() {
    let host = StagedHost::new().with_systemd();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);
    assert_eq!(orchestrator.variant(), InitVariant::Systemd);

    let report = orchestrator.install().unwrap();
    assert_eq!(report.service_artifact, host.config.systemd_unit_path());

    let unit = host.read(&host.config.systemd_unit_path());
    assert!(unit.contains("Type=simple"));
    assert!(unit.contains("Restart=always"));
    assert!(unit.contains("User=root"));
    assert!(unit.contains("WantedBy=multi-user.target"));
    assert!(unit.contains(&format!(
        "ExecStart=/usr/bin/python3 {}",
        host.config.binary_path().display()
    )));

    let calls = runner.calls();
    let position = |command: &str| {
        calls
            .iter()
            .position(|c| c == command)
            .unwrap_or_else(|| panic!("{command} was not run"))
    };
    assert!(position("systemctl daemon-reload") < position("systemctl enable resilient-dns"));
    assert!(position("systemctl enable resilient-dns") < position("systemctl start resilient-dns"));
}

#[test]
fn sysvinit_flow_registers_and_removes_script() {
    let host = StagedHost::new().with_dhclient();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(true);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);
    assert_eq!(orchestrator.variant(), InitVariant::SysVInit);

    orchestrator.install().unwrap();
    let script = host.read(&host.config.init_script_path());
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("start-stop-daemon"));
    assert_eq!(runner.count("update-rc.d resilient-dns defaults"), 1);
    assert_eq!(runner.count("service resilient-dns start"), 1);

    let report = removed(orchestrator.uninstall().unwrap());
    assert!(report.data_purged);
    assert!(!host.config.init_script_path().exists());
    assert!(!host.config.data_dir.exists());
    assert_eq!(runner.count("service resilient-dns stop"), 1);
    assert_eq!(runner.count("update-rc.d -f resilient-dns remove"), 1);
    assert_eq!(
        report.network_refresh.as_deref(),
        Some("service networking restart")
    );
    assert_eq!(
        host.read(&host.config.dhclient_conf),
        StagedHost::ORIGINAL_DHCLIENT
    );
}

#[test]
fn uninstall_on_a_clean_host_touches_nothing() {
    let host = StagedHost::new().with_systemd().with_dhclient();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(true);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    let outcome = orchestrator.uninstall().unwrap();
    assert_eq!(outcome, UninstallOutcome::NothingToRemove);
    assert!(runner.calls().is_empty());
    assert_eq!(host.read(&host.config.resolv_conf), StagedHost::ORIGINAL_RESOLVER);
    assert_eq!(
        host.read(&host.config.dhclient_conf),
        StagedHost::ORIGINAL_DHCLIENT
    );
    assert!(!host.config.data_dir.exists());
}

#[test]
fn missing_artifact_aborts_before_any_change() {
    let host = StagedHost::new().with_systemd().with_dhclient();
    fs::remove_dir_all(host.root().join("dist")).unwrap();
    let runner = RecordingRunner::new();
    let prompter = FixedAnswer(false);
    let orchestrator = Orchestrator::new(&host.config, &runner, &prompter);

    let err = orchestrator.install().unwrap_err();
    assert!(matches!(err, Error::ArtifactMissing { .. }));
    assert!(runner.calls().is_empty());
    assert!(!host.config.data_dir.exists());
    assert_eq!(host.read(&host.config.resolv_conf), StagedHost::ORIGINAL_RESOLVER);
    assert!(!host.config.systemd_unit_path().exists());
}
