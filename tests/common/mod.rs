#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use resilient_dns_deploy::DeployConfig;
use resilient_dns_deploy::system::{CommandOutput, CommandRunner};
use tempfile::TempDir;

/// Records commands and reports success for all of them, except the
/// command lines listed as failing
#[derive(Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<String>>,
    failing: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, command: &str) -> Self {
        self.failing.insert(command.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == command).count()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[&str]) -> resilient_dns_deploy::Result<CommandOutput> {
        let line = if args.is_empty() {
            program.to_string()
        } else {
            format!("{program} {}", args.join(" "))
        };
        self.calls.borrow_mut().push(line.clone());

        if self.failing.contains(&line) {
            Ok(CommandOutput::failed(1, format!("{line}: simulated failure")))
        } else {
            Ok(CommandOutput::ok(""))
        }
    }

    fn command_exists(&self, _program: &str) -> bool {
        true
    }
}

/// A host filesystem rooted in a temporary directory
pub struct StagedHost {
    pub dir: TempDir,
    pub config: DeployConfig,
}

impl StagedHost {
    pub const ORIGINAL_RESOLVER: &'static str = concat!(
        "# managed by the lab DHCP server\n",
        "search lab.example\n",
        "nameserver 192.168.10.1\n",
        "nameserver 192.168.10.2\n",
    );
    pub const ORIGINAL_DHCLIENT: &'static str = concat!(
        "option rfc3442-classless-static-routes code 121 = array of unsigned integer 8;\n",
        "request subnet-mask, broadcast-address, routers;\n",
    );
    pub const RESOLVED_STUB: &'static str = "nameserver 127.0.0.53\noptions edns0 trust-ad\n";
    /// Relative link target, as systemd-resolved installs it
    pub const RESOLVED_STUB_LINK: &'static str = "../run/systemd/resolve/stub-resolv.conf";

    /// Host with a resolver file, no DHCP client directory, and the proxy
    /// source ready to deploy
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let source = dir.path().join("dist");
        fs::create_dir_all(&source).expect("create source dir");
        fs::write(
            source.join("resilient_dns.py"),
            "#!/usr/bin/env python3\nprint('resilient dns')\n",
        )
        .expect("write artifact");

        let config = DeployConfig {
            source_dir: Some(source),
            ..DeployConfig::default()
        }
        .rebased(dir.path());
        fs::create_dir_all(config.resolv_conf.parent().expect("resolver dir"))
            .expect("create /etc");
        fs::write(&config.resolv_conf, Self::ORIGINAL_RESOLVER).expect("write resolver");

        Self { dir, config }
    }

    pub fn with_systemd(self) -> Self {
        fs::create_dir_all(&self.config.systemd_runtime_dir).expect("create systemd runtime dir");
        self
    }

    /// Replace the resolver file with a link to the systemd-resolved stub
    pub fn with_resolved_stub(self) -> Self {
        let stub = self.dir.path().join("run/systemd/resolve/stub-resolv.conf");
        fs::create_dir_all(stub.parent().expect("stub dir")).expect("create stub dir");
        fs::write(&stub, Self::RESOLVED_STUB).expect("write stub");
        fs::remove_file(&self.config.resolv_conf).expect("remove resolver");
        std::os::unix::fs::symlink(Self::RESOLVED_STUB_LINK, &self.config.resolv_conf)
            .expect("link resolver");
        self
    }

    pub fn with_dhclient(self) -> Self {
        fs::create_dir_all(self.config.dhcp_dir()).expect("create dhcp dir");
        fs::write(&self.config.dhclient_conf, Self::ORIGINAL_DHCLIENT).expect("write dhclient");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("read staged file")
    }
}
