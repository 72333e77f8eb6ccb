//! Fixed command lists for each installed Netmeld component.
//!
//! Input names like `d1` refer to sample files shipped next to the test
//! driver in the tester image.

use serde::Deserialize;
use std::path::Path;

use super::command::CommandSpec;
use super::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    Tools,
    Datalake,
    Datastore,
    /// Datastore tools against an external database, fed an empty file.
    DatastoreEmptyInput,
    Fetchers,
    Playbook,
}

/// Profile-dependent pieces every suite command is built from.
pub(crate) struct SuiteContext<'a> {
    profile: &'a Profile,
    db_flags: Vec<String>,
}

impl<'a> SuiteContext<'a> {
    pub(crate) fn new(profile: &'a Profile, db_flags: Vec<String>) -> Self {
        Self { profile, db_flags }
    }

    fn plain<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(args).accept(self.profile.default_accepted.iter().copied())
    }

    /// A datastore tool: connection flags follow the program name.
    fn datastore(&self, tool: &str) -> CommandSpec {
        let mut spec = self.plain([tool]);
        spec.args.extend(self.db_flags.iter().cloned());
        spec
    }

    fn with_device(&self, spec: CommandSpec) -> CommandSpec {
        spec.arg("--device-id").arg(self.profile.device_id.clone())
    }

    fn with_pipe(&self, spec: CommandSpec) -> CommandSpec {
        if self.profile.pipe {
            spec.arg("--pipe")
        } else {
            spec
        }
    }

    fn inserter(&self, tool: &str) -> CommandSpec {
        self.with_device(self.datastore(tool))
    }

    fn importer(&self, tool: &str, input: &str) -> CommandSpec {
        self.with_pipe(self.with_device(self.datastore(tool)))
            .arg(input)
    }

    fn importer_on_scratch(&self, tool: &str, scratch: &Path) -> CommandSpec {
        self.importer(tool, &scratch.to_string_lossy())
            .stdin(Vec::new())
            .with_scratch()
    }

    pub(crate) fn commands(&self, suite: Suite) -> Vec<CommandSpec> {
        match suite {
            Suite::Tools => self.tools(),
            Suite::Datalake => self.datalake(),
            Suite::Datastore => self.datastore_suite(),
            Suite::DatastoreEmptyInput => self.datastore_empty_input(),
            Suite::Fetchers => self.fetchers(),
            Suite::Playbook => self.playbook(),
        }
    }

    fn tools(&self) -> Vec<CommandSpec> {
        vec![self.plain(["clw", "ls"])]
    }

    fn datalake(&self) -> Vec<CommandSpec> {
        let device = self.profile.device_id.as_str();
        vec![
            self.plain(["nmdl-initialize"]),
            self.plain(["git", "config", "--global", "user.email", "test@localhost"]),
            self.plain(["git", "config", "--global", "user.name", "test"]),
            self.plain([
                "nmdl-insert",
                "--device-id",
                device,
                "--tool",
                "nmdb-import-hosts",
                "/etc/hosts",
            ]),
            self.plain(["nmdl-list"]),
            self.plain(["nmdl-remove", "--device-id", device]),
        ]
    }

    fn datastore_suite(&self) -> Vec<CommandSpec> {
        let mut commands = vec![
            self.datastore("nmdb-initialize").stdin("yes\n"),
            // Other
            self.datastore("nmdb-analyze-data").arg("--example"),
            self.datastore("nmdb-convert-acls"),
            // Exporters
            self.datastore("nmdb-export-port-list").arg("-TUYD"),
            self.datastore("nmdb-export-query")
                .arg("-q")
                .arg("select * from tool_runs"),
            self.datastore("nmdb-export-scans").arg("--intra-network"),
        ];

        // Importers
        let importers: &[(&str, &str)] = &[
            ("nmdb-import-aws-ec2-describe-instances", "d1"),
            ("nmdb-import-aws-ec2-describe-network-acls", "d1"),
            ("nmdb-import-aws-ec2-describe-route-tables", "d1"),
            ("nmdb-import-aws-ec2-describe-security-groups", "d1"),
            ("nmdb-import-aws-ec2-describe-subnets", "d1"),
            ("nmdb-import-aws-ec2-describe-vpcs", "d1"),
            ("nmdb-import-brocade", "d1"),
            ("nmdb-import-cisco", "d1"),
            ("nmdb-import-cisco-show-ip-route", "/dev/null"),
            ("nmdb-import-cisco-wireless", "d1"),
            ("nmdb-import-hosts", "d1"),
            ("nmdb-import-ip-addr-show", "/dev/null"),
            ("nmdb-import-juniper-conf", "/dev/null"),
            ("nmdb-import-juniper-set", "d1"),
            ("nmdb-import-juniper-show-route", "/dev/null"),
            ("nmdb-import-juniper-xml", "d2"),
            ("nmdb-import-paloalto-xml", "d2"),
            ("nmdb-import-pcap", "d4"),
            ("nmdb-import-ping", "d1"),
            ("nmdb-import-powerconnect", "d1"),
            ("nmdb-import-prowler", "d1"),
            ("nmdb-import-show-cdp-neighbor", "d1"),
            ("nmdb-import-show-inventory", "d1"),
            ("nmdb-import-show-mac-address-table", "/dev/null"),
            ("nmdb-import-show-neighbor", "d1"),
            ("nmdb-import-traceroute", "/dev/null"),
        ];
        commands.extend(
            importers
                .iter()
                .map(|(tool, input)| self.importer(tool, input)),
        );
        // tshark captures carry their own device identities.
        commands.push(
            self.with_pipe(self.datastore("nmdb-import-tshark"))
                .arg("d3"),
        );
        commands.push(self.importer("nmdb-import-vyos", "d1"));

        // Inserters
        commands.extend(
            [
                "nmdb-insert-ac",
                "nmdb-insert-address",
                "nmdb-insert-device",
                "nmdb-insert-device-hardware",
            ]
            .iter()
            .map(|tool| self.inserter(tool)),
        );
        commands.push(self.datastore("nmdb-insert-network"));

        // Graphers run last so there is data to pull.
        commands.push(self.inserter("nmdb-graph-ac"));
        commands.push(self.inserter("nmdb-graph-network").arg("--layer").arg("3"));

        commands.push(
            self.datastore("nmdb-remove-tool-run")
                .arg("12345678-1234-1234-1234-123456789012"),
        );
        commands
    }

    /// Only the importers that accept an empty input file are listed.
    fn datastore_empty_input(&self) -> Vec<CommandSpec> {
        let scratch = self.profile.scratch_file.as_path();
        let mut commands = vec![
            // 80: database already initialized and the prompt was declined.
            self.datastore("nmdb-initialize").stdin("n\n").accept([0, 80]),
            self.importer_on_scratch("nmdb-import-brocade-show-ip-route", scratch)
                .accept([1]),
        ];
        commands.extend(
            [
                "nmdb-import-cisco-show-ip-route",
                "nmdb-import-ip-addr-show",
                "nmdb-import-juniper-conf",
                "nmdb-import-juniper-show-route",
                "nmdb-import-show-mac-address-table",
                "nmdb-import-traceroute",
            ]
            .iter()
            .map(|tool| self.importer_on_scratch(tool, scratch)),
        );
        commands.extend(
            [
                "nmdb-insert-ac",
                "nmdb-insert-address",
                "nmdb-insert-device",
                "nmdb-insert-device-hardware",
                "nmdb-insert-network",
            ]
            .iter()
            .map(|tool| self.inserter(tool).stdin(Vec::new())),
        );
        commands
    }

    fn fetchers(&self) -> Vec<CommandSpec> {
        vec![
            self.plain(["nm-fetch-ansible"]).stdin("yes\n"),
            self.plain(["nm-fetch-ssh", "root@localhost", "ls"]),
        ]
    }

    fn playbook(&self) -> Vec<CommandSpec> {
        vec![
            self.datastore("nmdb-playbook-insert-router")
                .arg("--ip-addr")
                .arg("10.0.0.1"),
            self.datastore("nmdb-playbook-insert-source").extend_args([
                "--inter-network",
                "--interface",
                "test1",
                "--ip-addr",
                "10.0.0.10",
                "--stage",
                "1",
            ]),
            self.datastore("nmdb-playbook").arg("--inter-network"),
            self.plain([
                "cisco-type7-decode",
                "--password",
                "046E1803362E595C260E0B240619050A2D",
            ]),
            self.plain([
                "junos-type9-decode",
                "--password",
                "$9$EeDcKWxNb4oGuOWxNd4oz36A01reW-VY5QclvM-daZUi.5/9p",
            ]),
        ]
    }
}
