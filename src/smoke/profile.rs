//! Environment profiles for the smoke-test driver.
//!
//! A profile says which suites run and how datastore tools reach their
//! database. Built-in profiles cover the tester image (`container`) and
//! the external database setup (`external-db`); anything else can be
//! described in a TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::command::{default_accepted, CommandSpec};
use super::suites::{Suite, SuiteContext};

pub const ENV_DB_HOST: &str = "NETMELD_DB_HOST";
pub const ENV_DB_USER: &str = "NETMELD_DB_USER";
pub const ENV_DB_PASS: &str = "NETMELD_DB_PASS";
pub const ENV_DB_NAME: &str = "NETMELD_DB";

/// Built-in profiles selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BuiltinProfile {
    /// Tester image: every component, local database.
    Container,
    /// Datastore tools against the database named by `NETMELD_DB*`.
    ExternalDb,
}

/// Where datastore tools connect. Unset fields come from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

impl DatabaseSettings {
    /// `--db-args=...` and `--db-name=...`, resolving unset fields with
    /// `lookup` (normally the process environment).
    pub fn flags_with<F>(&self, lookup: F) -> Result<Vec<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |value: &Option<String>, key: &str| -> Result<String> {
            match value {
                Some(v) => Ok(v.clone()),
                None => lookup(key).with_context(|| {
                    format!("database setting missing; set {key} or the profile's [database] table")
                }),
            }
        };

        let host = resolve(&self.host, ENV_DB_HOST)?;
        let user = resolve(&self.user, ENV_DB_USER)?;
        let password = resolve(&self.password, ENV_DB_PASS)?;
        let name = resolve(&self.name, ENV_DB_NAME)?;

        Ok(vec![
            format!("--db-args=host={host} user={user} password={password}"),
            format!("--db-name={name}"),
        ])
    }
}

/// Everything one driver run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub database: Option<DatabaseSettings>,
    /// Pass `--pipe` to importers.
    pub pipe: bool,
    pub device_id: String,
    /// Accepted exit codes for suite commands without their own.
    pub default_accepted: BTreeSet<i32>,
    pub scratch_file: PathBuf,
    /// Run first; outcome is logged but never counted.
    pub setup: Vec<CommandSpec>,
    pub suites: Vec<Suite>,
    /// Run after the suites.
    pub commands: Vec<CommandSpec>,
}

impl Profile {
    pub fn builtin(which: BuiltinProfile) -> Self {
        match which {
            BuiltinProfile::Container => Self {
                name: "container".to_string(),
                database: None,
                pipe: false,
                device_id: "test".to_string(),
                default_accepted: default_accepted(),
                scratch_file: PathBuf::from("blank"),
                setup: Vec::new(),
                suites: vec![
                    Suite::Tools,
                    Suite::Datalake,
                    Suite::Datastore,
                    Suite::Fetchers,
                    Suite::Playbook,
                ],
                commands: Vec::new(),
            },
            BuiltinProfile::ExternalDb => Self {
                name: "external-db".to_string(),
                database: Some(DatabaseSettings::default()),
                pipe: false,
                device_id: "netmeld_test".to_string(),
                // Empty input makes some tools exit 1 and an initialized
                // database makes others exit 80.
                default_accepted: BTreeSet::from([0, 1, 80]),
                scratch_file: PathBuf::from("blank"),
                setup: vec![CommandSpec::new(["service", "postgresql", "start"])],
                suites: vec![Suite::DatastoreEmptyInput],
                commands: Vec::new(),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading smoke-test profile '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("parsing smoke-test profile '{}'", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let parsed: ProfileToml = toml::from_str(text)?;
        Ok(Self {
            name: parsed.name,
            database: parsed.database,
            pipe: parsed.pipe,
            device_id: parsed.device_id.unwrap_or_else(|| "test".to_string()),
            default_accepted: parsed
                .default_accepted
                .map(|codes| codes.into_iter().collect())
                .unwrap_or_else(default_accepted),
            scratch_file: parsed.scratch_file.unwrap_or_else(|| PathBuf::from("blank")),
            setup: parsed.setup,
            suites: parsed.suites,
            commands: parsed.commands,
        })
    }

    /// Ordered command list, with database flags taken from `lookup`.
    pub fn commands_with<F>(&self, lookup: F) -> Result<Vec<CommandSpec>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_flags = match &self.database {
            Some(settings) => settings
                .flags_with(lookup)
                .with_context(|| format!("resolving database for profile '{}'", self.name))?,
            None => Vec::new(),
        };

        let context = SuiteContext::new(self, db_flags);
        let mut commands: Vec<CommandSpec> = self
            .suites
            .iter()
            .flat_map(|suite| context.commands(*suite))
            .collect();
        commands.extend(self.commands.iter().cloned());
        Ok(commands)
    }

    pub fn commands(&self) -> Result<Vec<CommandSpec>> {
        self.commands_with(|key| std::env::var(key).ok())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileToml {
    name: String,
    database: Option<DatabaseSettings>,
    #[serde(default)]
    pipe: bool,
    device_id: Option<String>,
    default_accepted: Option<Vec<i32>>,
    scratch_file: Option<PathBuf>,
    #[serde(default)]
    setup: Vec<CommandSpec>,
    #[serde(default)]
    suites: Vec<Suite>,
    #[serde(default)]
    commands: Vec<CommandSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(key: &str) -> Option<String> {
        match key {
            ENV_DB_HOST => Some("db.local".to_string()),
            ENV_DB_USER => Some("netmeld".to_string()),
            ENV_DB_PASS => Some("secret".to_string()),
            ENV_DB_NAME => Some("site".to_string()),
            _ => None,
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_container_profile_has_no_db_flags() {
        let profile = Profile::builtin(BuiltinProfile::Container);
        let commands = profile.commands_with(no_env).unwrap();
        assert_eq!(commands[0].args, vec!["clw", "ls"]);
        assert!(commands
            .iter()
            .all(|c| !c.args.iter().any(|a| a.starts_with("--db-"))));

        let init = commands
            .iter()
            .find(|c| c.args[0] == "nmdb-initialize")
            .unwrap();
        assert_eq!(init.stdin.as_deref(), Some(&b"yes\n"[..]));

        let hosts = commands
            .iter()
            .find(|c| c.args[0] == "nmdb-import-hosts")
            .unwrap();
        assert_eq!(hosts.args, vec!["nmdb-import-hosts", "--device-id", "test", "d1"]);
    }

    #[test]
    fn test_container_suite_order() {
        let commands = Profile::builtin(BuiltinProfile::Container)
            .commands_with(no_env)
            .unwrap();
        let first_of = |name: &str| commands.iter().position(|c| c.args[0] == name).unwrap();
        assert!(first_of("clw") < first_of("nmdl-initialize"));
        assert!(first_of("nmdl-initialize") < first_of("nmdb-initialize"));
        assert!(first_of("nmdb-insert-network") < first_of("nmdb-graph-ac"));
        assert!(first_of("nmdb-remove-tool-run") < first_of("nm-fetch-ansible"));
        assert_eq!(commands.last().unwrap().args[0], "junos-type9-decode");
    }

    #[test]
    fn test_external_db_profile_flags_and_codes() {
        let profile = Profile::builtin(BuiltinProfile::ExternalDb);
        let commands = profile.commands_with(env).unwrap();

        let init = &commands[0];
        assert_eq!(
            init.args,
            vec![
                "nmdb-initialize",
                "--db-args=host=db.local user=netmeld password=secret",
                "--db-name=site",
            ]
        );
        assert_eq!(init.stdin.as_deref(), Some(&b"n\n"[..]));
        assert_eq!(init.accepted, BTreeSet::from([0, 80]));

        let brocade = &commands[1];
        assert_eq!(brocade.args[0], "nmdb-import-brocade-show-ip-route");
        assert_eq!(brocade.accepted, BTreeSet::from([1]));
        assert!(brocade.uses_scratch);
        assert_eq!(brocade.args.last().unwrap(), "blank");
        assert_eq!(brocade.args[3..5], ["--device-id", "netmeld_test"]);

        assert_eq!(profile.default_accepted, BTreeSet::from([0, 1, 80]));
        let insert_ac = commands
            .iter()
            .find(|c| c.args[0] == "nmdb-insert-ac")
            .unwrap();
        assert_eq!(insert_ac.accepted, BTreeSet::from([0, 1, 80]));
        assert_eq!(insert_ac.args[3..], ["--device-id", "netmeld_test"]);

        let network = commands.last().unwrap();
        assert_eq!(network.args[0], "nmdb-insert-network");
        assert_eq!(network.accepted, BTreeSet::from([0, 1, 80]));
        assert!(!network.uses_scratch);
        assert_eq!(network.stdin.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_external_db_requires_environment() {
        let profile = Profile::builtin(BuiltinProfile::ExternalDb);
        let err = profile.commands_with(no_env).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_DB_HOST));
    }

    #[test]
    fn test_pipe_applies_to_importers_only() {
        let mut profile = Profile::builtin(BuiltinProfile::ExternalDb);
        profile.pipe = true;
        let commands = profile.commands_with(env).unwrap();

        for command in &commands {
            let piped = command.args.iter().any(|a| a == "--pipe");
            let importer = command.args[0].starts_with("nmdb-import-");
            assert_eq!(piped, importer, "{}", command.display());
        }
        let traceroute = commands
            .iter()
            .find(|c| c.args[0] == "nmdb-import-traceroute")
            .unwrap();
        let n = traceroute.args.len();
        assert_eq!(traceroute.args[n - 2..], ["--pipe", "blank"]);
    }

    #[test]
    fn test_profile_from_toml() {
        let profile = Profile::from_toml(
            r#"
            name = "ci"
            pipe = true
            default_accepted = [0, 1, 80]
            suites = ["datastore-empty-input"]

            [database]
            host = "ci-db"

            [[setup]]
            args = ["service", "postgresql", "start"]

            [[commands]]
            args = ["nmdb-export-query", "-q", "select 1"]
            "#,
        )
        .unwrap();

        assert_eq!(profile.name, "ci");
        assert_eq!(profile.device_id, "test");
        assert_eq!(profile.default_accepted, BTreeSet::from([0, 1, 80]));
        assert_eq!(profile.setup.len(), 1);

        let commands = profile.commands_with(env).unwrap();
        assert!(commands[2].args[1].contains("host=ci-db"));
        // Suite commands without explicit codes use the profile default.
        assert_eq!(commands[2].accepted, BTreeSet::from([0, 1, 80]));
        assert_eq!(commands.last().unwrap().args[0], "nmdb-export-query");
        assert_eq!(commands.last().unwrap().accepted, BTreeSet::from([0]));
    }

    #[test]
    fn test_profile_toml_rejects_unknown_suite() {
        assert!(Profile::from_toml("name = \"x\"\nsuites = [\"everything\"]").is_err());
        assert!(Profile::from_toml("name = \"x\"\nretries = 3").is_err());
    }

    #[test]
    fn test_load_names_file_on_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("profile.toml");
        fs::write(&path, "not = [valid").unwrap();
        let err = Profile::load(&path).unwrap_err();
        assert!(err.to_string().contains("profile.toml"));
    }
}
