use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;

/// One smoke-test invocation and the exit codes that count as a pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub args: Vec<String>,
    #[serde(default, deserialize_with = "stdin_text")]
    pub stdin: Option<Vec<u8>>,
    #[serde(default = "default_accepted")]
    pub accepted: BTreeSet<i32>,
    /// The scratch placeholder file must exist while this command runs.
    #[serde(default)]
    pub uses_scratch: bool,
}

pub fn default_accepted() -> BTreeSet<i32> {
    BTreeSet::from([0])
}

impl CommandSpec {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            accepted: default_accepted(),
            uses_scratch: false,
        }
    }

    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    pub fn accept<I: IntoIterator<Item = i32>>(mut self, codes: I) -> Self {
        self.accepted = codes.into_iter().collect();
        self
    }

    pub fn with_scratch(mut self) -> Self {
        self.uses_scratch = true;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn extend_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn is_accepted(&self, code: i32) -> bool {
        self.accepted.contains(&code)
    }

    pub fn display(&self) -> String {
        self.args.join(" ")
    }
}

/// Profile files spell stdin as text.
fn stdin_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(String::into_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accepts_only_zero() {
        let spec = CommandSpec::new(["true"]);
        assert!(spec.is_accepted(0));
        assert!(!spec.is_accepted(1));
    }

    #[test]
    fn test_accept_replaces_default() {
        let spec = CommandSpec::new(["nmdb-initialize"]).accept([0, 80]);
        assert!(spec.is_accepted(80));
        assert!(!spec.is_accepted(1));

        let spec = CommandSpec::new(["x"]).accept([1]);
        assert!(!spec.is_accepted(0));
    }

    #[test]
    fn test_deserialize_defaults() {
        let spec: CommandSpec = toml::from_str(r#"args = ["clw", "ls"]"#).unwrap();
        assert_eq!(spec, CommandSpec::new(["clw", "ls"]));
    }

    #[test]
    fn test_deserialize_stdin_and_codes() {
        let spec: CommandSpec = toml::from_str(
            r#"
            args = ["nmdb-initialize"]
            stdin = "n\n"
            accepted = [0, 80]
            "#,
        )
        .unwrap();
        assert_eq!(spec.stdin.as_deref(), Some(&b"n\n"[..]));
        assert_eq!(spec.accepted, BTreeSet::from([0, 80]));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<CommandSpec>("args = []\nretries = 2").is_err());
    }
}
