//! `apt` command lines for image build steps.

use super::Instruction;

/// Package name fragments whose install is known to fail on the first
/// attempt inside a fresh image and succeed on the second.
const RETRY_MARKERS: &[&str] = &["datastore.deb", "datastore*.deb", "netmeld-*.deb"];

/// The `apt` sub-commands the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AptAction {
    Update,
    Install,
    Autoremove,
}

impl AptAction {
    fn as_str(self) -> &'static str {
        match self {
            AptAction::Update => "update",
            AptAction::Install => "install",
            AptAction::Autoremove => "autoremove",
        }
    }
}

/// Build `apt <action>` with the non-interactive options plus `extra`.
pub fn apt_command(action: AptAction, extra: &[&str]) -> Vec<String> {
    let mut words = vec![
        "apt".to_string(),
        action.as_str().to_string(),
        "--quiet".to_string(),
        "--quiet".to_string(),
        "--assume-yes".to_string(),
        "--option".to_string(),
        "Dpkg::Use-Pty=0".to_string(),
    ];
    if action == AptAction::Install {
        words.push("--no-install-suggests".to_string());
    }
    words.extend(extra.iter().map(|s| s.to_string()));
    words
}

/// Whether an install of `packages` gets the inline `cmd || cmd` retry.
pub fn needs_install_retry(packages: &str) -> bool {
    RETRY_MARKERS.iter().any(|marker| packages.contains(marker))
}

/// `RUN apt install ... <packages>`, doubled up for the flaky local debs.
pub fn install(packages: &str, extra: &[&str]) -> Instruction {
    let mut words = apt_command(AptAction::Install, extra);
    words.push(packages.to_string());
    let line = words.join(" ");

    if needs_install_retry(packages) {
        Instruction::Run(format!("{line} || {line}"))
    } else {
        Instruction::Run(line)
    }
}

pub fn update() -> Instruction {
    Instruction::Run(apt_command(AptAction::Update, &[]).join(" "))
}

pub fn autoremove_purge(packages: &str) -> Instruction {
    let mut words = apt_command(AptAction::Autoremove, &["--purge"]);
    words.push(packages.to_string());
    Instruction::Run(words.join(" "))
}
