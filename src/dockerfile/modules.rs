use super::{apt, GenerateOptions, Instruction, Module, BASE_IMAGE, IMAGE_HOME, IMAGE_USER};

const RELEASE_API: &str = "https://api.github.com/repos/netmeld/netmeld/releases/latest";
const RELEASE_URL_PATTERN: &str = r#"'"browser_download_url": "\K(.*)(?=")'"#;
const RELEASE_ZIP: &str = "netmeld-debs.zip";
const FETCH_PACKAGES: &str = "curl unzip";
const SUDOERS_DROP_IN: &str = "/etc/sudoers.d/netmeld-psql";

const DEVELOPMENT_PACKAGES: &[&str] = &[
    "debconf",
    "build-essential",
    "cmake",
    "make",
    "gcc",
    "g++",
    "git",
    "help2man",
    "pandoc",
    "libboost-date-time-dev",
    "libboost-iostreams-dev",
    "libboost-program-options-dev",
    "libboost-system-dev",
    "libboost-test-dev",
    "libpqxx-dev",
    "libpugixml-dev",
    "libpcap0.8-dev",
    "nlohmann-json3-dev",
    "libyaml-cpp-dev",
    "python3",
    "apt-transport-https",
    "ca-certificates",
];

/// Accumulates the instructions for one image.
struct ImageBuilder {
    instructions: Vec<Instruction>,
    stay_root: bool,
}

impl ImageBuilder {
    fn new(options: GenerateOptions) -> Self {
        let mut builder = Self {
            instructions: Vec::new(),
            stay_root: options.stay_root,
        };
        builder.header();
        builder
    }

    fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    fn run(&mut self, line: impl Into<String>) -> &mut Self {
        self.push(Instruction::Run(line.into()))
    }

    fn header(&mut self) {
        self.push(Instruction::From(BASE_IMAGE.to_string()))
            .push(Instruction::Env {
                key: "DEBIAN_FRONTEND".to_string(),
                value: "noninteractive".to_string(),
            })
            .run(format!("useradd -m -s /bin/bash {IMAGE_USER}"))
            .push(Instruction::Workdir(IMAGE_HOME.to_string()));
    }

    /// Download and unpack the latest release debs, then drop the tools
    /// used to fetch them.
    fn fetch_release(&mut self) -> &mut Self {
        let curl = "curl -k --silent";
        self.push(apt::update())
            .push(apt::install(FETCH_PACKAGES, &[]))
            .run(format!(
                "{curl} --location `{curl} {RELEASE_API} | grep -oP {RELEASE_URL_PATTERN}` --output {RELEASE_ZIP}"
            ))
            .run(format!("unzip -qq {RELEASE_ZIP}"))
            .push(apt::autoremove_purge(FETCH_PACKAGES))
    }

    fn install(&mut self, packages: &str) -> &mut Self {
        self.push(apt::install(packages, &[]))
    }

    fn install_without_recommends(&mut self, packages: &str) -> &mut Self {
        self.push(apt::install(packages, &["--no-install-recommends"]))
    }

    /// Let the image user start and stop the local database.
    fn enable_db_user(&mut self) -> &mut Self {
        self.run(format!(
            "echo \"{IMAGE_USER} ALL=(root) NOPASSWD:/usr/sbin/service postgresql *\" > {SUDOERS_DROP_IN}"
        ))
    }

    fn clean_up(&mut self) -> &mut Self {
        self.run("rm -rf ./netmeld*")
            .run("rm -rf /var/lib/apt/lists/*")
    }

    fn close_out(&mut self) -> &mut Self {
        if !self.stay_root {
            self.push(Instruction::User(IMAGE_USER.to_string()));
        }
        self.push(Instruction::Cmd(vec!["/bin/bash".to_string()]))
    }

    fn finish(self) -> Vec<Instruction> {
        self.instructions
    }
}

pub(super) fn build(module: Module, options: GenerateOptions) -> Vec<Instruction> {
    let mut image = ImageBuilder::new(options);

    match module {
        Module::All => {
            image
                .fetch_release()
                .install("sudo ./netmeld-*.deb")
                .enable_db_user()
                .clean_up()
                .close_out();
        }
        Module::Clw => {
            image
                .fetch_release()
                .install("./netmeld-*core.deb ./netmeld-*tool-clw.deb")
                .clean_up()
                .close_out();
        }
        Module::Datalake => {
            image
                .fetch_release()
                .install("./netmeld-*core.deb ./netmeld-*datalake.deb")
                .clean_up()
                .close_out();
        }
        Module::DatastoreAll => {
            image
                .fetch_release()
                .install("sudo ./netmeld-*core.deb ./netmeld-*datastore*.deb")
                .enable_db_user()
                .clean_up()
                .close_out();
        }
        Module::DatastoreDb => {
            image
                .fetch_release()
                .install("sudo ./netmeld-*core.deb ./netmeld-*datastore.deb")
                .enable_db_user()
                .clean_up()
                .close_out();
        }
        Module::DatastoreTools => {
            image
                .fetch_release()
                .install("./netmeld-*core.deb")
                .install_without_recommends("./netmeld-*datastore*.deb")
                .clean_up()
                .close_out();
        }
        Module::Development => {
            // Build containers are always used as root.
            image.stay_root = true;
            image
                .push(apt::update())
                .install(&DEVELOPMENT_PACKAGES.join(" "))
                .run("update-ca-certificates")
                .clean_up()
                .close_out();
        }
        Module::Fetchers => {
            image
                .fetch_release()
                .install("./netmeld-*fetchers.deb")
                .clean_up()
                .close_out();
        }
        Module::PlaybookNoDb => {
            image
                .fetch_release()
                .install("./netmeld-*core.deb")
                .install_without_recommends("./netmeld-*datastore.deb")
                .install("./netmeld-*playbook.deb")
                .clean_up()
                .close_out();
        }
        Module::Tester => {
            image
                .fetch_release()
                .install("sudo ./netmeld-*.deb")
                .enable_db_user()
                .clean_up()
                .push(Instruction::Copy {
                    src: "./testing".to_string(),
                    dest: format!("{IMAGE_HOME}/"),
                })
                .run(format!("chown -R {IMAGE_USER}:{IMAGE_USER} {IMAGE_HOME}"))
                .push(Instruction::User(IMAGE_USER.to_string()))
                .push(Instruction::Entrypoint(vec![
                    "/bin/bash".to_string(),
                    format!("{IMAGE_HOME}/run.sh"),
                ]))
                .push(Instruction::Cmd(vec!["run".to_string()]));
        }
    }

    image.finish()
}
