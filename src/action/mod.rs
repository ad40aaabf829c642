//! The two things the tool can do: a clean install and an incremental update.

mod chooser;
mod install;
mod update;

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;

pub use chooser::choose;
pub use install::{check_directories, install, install_path};
pub use update::{read_program, update};

use crate::io::{self, Download, LocalFileReader};
use crate::logging::LogSink;
use crate::marker::Version;
use crate::zip::ZipArchive;

pub const DEFAULT_BASE_URL: &str = "http://windcorp.ru/";
pub const DEFAULT_GAME_VERSION: &str = "1.7.10";

/// Where and how an action operates.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Installation (working) directory.
    pub root: PathBuf,
    /// Root URL the remote resources are resolved against.
    pub base_url: String,
    /// Use this local archive instead of downloading one.
    pub archive: Option<PathBuf>,
    /// Minecraft version naming the `mods/<version>` directory.
    pub game_version: String,
}

impl Settings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            archive: None,
            game_version: DEFAULT_GAME_VERSION.to_string(),
        }
    }

    pub fn with_archive(mut self, archive: impl Into<PathBuf>) -> Self {
        self.archive = Some(archive.into());
        self
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.root.join("mods")
    }

    /// Directory holding the version marker.
    pub fn marker_dir(&self) -> PathBuf {
        self.mods_dir().join(&self.game_version)
    }

    /// Concrete URL of a remote resource.
    pub fn url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource.path())
    }
}

/// The remote archives the tool knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    FullPackage,
    LatestPatch,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Resource::FullPackage => "pages/piwcs/latest/",
            Resource::LatestPatch => "pages/piwcs/latest_patch/",
        }
    }
}

/// An opened archive, together with the temporary file backing it when it
/// was downloaded.
pub struct Package {
    pub archive: ZipArchive<LocalFileReader>,
    _download: Option<Download>,
}

impl Package {
    /// Open `resource`, from [`Settings::archive`] when set, otherwise by
    /// downloading it.
    pub async fn obtain(settings: &Settings, resource: Resource, log: &dyn LogSink) -> Result<Self> {
        let (reader, download) = match &settings.archive {
            Some(path) => {
                log.line(&format!("Using local archive {}", path.display()));
                (LocalFileReader::new(path)?, None)
            }
            None => {
                let download = io::download(&settings.url(resource), log).await?;
                (download.reader()?, Some(download))
            }
        };

        Ok(Self {
            archive: ZipArchive::open(reader).await?,
            _download: download,
        })
    }
}

/// An action selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Install the modpack from scratch
    Install,
    /// Update an installed modpack to the latest version
    Update,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Install, Action::Update];

    pub fn name(self) -> &'static str {
        match self {
            Action::Install => "Install",
            Action::Update => "Update",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name))
    }

    pub async fn run(self, settings: &Settings, log: &dyn LogSink) -> Result<Outcome> {
        match self {
            Action::Install => install(settings, log).await,
            Action::Update => update(settings, log).await,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a successful action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Full package unpacked; carries the version its marker names, if any.
    Installed(Option<Version>),
    /// Patch applied.
    Updated { from: Version, to: Version },
    /// Nothing to do: the installation is already at the patch's version.
    UpToDate(Version),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Installed(Some(version)) => write!(f, "Installed modpack version {version}"),
            Outcome::Installed(None) => f.write_str("Installed modpack"),
            Outcome::Updated { from, to } => write!(f, "Updated modpack from {from} to {to}"),
            Outcome::UpToDate(version) => {
                write!(f, "Modpack is already up to date (version {version}), nothing to do")
            }
        }
    }
}
