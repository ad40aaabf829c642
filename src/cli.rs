use clap::Parser;
use std::path::PathBuf;

use crate::action::{Action, DEFAULT_BASE_URL, DEFAULT_GAME_VERSION, Settings};

#[derive(Parser, Debug)]
#[command(name = "piwcs-installer")]
#[command(version)]
#[command(about = "PIWCS Modpack Very Simple Installer and Updater", long_about = None)]
#[command(after_help = "Operates in the working directory (or --dir).\n\nExamples:\n  \
  piwcs-installer install               install the modpack into an empty game directory\n  \
  piwcs-installer update                apply the latest patch\n  \
  piwcs-installer update --archive p.zip  apply a patch downloaded by hand\n  \
  piwcs-installer                       choose interactively")]
pub struct Cli {
    /// Action to run, in any case; omit to choose interactively
    #[arg(value_enum, ignore_case = true, value_name = "ACTION")]
    pub action: Option<Action>,

    /// Installation directory
    #[arg(short = 'd', long = "dir", value_name = "DIR", env = "PIWCS_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Server the modpack and its patches are fetched from
    #[arg(long, value_name = "URL", env = "PIWCS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Use a local archive instead of downloading
    #[arg(short = 'a', long, value_name = "FILE")]
    pub archive: Option<PathBuf>,

    /// Minecraft version the modpack is for
    #[arg(long, value_name = "VERSION", default_value = DEFAULT_GAME_VERSION)]
    pub game_version: String,

    /// Also write the log to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            root: self.dir.clone(),
            base_url: self.base_url.clone(),
            archive: self.archive.clone(),
            game_version: self.game_version.clone(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.action.is_none()
    }
}
