//! # piwcs-installer
//!
//! A very simple installer and updater for the PIWCS Minecraft modpack.
//!
//! Installing downloads the full modpack archive and unpacks it into an
//! empty game directory. Updating downloads the latest patch archive and
//! runs the small update program it carries: a list of `Extract` and
//! `Delete` instructions that takes an installation from one version to the
//! next. The installed version is tracked by a marker file,
//! `mods/<game version>/PIWCS <version>.txt`.
//!
//! ## Features
//!
//! - Parse and execute update programs ([`program`])
//! - Version gating with a distinct "already up to date" result ([`marker`])
//! - Every path an update program touches is confined to the installation
//! - Read ZIP archives (ZIP64, STORED and DEFLATE) from any [`ReadAt`] source
//!
//! ## Example
//!
//! ```no_run
//! use piwcs_installer::{Action, Console, Outcome, Settings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new("/path/to/.minecraft").with_archive("patch.zip");
//!
//!     match Action::Update.run(&settings, &Console).await? {
//!         Outcome::UpToDate(version) => println!("already at {version}"),
//!         outcome => println!("{outcome}"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod cli;
pub mod error;
pub mod io;
pub mod logging;
pub mod marker;
pub mod program;
pub mod zip;

pub use action::{Action, Outcome, Settings};
pub use cli::Cli;
pub use error::Abort;
pub use io::{LocalFileReader, ReadAt};
pub use logging::{Console, LogSink, MemorySink};
pub use marker::Version;
pub use program::{Instruction, Program};
pub use zip::{ZipArchive, ZipFileEntry};

/// Full name of the tool.
pub const NAME: &str = "PIWCS Modpack VSIaU";

/// Short name, used for temporary files and the HTTP user agent.
pub const SHORT_NAME: &str = "PIWCS_VSIaU";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
