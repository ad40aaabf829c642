//! Anticipated failures that end the current action cleanly.
//!
//! Everything else (disk, network, damaged archives) travels as a plain
//! [`anyhow::Error`] and is reported as unrecoverable by the binary.

use thiserror::Error;

use crate::marker::Version;

/// A structured, caller-anticipated failure.
///
/// Aborts carry a message meant for the user and are printed without a
/// backtrace or error chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Abort {
    #[error(
        "This updater cannot apply the update because the updater is outdated. \
         Reinstall from scratch or get the newest updater. Required syntax version: {required}"
    )]
    OutdatedInterpreter { required: String },

    #[error("Malformed update program: {0}")]
    MalformedProgram(String),

    #[error("Malformed update program: excessive arguments on line {line}")]
    ExcessiveArguments { line: usize },

    #[error("Malformed update program: unknown command \"{name}\" on line {line}")]
    UnknownCommand { name: String, line: usize },

    #[error(
        "Malformed update program: command {name} requires {expected} arguments but {found} provided (line {line})"
    )]
    ArityMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
        line: usize,
    },

    #[error("Malformed update package: update program not found")]
    MissingProgram,

    #[error("Malformed update program: \"{0}\" not found in patch archive")]
    MissingEntry(String),

    #[error("Refusing to touch \"{0}\": path leaves the installation directory")]
    UnsafePath(String),

    #[error("PIWCS modpack not installed: file \"PIWCS <version>.txt\" not found")]
    NotInstalled,

    #[error("Expected version {expected} but found version {found}. Please reinstall from scratch.")]
    WrongVersion { expected: Version, found: Version },

    #[error("{0} is not empty. Please clear it manually")]
    DirectoryNotEmpty(String),
}

impl Abort {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Abort::MalformedProgram(reason.into())
    }
}
