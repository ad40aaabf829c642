//! Update programs.
//!
//! A patch archive carries an entry named [`PROGRAM_ENTRY`] holding a short
//! program: the version it applies to, the version it produces, and a list
//! of [`Instruction`]s that extract files from the archive or delete files
//! from the installation.
//!
//! - [`parser`]: program text to [`Program`]
//! - [`path`]: confinement of path arguments to the installation directory
//! - [`executor`]: replaying a [`Program`] against the installation

mod command;
mod executor;
mod parser;
pub mod path;

use std::fmt;

pub use command::{Command, Instruction};
pub use executor::{Executor, delete_with_cleanup};
pub use parser::{SYNTAX_VERSION, parse};

use crate::error::Abort;
use crate::marker::Version;

/// Name of the archive entry holding the program text.
pub const PROGRAM_ENTRY: &str = "program";

/// A parsed update program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    expected_version: Version,
    new_version: Version,
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn new(expected_version: Version, new_version: Version, instructions: Vec<Instruction>) -> Self {
        Self {
            expected_version,
            new_version,
            instructions,
        }
    }

    /// Parse program text. See [`parse`].
    pub fn parse(source: &str) -> Result<Self, Abort> {
        parser::parse(source)
    }

    /// Version the installation must be at for the program to apply.
    pub fn expected_version(&self) -> Version {
        self.expected_version
    }

    /// Version the installation is at once the program has run.
    pub fn new_version(&self) -> Version {
        self.new_version
    }

    /// Instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// Writes the program back out as program text.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{SYNTAX_VERSION}")?;
        writeln!(f, "{}", self.expected_version)?;
        writeln!(f, "{}", self.new_version)?;
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }
        Ok(())
    }
}
