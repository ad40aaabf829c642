//! The command vocabulary of update programs.

use std::fmt;

/// A command an update program may invoke.
///
/// The set is closed; [`Command::ALL`] is the registry the parser resolves
/// names against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `Extract; <archive path>; <destination path>`
    Extract,
    /// `Delete; <target path>`
    Delete,
}

impl Command {
    pub const ALL: [Command; 2] = [Command::Extract, Command::Delete];

    /// Largest arity of any known command.
    pub const MAX_ARITY: usize = max_arity();

    /// Name as written in program text.
    pub const fn name(self) -> &'static str {
        match self {
            Command::Extract => "Extract",
            Command::Delete => "Delete",
        }
    }

    /// Number of arguments the command takes.
    pub const fn arity(self) -> usize {
        match self {
            Command::Extract => 2,
            Command::Delete => 1,
        }
    }

    /// Look up a command by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.name() == name)
    }
}

const fn max_arity() -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < Command::ALL.len() {
        if Command::ALL[i].arity() > max {
            max = Command::ALL[i].arity();
        }
        i += 1;
    }
    max
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One step of an update program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Copy archive entry `source` to `dest`, relative to the install root.
    Extract { source: String, dest: String },
    /// Remove `target`, then any parent directories left empty.
    Delete { target: String },
}

impl Instruction {
    /// Build an instruction from a command and exactly `command.arity()`
    /// arguments. Returns `None` when the count is wrong.
    pub fn new(command: Command, args: Vec<String>) -> Option<Instruction> {
        if args.len() != command.arity() {
            return None;
        }

        let mut args = args.into_iter();
        let instruction = match command {
            Command::Extract => Instruction::Extract {
                source: args.next()?,
                dest: args.next()?,
            },
            Command::Delete => Instruction::Delete {
                target: args.next()?,
            },
        };
        Some(instruction)
    }

    pub fn command(&self) -> Command {
        match self {
            Instruction::Extract { .. } => Command::Extract,
            Instruction::Delete { .. } => Command::Delete,
        }
    }

    /// Arguments in program-text order.
    pub fn args(&self) -> Vec<&str> {
        match self {
            Instruction::Extract { source, dest } => vec![source.as_str(), dest.as_str()],
            Instruction::Delete { target } => vec![target.as_str()],
        }
    }

    /// Progress message logged before the instruction runs.
    pub fn describe(&self) -> String {
        match self {
            Instruction::Extract { dest, .. } => format!("Extracting {dest}"),
            Instruction::Delete { target } => format!("Deleting {target}"),
        }
    }
}

/// Formats the instruction as one line of program text, without the newline.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command().name())?;
        for arg in self.args() {
            write!(f, "; {arg}")?;
        }
        Ok(())
    }
}
