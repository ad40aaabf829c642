//! Parser for update program text.
//!
//! ## Grammar
//!
//! ```text
//! 0                              syntax version, one character
//! 1.2.0                          expected (installed) version
//! 1.3.0                          new version
//! Extract; files/a.jar; mods/1.7.10/a.jar
//! Delete; mods/1.7.10/old.jar
//! ```
//!
//! The body is scanned one character at a time. The command name runs up to
//! the first `;`; every `;` must be followed by exactly one space and opens
//! the next argument. At each newline, and once more at end of input, the
//! accumulated line is resolved against the [`Command`] registry. Lines with
//! an empty command name are skipped.

use std::str::Chars;

use crate::error::Abort;
use crate::marker::Version;

use super::Program;
use super::command::{Command, Instruction};

/// The only syntax version this interpreter understands.
pub const SYNTAX_VERSION: char = '0';

/// Line of the first instruction; lines 1-3 are the header.
const FIRST_BODY_LINE: usize = 4;

/// Parse program text.
///
/// # Errors
///
/// Any deviation from the grammar is an [`Abort`]. A wrong syntax version is
/// reported as [`Abort::OutdatedInterpreter`] before anything else is read.
pub fn parse(source: &str) -> Result<Program, Abort> {
    let mut chars = source.chars();

    let (expected_version, new_version) = parse_header(&mut chars)?;
    let instructions = parse_body(chars)?;

    Ok(Program::new(expected_version, new_version, instructions))
}

fn parse_header(chars: &mut Chars<'_>) -> Result<(Version, Version), Abort> {
    match chars.next() {
        Some(SYNTAX_VERSION) => {}
        other => {
            return Err(Abort::OutdatedInterpreter {
                required: other.map(String::from).unwrap_or_else(|| "<none>".to_string()),
            });
        }
    }

    if chars.next() != Some('\n') {
        return Err(Abort::malformed(
            "unexpected char or EOF after syntax version, expected '\\n'",
        ));
    }

    let expected = header_version(chars, "expected version")?;
    let new = header_version(chars, "new version")?;
    Ok((expected, new))
}

fn header_version(chars: &mut Chars<'_>, what: &str) -> Result<Version, Abort> {
    let mut text = String::new();
    loop {
        match chars.next() {
            Some('\n') => break,
            Some(c) => text.push(c),
            None => {
                return Err(Abort::malformed(format!(
                    "unexpected EOF while reading the {what}"
                )));
            }
        }
    }

    text.parse::<Version>()
        .map_err(|e| Abort::malformed(format!("bad {what}: {e}")))
}

/// Accumulates one instruction line.
struct Line {
    number: usize,
    name: String,
    args: [String; Command::MAX_ARITY],
    /// Delimiters seen so far; 0 while still reading the command name.
    element: usize,
}

impl Line {
    fn new() -> Self {
        Self {
            number: FIRST_BODY_LINE,
            name: String::new(),
            args: Default::default(),
            element: 0,
        }
    }

    fn push(&mut self, c: char) {
        match self.element {
            0 => self.name.push(c),
            n => self.args[n - 1].push(c),
        }
    }

    fn open_argument(&mut self) -> Result<(), Abort> {
        if self.element >= Command::MAX_ARITY {
            return Err(Abort::ExcessiveArguments { line: self.number });
        }
        self.args[self.element].clear();
        self.element += 1;
        Ok(())
    }

    /// Resolve the accumulated line and reset for the next one.
    fn finish(&mut self) -> Result<Option<Instruction>, Abort> {
        let instruction = self.compile()?;
        self.name.clear();
        self.element = 0;
        self.number += 1;
        Ok(instruction)
    }

    fn compile(&self) -> Result<Option<Instruction>, Abort> {
        if self.name.is_empty() {
            return Ok(None);
        }

        let command = Command::from_name(&self.name).ok_or_else(|| Abort::UnknownCommand {
            name: self.name.clone(),
            line: self.number,
        })?;

        let arity_mismatch = || Abort::ArityMismatch {
            name: command.name(),
            expected: command.arity(),
            found: self.element,
            line: self.number,
        };

        if self.element != command.arity() {
            return Err(arity_mismatch());
        }

        let args = self.args[..self.element].to_vec();
        Instruction::new(command, args)
            .map(Some)
            .ok_or_else(arity_mismatch)
    }
}

fn parse_body(mut chars: Chars<'_>) -> Result<Vec<Instruction>, Abort> {
    let mut instructions = Vec::new();
    let mut line = Line::new();

    while let Some(c) = chars.next() {
        match c {
            ';' => {
                line.open_argument()?;
                if chars.next() != Some(' ') {
                    return Err(Abort::malformed(format!(
                        "unexpected char or EOF after a semicolon on line {}, expected ' '",
                        line.number
                    )));
                }
            }
            '\n' => instructions.extend(line.finish()?),
            c => line.push(c),
        }
    }

    // The last line need not end with a newline.
    instructions.extend(line.finish()?);

    Ok(instructions)
}
