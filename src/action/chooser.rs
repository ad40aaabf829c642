use std::io::{BufRead, Write};

use anyhow::Result;

use super::Action;

/// Ask the user which action to run.
///
/// Accepts a number from the menu or an action name in any case. Returns
/// `None` on an empty line or end of input.
pub fn choose<I: BufRead, O: Write>(input: &mut I, output: &mut O) -> Result<Option<Action>> {
    writeln!(output, "Choose an action:")?;
    for (i, action) in Action::ALL.iter().enumerate() {
        writeln!(output, "  {}) {action}", i + 1)?;
    }

    loop {
        write!(output, "Enter a number or name (empty to quit): ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let choice = line.trim();
        if choice.is_empty() {
            return Ok(None);
        }

        let action = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Action::ALL.get(i).copied())
            .or_else(|| Action::from_name(choice));

        match action {
            Some(action) => return Ok(Some(action)),
            None => writeln!(output, "Unknown choice \"{choice}\"")?,
        }
    }
}
