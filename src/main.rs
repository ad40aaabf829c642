//! Main entry point for the piwcs-installer CLI application.
//!
//! Picks an action (from the command line or interactively), runs it in
//! the installation directory and reports how it ended.

use std::io::{BufRead, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use piwcs_installer::action::{self, Action};
use piwcs_installer::logging::{self, Console, FileSink, LogSink, Tee};
use piwcs_installer::{Abort, Cli, NAME, VERSION};

/// Application entry point.
///
/// Exit status is 0 on success, when already up to date, or when the
/// interactive chooser is left without a choice; 1 when the action aborts
/// or fails; 2 on a command-line usage error.
#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let log: Box<dyn LogSink> = match &cli.log_file {
        Some(path) => match FileSink::create(path) {
            Ok(file) => Box::new(Tee::new(Console, file)),
            Err(e) => {
                eprintln!("{e:#}");
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(Console),
    };

    let action = match cli.action {
        Some(action) => action,
        None => match choose_action() {
            Some(action) => action,
            None => return ExitCode::SUCCESS,
        },
    };

    print_header(&*log);
    log.line(&format!("Running action {action}"));

    let settings = cli.settings();
    match action.run(&settings, &*log).await {
        Ok(outcome) => {
            log.blank();
            log.line(&outcome.to_string());
            log.line("Done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err, &*log, cli.is_interactive());
            ExitCode::FAILURE
        }
    }
}

/// Run the interactive chooser on stdin/stdout.
///
/// # Returns
///
/// The chosen action, or `None` if the user made no choice.
fn choose_action() -> Option<Action> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    match action::choose(&mut stdin.lock(), &mut stdout) {
        Ok(choice) => choice,
        Err(e) => {
            error!("interactive chooser failed: {e:#}");
            None
        }
    }
}

/// Report a failed action.
///
/// An [`Abort`] is expected and printed as a single message. Anything else
/// is unrecoverable: the whole error chain is logged and, in an interactive
/// session, the process waits for the user to acknowledge it.
fn report_failure(err: &anyhow::Error, log: &dyn LogSink, interactive: bool) {
    log.blank();

    if let Some(abort) = err.downcast_ref::<Abort>() {
        log.line(&format!("Aborted: {abort}"));
        return;
    }

    for line in format!("{err:?}").lines() {
        log.line(line);
    }
    log.line("An unrecoverable error has occurred, terminating");

    if interactive && std::io::stdin().is_terminal() {
        log.line("Press Enter to exit");
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    }
}

/// Print the banner shown before every action.
fn print_header(log: &dyn LogSink) {
    log.line(&format!("PIWCS Modpack Very Simple Installer and Updater version {VERSION}"));
    log.blank();
    log.line("Copyright 2020 Javapony (kvadropups@gmail.com)");
    log.line(&format!(
        "{NAME} is licensed under GNU GPL v3-or-later. This is free software, and you are welcome to redistribute it"
    ));
    log.line("This program comes with ABSOLUTELY NO WARRANTY. For details please refer to the license.");
    log.blank();
}
