use anyhow::Result;
use tracing::debug;

use crate::error::Abort;
use crate::io::ReadAt;
use crate::logging::LogSink;
use crate::marker::{self, VersionCheck};
use crate::program::{Executor, PROGRAM_ENTRY, Program};
use crate::zip::ZipArchive;

use super::{Outcome, Package, Resource, Settings};

/// Bring an installation up to date by applying the latest patch.
///
/// The patch's program is parsed and its expected version checked against
/// the installed marker before anything on disk changes. An installation
/// already at the patch's new version yields [`Outcome::UpToDate`].
pub async fn update(settings: &Settings, log: &dyn LogSink) -> Result<Outcome> {
    log.line("Downloading patch...");
    let package = Package::obtain(settings, Resource::LatestPatch, log).await?;

    log.line("Unpacking patch...");
    let program = read_program(&package.archive).await?;
    debug!(
        expected = %program.expected_version(),
        new = %program.new_version(),
        instructions = program.instructions().len(),
        "parsed update program"
    );

    log.line("Checking installation directory...");
    let marker_dir = settings.marker_dir();
    let installed = marker::find_installed(&marker_dir, log).await?;

    match marker::check(installed, program.expected_version(), program.new_version())? {
        VersionCheck::Apply => {}
        VersionCheck::UpToDate => return Ok(Outcome::UpToDate(installed)),
    }

    Executor::new(&package.archive, &settings.root, log)
        .run(&program)
        .await?;

    marker::write_marker(&marker_dir, &program.new_version()).await?;

    Ok(Outcome::Updated {
        from: installed,
        to: program.new_version(),
    })
}

/// Read and parse the program carried by a patch archive.
pub async fn read_program<R: ReadAt>(archive: &ZipArchive<R>) -> Result<Program> {
    let entry = archive.by_name(PROGRAM_ENTRY).ok_or(Abort::MissingProgram)?;
    let bytes = archive.read_to_vec(entry).await?;
    // Invalid sequences become U+FFFD; the syntax version is still checked first.
    let text = String::from_utf8_lossy(&bytes);

    Ok(Program::parse(&text)?)
}
