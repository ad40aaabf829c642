//! Replaying update programs against an installation.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::debug;

use crate::error::Abort;
use crate::io::ReadAt;
use crate::logging::LogSink;
use crate::zip::ZipArchive;

use super::command::Instruction;
use super::{Program, path};

/// Runs [`Program`]s against the installation at `root`, taking extracted
/// files from a patch archive.
pub struct Executor<'a, R: ReadAt> {
    archive: &'a ZipArchive<R>,
    root: &'a Path,
    log: &'a dyn LogSink,
}

impl<'a, R: ReadAt> Executor<'a, R> {
    pub fn new(archive: &'a ZipArchive<R>, root: &'a Path, log: &'a dyn LogSink) -> Self {
        Self { archive, root, log }
    }

    /// Run every instruction in order.
    ///
    /// Every path argument and archive entry is validated before the first
    /// instruction runs. Once execution has started, a failing instruction
    /// stops the run and leaves earlier instructions applied.
    pub async fn run(&self, program: &Program) -> Result<()> {
        self.preflight(program)?;

        self.log.line("Applying update...");
        for (index, instruction) in program.instructions().iter().enumerate() {
            debug!(index, %instruction, "executing");
            self.log.line(&instruction.describe());
            self.execute(instruction).await?;
        }

        Ok(())
    }

    fn preflight(&self, program: &Program) -> Result<(), Abort> {
        for instruction in program.instructions() {
            match instruction {
                Instruction::Extract { source, dest } => {
                    path::confine(dest)?;
                    if self.archive.by_name(source).is_none() {
                        return Err(Abort::MissingEntry(source.clone()));
                    }
                }
                Instruction::Delete { target } => {
                    path::confine(target)?;
                }
            }
        }
        Ok(())
    }

    /// Execute a single instruction.
    pub async fn execute(&self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::Extract { source, dest } => self.extract(source, dest).await,
            Instruction::Delete { target } => {
                let relative = path::confine(target)?;
                delete_with_cleanup(self.root, &relative, self.log).await
            }
        }
    }

    async fn extract(&self, source: &str, dest: &str) -> Result<()> {
        let output_path = path::resolve(self.root, dest)?;
        let entry = self
            .archive
            .by_name(source)
            .ok_or_else(|| Abort::MissingEntry(source.to_string()))?;

        if entry.is_directory() {
            fs::create_dir_all(&output_path)
                .await
                .with_context(|| format!("cannot create directory {}", output_path.display()))?;
            return Ok(());
        }

        self.archive.extract_to_file(entry, &output_path).await
    }
}

/// Delete `relative` under `root`, then walk up its parents deleting each
/// one that is left empty.
///
/// At every level: a missing path ends the walk; a regular file is deleted;
/// a directory is deleted only when empty, otherwise the walk ends; anything
/// else (symlinks, devices) is left alone and ends the walk. `root` itself is
/// never deleted.
pub async fn delete_with_cleanup(root: &Path, relative: &Path, log: &dyn LogSink) -> Result<()> {
    let mut level = Some(relative);
    let mut first = true;

    while let Some(current) = level.filter(|p| !p.as_os_str().is_empty()) {
        let full = root.join(current);

        let metadata = match fs::symlink_metadata(&full).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if first {
                    log.line(&format!("  {} does not exist, nothing to delete", current.display()));
                }
                break;
            }
            Err(e) => return Err(e).with_context(|| format!("cannot inspect {}", full.display())),
        };

        let file_type = metadata.file_type();
        if file_type.is_file() {
            fs::remove_file(&full)
                .await
                .with_context(|| format!("cannot delete {}", full.display()))?;
        } else if file_type.is_dir() {
            if !is_empty_dir(&full).await? {
                if first {
                    log.line(&format!("  not deleting: {} is not empty", current.display()));
                }
                break;
            }
            if !first {
                log.line(&format!("  also deleting empty directory {}", current.display()));
            }
            fs::remove_dir(&full)
                .await
                .with_context(|| format!("cannot delete directory {}", full.display()))?;
        } else {
            log.line(&format!(
                "  not deleting: {} does not denote a file or a directory",
                current.display()
            ));
            break;
        }

        first = false;
        level = current.parent();
    }

    Ok(())
}

async fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path)
        .await
        .with_context(|| format!("cannot list {}", path.display()))?;
    Ok(entries.next_entry().await?.is_none())
}
