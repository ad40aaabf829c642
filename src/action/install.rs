use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::fs;

use crate::error::Abort;
use crate::logging::LogSink;
use crate::marker;
use crate::program::path;

use super::{Outcome, Package, Resource, Settings};

/// Install the full modpack into an empty installation directory.
pub async fn install(settings: &Settings, log: &dyn LogSink) -> Result<Outcome> {
    check_directories(settings, log).await?;

    log.line("Downloading modpack...");
    let package = Package::obtain(settings, Resource::FullPackage, log).await?;

    log.line("Unpacking modpack...");
    for entry in package.archive.entries() {
        if entry.is_directory() {
            continue;
        }

        log.line(&format!("Unpacking {}", entry.file_name));
        let output_path = path::resolve(&settings.root, install_path(&entry.file_name))?;
        package.archive.extract_to_file(entry, &output_path).await?;
    }

    let version = marker::list_markers(&settings.marker_dir())
        .await?
        .first()
        .copied();
    Ok(Outcome::Installed(version))
}

/// Make sure `config`, `mods` and `mods/<game version>` exist and hold no
/// files, creating the missing ones.
pub async fn check_directories(settings: &Settings, log: &dyn LogSink) -> Result<()> {
    log.line("Checking installation directory...");

    for dir in [settings.config_dir(), settings.mods_dir(), settings.marker_dir()] {
        check_directory(&dir, log).await?;
    }
    Ok(())
}

async fn check_directory(dir: &Path, log: &dyn LogSink) -> Result<()> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log.line(&format!("{} does not exist, creating one", dir.display()));
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("cannot create {}", dir.display()))?;
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("cannot list {}", dir.display())),
    };

    while let Some(entry) = entries.next_entry().await? {
        let is_dir = fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(Abort::DirectoryNotEmpty(dir.display().to_string()).into());
        }
    }
    Ok(())
}

/// Where an entry of the full package goes, relative to the installation.
///
/// Packages may wrap everything in a top-level `PIWCS...` directory, which
/// is dropped.
pub fn install_path(entry_name: &str) -> &str {
    match entry_name.split_once('/') {
        Some((first, rest)) if first.starts_with("PIWCS") && !rest.is_empty() => rest,
        _ => entry_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;

    #[test]
    fn strips_wrapping_directory() {
        assert_eq!(install_path("PIWCS 1.3.0/mods/1.7.10/a.jar"), "mods/1.7.10/a.jar");
        assert_eq!(install_path("PIWCS/config/a.cfg"), "config/a.cfg");
        assert_eq!(install_path("mods/1.7.10/a.jar"), "mods/1.7.10/a.jar");
        assert_eq!(install_path("PIWCS 1.3.0.txt"), "PIWCS 1.3.0.txt");
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::new(root.path());
        let log = MemorySink::new();

        check_directories(&settings, &log).await.unwrap();

        assert!(settings.config_dir().is_dir());
        assert!(settings.marker_dir().is_dir());
        assert!(log.contains("does not exist, creating one"));
    }

    #[tokio::test]
    async fn subdirectories_are_allowed() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::new(root.path());
        std::fs::create_dir_all(settings.config_dir().join("forge")).unwrap();

        check_directories(&settings, &MemorySink::new()).await.unwrap();
    }

    #[tokio::test]
    async fn refuses_directory_with_files() {
        let root = tempfile::tempdir().unwrap();
        let settings = Settings::new(root.path());
        std::fs::create_dir_all(settings.marker_dir()).unwrap();
        std::fs::write(settings.mods_dir().join("stray.jar"), b"").unwrap();

        let err = check_directories(&settings, &MemorySink::new()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Abort>(),
            Some(Abort::DirectoryNotEmpty(_))
        ));
    }
}
