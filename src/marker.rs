//! Version markers.
//!
//! The installed modpack version is recorded by the name of an otherwise
//! informational file, `PIWCS <major>.<minor>.<patch>.txt`, inside the
//! `mods/<game-version>` directory.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::fs;

use crate::error::Abort;
use crate::logging::LogSink;

const MARKER_PREFIX: &str = "PIWCS ";
const MARKER_SUFFIX: &str = ".txt";

/// A dotted numeric version triple, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version \"{0}\": expected <major>.<minor>.<patch>")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseVersionError(s.to_string());

        let mut parts = s.split('.').map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            part.parse::<u32>().map_err(|_| err())
        });

        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(err());
        };

        Ok(Version::new(major?, minor?, patch?))
    }
}

/// File name of the marker for `version`.
pub fn marker_file_name(version: &Version) -> String {
    format!("{MARKER_PREFIX}{version}{MARKER_SUFFIX}")
}

/// Version encoded in a marker file name, if `name` is one.
pub fn parse_marker_name(name: &str) -> Option<Version> {
    name.strip_prefix(MARKER_PREFIX)?
        .strip_suffix(MARKER_SUFFIX)?
        .parse()
        .ok()
}

/// All versions with a marker in `dir`, greatest first.
pub async fn list_markers(dir: &Path) -> Result<Vec<Version>> {
    let mut versions = Vec::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(versions),
        Err(e) => return Err(e).with_context(|| format!("cannot list {}", dir.display())),
    };

    while let Some(entry) = entries.next_entry().await? {
        if let Some(version) = entry.file_name().to_str().and_then(parse_marker_name) {
            versions.push(version);
        }
    }

    versions.sort_unstable_by(|a, b| b.cmp(a));
    Ok(versions)
}

/// Find the authoritative installed version in `dir`.
///
/// When several markers are present the greatest wins and the choice is
/// logged. No marker at all is [`Abort::NotInstalled`].
pub async fn find_installed(dir: &Path, log: &dyn LogSink) -> Result<Version> {
    let markers = list_markers(dir).await?;

    let Some(&installed) = markers.first() else {
        return Err(Abort::NotInstalled.into());
    };

    if markers.len() > 1 {
        let all: Vec<String> = markers.iter().map(Version::to_string).collect();
        log.line(&format!(
            "Found modpack version markers [{}], assuming {installed}",
            all.join(", ")
        ));
    } else {
        log.line(&format!("Found modpack version marker {installed}"));
    }

    Ok(installed)
}

/// What to do with a patch given the installed version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    /// The patch applies to the installed version.
    Apply,
    /// The installation already is at the patch's target version.
    UpToDate,
}

/// Gate a patch going from `expected` to `target` against `installed`.
///
/// Only an exact match with `target` counts as up to date; any other
/// mismatch, including an installation ahead of `target`, is an
/// [`Abort::WrongVersion`].
pub fn check(installed: Version, expected: Version, target: Version) -> Result<VersionCheck, Abort> {
    if installed == expected {
        Ok(VersionCheck::Apply)
    } else if installed == target {
        Ok(VersionCheck::UpToDate)
    } else {
        Err(Abort::WrongVersion {
            expected,
            found: installed,
        })
    }
}

/// Write the marker for `version` into `dir`. Older markers are left alone.
pub async fn write_marker(dir: &Path, version: &Version) -> Result<PathBuf> {
    let path = dir.join(marker_file_name(version));
    let notice = format!(
        "PIWCS modpack. Updated automatically by {} {}.\n",
        crate::NAME,
        crate::VERSION
    );

    fs::write(&path, notice)
        .await
        .with_context(|| format!("cannot write version marker {}", path.display()))?;

    Ok(path)
}
