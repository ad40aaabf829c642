//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Write a ZIP archive at `path`. Names ending in `/` become directory
/// entries; everything else is deflated.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    write_zip_with(path, entries, CompressionMethod::Deflated);
}

pub fn write_zip_with(path: &Path, entries: &[(&str, &[u8])], method: CompressionMethod) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(method);

    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }

    zip.finish().unwrap();
}

/// Build a patch archive in `dir` carrying `program` and `files`.
pub fn write_patch(dir: &Path, program: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join("patch.zip");
    let mut entries: Vec<(&str, &[u8])> = vec![("program", program.as_bytes())];
    entries.extend_from_slice(files);
    write_zip(&path, &entries);
    path
}

/// Create a file with `contents`, along with its parents.
pub fn put(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

/// Mark `root` as holding an installation at `version`.
pub fn install_marker(root: &Path, version: &str) {
    put(root, &format!("mods/1.7.10/PIWCS {version}.txt"), "installed by hand");
}

pub fn marker_exists(root: &Path, version: &str) -> bool {
    root.join(format!("mods/1.7.10/PIWCS {version}.txt")).is_file()
}
