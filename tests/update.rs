//! End-to-end tests for the update action against local patch archives.

mod common;

use std::fs;

use common::*;
use piwcs_installer::{Abort, Action, MemorySink, Outcome, Settings, Version};
use tempfile::TempDir;

struct Fixture {
    root: TempDir,
    work: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            work: tempfile::tempdir().unwrap(),
        }
    }

    async fn update(&self, program: &str, files: &[(&str, &[u8])]) -> anyhow::Result<Outcome> {
        self.update_logged(program, files, &MemorySink::new()).await
    }

    async fn update_logged(
        &self,
        program: &str,
        files: &[(&str, &[u8])],
        log: &MemorySink,
    ) -> anyhow::Result<Outcome> {
        let patch = write_patch(self.work.path(), program, files);
        let settings = Settings::new(self.root.path()).with_archive(patch);
        Action::Update.run(&settings, log).await
    }
}

fn abort_of(result: anyhow::Result<Outcome>) -> Abort {
    result
        .unwrap_err()
        .downcast::<Abort>()
        .expect("expected an abort")
}

#[tokio::test]
async fn applies_patch_and_writes_new_marker() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.2.0");
    put(root, "mods/1.7.10/old.jar", "old");
    put(root, "mods/1.7.10/keep.jar", "keep");
    put(root, "config/old/settings.cfg", "old");
    put(root, "config/keep.cfg", "keep");

    let program = "0\n1.2.0\n1.3.0\n\
        Extract; files/new.jar; mods/1.7.10/new.jar\n\
        Delete; mods/1.7.10/old.jar\n\
        Delete; config/old/settings.cfg\n\
        Extract; files/deep.cfg; config/new/deep/deep.cfg\n";
    let files: &[(&str, &[u8])] = &[("files/new.jar", b"new"), ("files/deep.cfg", b"deep")];

    let log = MemorySink::new();
    let outcome = fx.update_logged(program, files, &log).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Updated {
            from: Version::new(1, 2, 0),
            to: Version::new(1, 3, 0)
        }
    );

    assert_eq!(read(root, "mods/1.7.10/new.jar"), "new");
    assert_eq!(read(root, "config/new/deep/deep.cfg"), "deep");
    assert!(!root.join("mods/1.7.10/old.jar").exists());
    assert!(!root.join("config/old").exists());
    assert_eq!(read(root, "mods/1.7.10/keep.jar"), "keep");
    assert_eq!(read(root, "config/keep.cfg"), "keep");

    assert!(marker_exists(root, "1.3.0"));
    assert!(marker_exists(root, "1.2.0"));

    let lines = log.lines();
    let applying = lines.iter().position(|l| l == "Applying update...").unwrap();
    assert_eq!(
        &lines[applying + 1..applying + 5],
        &[
            "Extracting mods/1.7.10/new.jar",
            "Deleting mods/1.7.10/old.jar",
            "Deleting config/old/settings.cfg",
            "Extracting config/new/deep/deep.cfg",
        ]
    );
}

#[tokio::test]
async fn instructions_run_in_file_order() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.2.0");

    let program = "0\n1.2.0\n1.3.0\n\
        Extract; a; config/order.txt\n\
        Delete; config/order.txt\n\
        Extract; b; config/order.txt\n";
    fx.update(program, &[("a", b"first"), ("b", b"second")])
        .await
        .unwrap();

    assert_eq!(read(root, "config/order.txt"), "second");
}

#[tokio::test]
async fn extract_overwrites_existing_file() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.2.0");
    put(root, "config/forge.cfg", "a much longer old configuration");

    fx.update("0\n1.2.0\n1.3.0\nExtract; forge.cfg; config/forge.cfg", &[("forge.cfg", b"new")])
        .await
        .unwrap();

    assert_eq!(read(root, "config/forge.cfg"), "new");
}

#[tokio::test]
async fn stored_entries_extract_too() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.2.0");

    let patch = fx.work.path().join("stored.zip");
    write_zip_with(
        &patch,
        &[
            ("program", b"0\n1.2.0\n1.3.0\nExtract; files/x.txt; x.txt\n"),
            ("files/", b""),
            ("files/x.txt", b"stored data"),
        ],
        zip::CompressionMethod::Stored,
    );

    let settings = Settings::new(root).with_archive(patch);
    Action::Update.run(&settings, &MemorySink::new()).await.unwrap();

    assert_eq!(read(root, "x.txt"), "stored data");
}

#[tokio::test]
async fn already_up_to_date_touches_nothing() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.3.0");
    put(root, "mods/1.7.10/old.jar", "old");

    let outcome = fx
        .update(
            "0\n1.2.0\n1.3.0\nDelete; mods/1.7.10/old.jar\nExtract; n; mods/1.7.10/new.jar\n",
            &[("n", b"new")],
        )
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::UpToDate(Version::new(1, 3, 0)));
    assert!(root.join("mods/1.7.10/old.jar").exists());
    assert!(!root.join("mods/1.7.10/new.jar").exists());
}

#[tokio::test]
async fn not_installed_aborts_without_changes() {
    let fx = Fixture::new();
    let root = fx.root.path();
    put(root, "config/keep.cfg", "keep");

    let result = fx
        .update(
            "0\n1.2.0\n1.3.0\nExtract; n; mods/1.7.10/new.jar\nDelete; config/keep.cfg\n",
            &[("n", b"new")],
        )
        .await;

    assert_eq!(abort_of(result), Abort::NotInstalled);
    assert!(!root.join("mods/1.7.10/new.jar").exists());
    assert!(root.join("config/keep.cfg").exists());
    assert!(!marker_exists(root, "1.3.0"));
}

#[tokio::test]
async fn wrong_version_requires_reinstall() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.1.0");

    let result = fx.update("0\n1.2.0\n1.3.0\n", &[]).await;

    let abort = abort_of(result);
    assert_eq!(
        abort,
        Abort::WrongVersion {
            expected: Version::new(1, 2, 0),
            found: Version::new(1, 1, 0)
        }
    );
    assert!(abort.to_string().contains("reinstall"));
}

#[tokio::test]
async fn installation_ahead_of_patch_is_wrong_version() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.4.0");

    let result = fx.update("0\n1.2.0\n1.3.0\n", &[]).await;
    assert!(matches!(abort_of(result), Abort::WrongVersion { .. }));
}

#[tokio::test]
async fn greatest_of_several_markers_is_authoritative() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.1.0");
    install_marker(root, "1.2.0");

    let log = MemorySink::new();
    let outcome = fx.update_logged("0\n1.2.0\n1.3.0\n", &[], &log).await.unwrap();

    assert!(matches!(outcome, Outcome::Updated { .. }));
    assert!(log.contains("assuming 1.2.0"));
}

#[tokio::test]
async fn escaping_path_is_rejected_before_any_change() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("minecraft");
    install_marker(&root, "1.2.0");
    put(outer.path(), "victim.txt", "precious");

    let work = tempfile::tempdir().unwrap();
    let patch = write_patch(
        work.path(),
        "0\n1.2.0\n1.3.0\nExtract; n; config/new.cfg\nDelete; ../victim.txt\n",
        &[("n", b"new")],
    );
    let settings = Settings::new(&root).with_archive(patch);

    let result = Action::Update.run(&settings, &MemorySink::new()).await;

    assert_eq!(abort_of(result), Abort::UnsafePath("../victim.txt".into()));
    assert_eq!(read(outer.path(), "victim.txt"), "precious");
    assert!(!root.join("config/new.cfg").exists());
    assert!(!marker_exists(&root, "1.3.0"));
}

#[tokio::test]
async fn escaping_extract_destination_is_rejected() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.2.0");

    let result = fx
        .update("0\n1.2.0\n1.3.0\nExtract; n; mods/../../../etc/evil\n", &[("n", b"x")])
        .await;

    assert!(matches!(abort_of(result), Abort::UnsafePath(_)));
}

#[tokio::test]
async fn missing_archive_entry_is_malformed_program() {
    let fx = Fixture::new();
    let root = fx.root.path();
    install_marker(root, "1.2.0");
    put(root, "config/keep.cfg", "keep");

    let result = fx
        .update(
            "0\n1.2.0\n1.3.0\nDelete; config/keep.cfg\nExtract; files/nope.jar; mods/1.7.10/nope.jar\n",
            &[],
        )
        .await;

    let abort = abort_of(result);
    assert_eq!(abort, Abort::MissingEntry("files/nope.jar".into()));
    assert!(abort.to_string().starts_with("Malformed update program"));
    assert!(root.join("config/keep.cfg").exists());
}

#[tokio::test]
async fn patch_without_program_is_malformed_package() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.2.0");

    let patch = fx.work.path().join("no-program.zip");
    write_zip(&patch, &[("files/a.jar", b"a")]);
    let settings = Settings::new(fx.root.path()).with_archive(patch);

    let result = Action::Update.run(&settings, &MemorySink::new()).await;
    assert_eq!(abort_of(result), Abort::MissingProgram);
}

#[tokio::test]
async fn newer_syntax_version_is_outdated_interpreter() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.2.0");

    let result = fx.update("1\n1.2.0\n1.3.0\nRename; a; b\n", &[]).await;
    assert!(matches!(abort_of(result), Abort::OutdatedInterpreter { .. }));
}

async fn update_raw_program(fx: &Fixture, program: &[u8]) -> anyhow::Result<Outcome> {
    let patch = fx.work.path().join("raw.zip");
    write_zip(&patch, &[("program", program)]);
    let settings = Settings::new(fx.root.path()).with_archive(patch);
    Action::Update.run(&settings, &MemorySink::new()).await
}

#[tokio::test]
async fn newer_syntax_version_wins_over_undecodable_bytes() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.2.0");

    let result = update_raw_program(&fx, b"1\n1.2.0\n1.3.0\nRename; \xff\xfe; b\n").await;
    assert!(matches!(abort_of(result), Abort::OutdatedInterpreter { .. }));

    let result = update_raw_program(&fx, b"\xff\n1.2.0\n1.3.0\n").await;
    assert!(matches!(abort_of(result), Abort::OutdatedInterpreter { .. }));
}

#[tokio::test]
async fn undecodable_bytes_in_arguments_are_replaced() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.2.0");

    let outcome = update_raw_program(&fx, b"0\n1.2.0\n1.3.0\nDelete; config/a\xffb.cfg\n")
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Updated { .. }));
    assert!(marker_exists(fx.root.path(), "1.3.0"));
}

#[tokio::test]
async fn malformed_program_aborts_before_version_check() {
    let fx = Fixture::new();
    // No marker: a version check would report NotInstalled instead.
    let result = fx.update("0\n1.2.0\n1.3.0\nExtract; only-one\n", &[]).await;
    assert!(matches!(abort_of(result), Abort::ArityMismatch { .. }));
}

#[tokio::test]
async fn damaged_archive_is_unrecoverable() {
    let fx = Fixture::new();
    install_marker(fx.root.path(), "1.2.0");

    let patch = fx.work.path().join("broken.zip");
    fs::write(&patch, b"this is not a zip archive at all").unwrap();
    let settings = Settings::new(fx.root.path()).with_archive(patch);

    let err = Action::Update.run(&settings, &MemorySink::new()).await.unwrap_err();
    assert!(err.downcast_ref::<Abort>().is_none());
}
