use super::support::{jar, vp, write, ENTRY_TIME};
use layout_snapshot::archive::{gzip_codec, zip_codec};
use layout_snapshot::{Snapshot, SnapshotError, Touch};
use tempfile::TempDir;

#[test]
fn edit_inside_nested_jar_rebuilds_containers() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    let inner = jar(&[("config.txt", b"old")]);
    let outer = jar(&[("lib/inner.jar", &inner[..]), ("plugin.xml", b"<plugin/>")]);
    write(&source.join("plugins/outer.jar"), &outer);

    let mut snapshot = Snapshot::new(0);
    snapshot.read(&source).unwrap();
    snapshot.write(&target).unwrap();

    snapshot
        .replace_file(
            &vp("plugins/outer.jar/lib/inner.jar/config.txt"),
            b"new".to_vec(),
            Touch::Refresh,
        )
        .unwrap();
    let report = snapshot.write(&target).unwrap();
    assert_eq!(report.files_written, 1);

    let written = std::fs::read(target.join("plugins/outer.jar")).unwrap();
    let entries = zip_codec::read_entries(&written, "outer.jar").unwrap();
    let inner_entry = entries.iter().find(|e| e.name == "lib/inner.jar").unwrap();
    let inner_entries = zip_codec::read_entries(&inner_entry.data, "inner.jar").unwrap();
    assert_eq!(inner_entries[0].name, "config.txt");
    assert_eq!(inner_entries[0].data, b"new");
    assert!(entries.iter().any(|e| e.name == "plugin.xml"));
}

#[test]
fn copy_then_write_materializes_destination() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("templates/base/a.txt"), b"a".to_vec(), ENTRY_TIME).unwrap();
    snapshot.write(&target).unwrap();

    snapshot.copy(&vp("templates/base"), &vp("instances/one")).unwrap();
    snapshot.write(&target).unwrap();
    assert_eq!(std::fs::read(target.join("instances/one/a.txt")).unwrap(), b"a");
}

#[test]
fn removal_precondition() {
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("d/f.txt"), b"f".to_vec(), 1).unwrap();
    assert!(matches!(
        snapshot.remove(&vp("d")),
        Err(SnapshotError::NotEmpty(_))
    ));
    snapshot.remove(&vp("d/f.txt")).unwrap();
    assert!(snapshot.list_entries(&vp("d")).is_empty());
    snapshot.remove(&vp("d")).unwrap();
    assert!(!snapshot.exists(&vp("d")));
}

#[test]
fn removing_last_entry_leaves_a_readable_archive() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let mut snapshot = Snapshot::new(0);
    snapshot
        .add_file(&vp("lib/a.jar"), jar(&[("x.txt", b"x")]), ENTRY_TIME)
        .unwrap();
    snapshot.write(&target).unwrap();

    snapshot.remove(&vp("lib/a.jar/x.txt")).unwrap();
    let report = snapshot.write(&target).unwrap();
    assert_eq!(report.files_written, 1);

    let written = std::fs::read(target.join("lib/a.jar")).unwrap();
    assert!(zip_codec::read_entries(&written, "a.jar").unwrap().is_empty());
    let mut reread = Snapshot::new(0);
    reread.read(&target).unwrap();
    assert!(reread.is_file(&vp("lib/a.jar")));
    assert!(reread.list_entries(&vp("lib/a.jar")).is_empty());
}

#[test]
fn rejected_remove_keeps_container_bytes() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let bytes = jar(&[("d/x.txt", b"x")]);
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("lib/a.jar"), bytes.clone(), ENTRY_TIME).unwrap();
    snapshot.write(&target).unwrap();

    assert!(matches!(
        snapshot.remove(&vp("lib/a.jar/d")),
        Err(SnapshotError::NotEmpty(_))
    ));
    assert_eq!(snapshot.get_bytes(&vp("lib/a.jar")), Some(&bytes[..]));

    let report = snapshot.write(&target).unwrap();
    assert_eq!(report.files_written, 0);
    assert_eq!(std::fs::read(target.join("lib/a.jar")).unwrap(), bytes);
}

#[test]
fn copy_over_written_destination_is_rewritten() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let mut snapshot = Snapshot::new(0);
    snapshot
        .add_file(&vp("templates/base/a.txt"), b"template".to_vec(), 1_000)
        .unwrap();
    snapshot
        .add_file(&vp("instances/one/a.txt"), b"old instance".to_vec(), 5_000)
        .unwrap();
    snapshot.write(&target).unwrap();

    snapshot.copy(&vp("templates/base"), &vp("instances/one")).unwrap();
    let report = snapshot.write(&target).unwrap();
    assert_eq!(report.files_written, 1);
    assert_eq!(report.protected, 0);
    assert_eq!(
        std::fs::read(target.join("instances/one/a.txt")).unwrap(),
        b"template"
    );
    assert_eq!(
        std::fs::read(target.join("templates/base/a.txt")).unwrap(),
        b"template"
    );
}

#[test]
fn edit_inside_nested_gzip_rebuilds_it() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let gz = gzip_codec::compress(b"old", 9, "readme.txt.gz").unwrap();
    let mut snapshot = Snapshot::new(0);
    snapshot
        .add_file(&vp("lib/a.jar"), jar(&[("docs/readme.txt.gz", &gz[..])]), ENTRY_TIME)
        .unwrap();
    assert_eq!(
        snapshot.get_string(&vp("lib/a.jar/docs/readme.txt.gz/readme.txt")),
        Some("old".to_string())
    );
    snapshot.write(&target).unwrap();

    snapshot
        .replace_file(
            &vp("lib/a.jar/docs/readme.txt.gz/readme.txt"),
            b"new".to_vec(),
            Touch::Refresh,
        )
        .unwrap();
    let report = snapshot.write(&target).unwrap();
    assert_eq!(report.files_written, 1);

    let written = std::fs::read(target.join("lib/a.jar")).unwrap();
    let entries = zip_codec::read_entries(&written, "a.jar").unwrap();
    let member = entries
        .iter()
        .find(|e| e.name == "docs/readme.txt.gz")
        .unwrap();
    assert_eq!(gzip_codec::decompress(&member.data, "readme.txt.gz").unwrap(), b"new");
}
