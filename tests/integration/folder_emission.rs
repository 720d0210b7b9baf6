use super::support::{files_of, mtime, set_mtime, vp, write};
use layout_snapshot::{Snapshot, VirtualPath};
use tempfile::TempDir;

fn source_layout(root: &std::path::Path) {
    write(&root.join("eclipse.ini"), b"-vmargs\n");
    write(&root.join("configuration/config.ini"), b"osgi.bundles=x\n");
    write(&root.join("dropins/README.txt"), b"drop here\n");
    std::fs::create_dir_all(root.join("p2")).unwrap();
}

#[test]
fn folder_round_trip_preserves_paths_and_bytes() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    source_layout(&source);

    let mut snapshot = Snapshot::new(0);
    snapshot.read(&source).unwrap();
    snapshot.write(&target).unwrap();

    let mut copy = Snapshot::new(0);
    copy.read(&target).unwrap();
    assert_eq!(files_of(&snapshot), files_of(&copy));
    assert_eq!(
        snapshot.list_tree(&VirtualPath::root()),
        copy.list_tree(&VirtualPath::root())
    );
    assert!(copy.is_folder(&vp("p2")));
    assert_eq!(
        mtime(&target.join("configuration/config.ini")),
        mtime(&source.join("configuration/config.ini"))
    );
}

#[test]
fn second_write_rewrites_nothing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    source_layout(&source);

    let mut snapshot = Snapshot::new(0);
    snapshot.read(&source).unwrap();
    let first = snapshot.write(&target).unwrap();
    assert_eq!(first.files_written, 3);

    let second = snapshot.write(&target).unwrap();
    assert_eq!(second.files_written, 0);
    assert_eq!(second.entries_deleted, 0);
    // only the root and its immediate entries are looked at
    assert_eq!(
        second.nodes_visited,
        1 + snapshot.list_entries(&VirtualPath::root()).len()
    );
}

#[test]
fn newer_file_on_disk_is_protected() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let mut snapshot = Snapshot::new(0);
    snapshot
        .add_file(&vp("conf/settings.ini"), b"from snapshot".to_vec(), 5_000)
        .unwrap();
    snapshot.write(&target).unwrap();

    let edited = target.join("conf/settings.ini");
    std::fs::write(&edited, b"edited by hand").unwrap();
    set_mtime(&edited, 9_000_000);

    snapshot
        .replace_file(&vp("conf/settings.ini"), b"changed in memory".to_vec(), layout_snapshot::Touch::Preserve)
        .unwrap();
    snapshot
        .add_file(&vp("conf/other.ini"), b"new".to_vec(), 6_000)
        .unwrap();
    let report = snapshot.write(&target).unwrap();

    assert_eq!(std::fs::read(&edited).unwrap(), b"edited by hand");
    assert_eq!(report.protected, 1);
    assert_eq!(std::fs::read(target.join("conf/other.ini")).unwrap(), b"new");
}

#[test]
fn removed_entries_disappear_from_disk() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("target");
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("a/keep.txt"), b"k".to_vec(), 10).unwrap();
    snapshot.add_file(&vp("a/drop.txt"), b"d".to_vec(), 10).unwrap();
    snapshot.write(&target).unwrap();

    snapshot.remove(&vp("a/drop.txt")).unwrap();
    let report = snapshot.write(&target).unwrap();

    assert!(!target.join("a/drop.txt").exists());
    assert!(target.join("a/keep.txt").exists());
    assert_eq!(report.entries_deleted, 1);
    assert_eq!(report.files_written, 0);
}
