use super::support::{files_of, jar, vp, write};
use layout_snapshot::archive::zip_codec;
use layout_snapshot::{ContentTree, EmitOptions, Result, Snapshot, VirtualPath};
use tempfile::TempDir;

#[test]
fn nested_archive_is_expanded_and_bytes_survive() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    let sub = jar(&[("bar.txt", b"bar")]);
    write(&source.join("plugins/foo/sub.jar"), &sub);

    let mut snapshot = Snapshot::new(0);
    snapshot.read(&source).unwrap();
    assert_eq!(
        snapshot.get_string(&vp("plugins/foo/sub.jar/bar.txt")),
        Some("bar".to_string())
    );

    snapshot.write(&target).unwrap();
    assert_eq!(std::fs::read(target.join("plugins/foo/sub.jar")).unwrap(), sub);
}

#[test]
fn zip_target_round_trip() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("layout.zip");
    let mut snapshot = Snapshot::new(0);
    snapshot
        .add_file(&vp("readme.txt"), b"hello".to_vec(), 1_600_000_000_000)
        .unwrap();
    snapshot
        .add_file(&vp("lib/inner.jar"), jar(&[("a/b.txt", b"b")]), 1_600_000_000_000)
        .unwrap();
    snapshot.add_folder(&vp("empty"), 1_600_000_000_000).unwrap();
    snapshot.write(&archive).unwrap();

    let mut copy = Snapshot::new(0);
    copy.read(&archive).unwrap();
    assert_eq!(files_of(&snapshot), files_of(&copy));
    assert!(copy.is_folder(&vp("empty")));
    assert_eq!(
        copy.get_bytes(&vp("lib/inner.jar")),
        snapshot.get_bytes(&vp("lib/inner.jar"))
    );
}

#[test]
fn archive_targets_are_stored_uncompressed() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("out.jar");
    let payload = vec![b'a'; 4096];
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("big.txt"), payload.clone(), 0).unwrap();
    snapshot.write(&archive).unwrap();

    let bytes = std::fs::read(&archive).unwrap();
    assert!(bytes.len() > payload.len());
    let entries = zip_codec::read_entries(&bytes, "out.jar").unwrap();
    assert_eq!(entries[0].data, payload);
}

#[test]
fn unsafe_archive_entries_are_skipped() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("plugins.zip");
    write(
        &source,
        &jar(&[
            ("good/file.txt", b"ok"),
            ("../../etc/passwd", b"no"),
            ("bad|name.txt", b"no"),
        ]),
    );

    let mut snapshot = Snapshot::new(0);
    let report = snapshot.read(&source).unwrap();
    assert_eq!(report.filtered, 2);
    let listed: Vec<String> = snapshot
        .list_tree(&VirtualPath::root())
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(listed, vec!["good", "good/file.txt"]);
}

#[test]
fn gz_source_and_target() {
    let dir = TempDir::new().unwrap();
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("artifacts.xml"), b"<artifacts/>".to_vec(), 10).unwrap();
    let target = dir.path().join("artifacts.xml.gz");
    snapshot.write(&target).unwrap();

    let mut copy = Snapshot::new(0);
    copy.read(&target).unwrap();
    assert_eq!(
        copy.get_string(&vp("artifacts.xml")),
        Some("<artifacts/>".to_string())
    );
}

#[test]
fn remapped_zip_rebuilds_nested_archives() {
    let dir = TempDir::new().unwrap();
    let original = jar(&[("notes.txt", b"n")]);
    let mut snapshot = Snapshot::new(0);
    snapshot.add_file(&vp("plugins/foo.jar"), original.clone(), 1_000).unwrap();
    snapshot.clear_remappers();
    let shout = |_: &ContentTree, path: &VirtualPath| -> Result<VirtualPath> {
        if path.name() == "notes.txt" {
            Ok(path.with_name("NOTES.txt"))
        } else {
            Ok(path.clone())
        }
    };
    snapshot.add_remapper(Box::new(shout));

    let inner_of = |target: &std::path::Path| {
        let entries = zip_codec::read_entries(&std::fs::read(target).unwrap(), "out").unwrap();
        entries
            .into_iter()
            .find(|e| e.name == "plugins/foo.jar")
            .unwrap()
            .data
    };

    let remapped = dir.path().join("remapped.zip");
    let options = EmitOptions {
        compression_level: 0,
        remap: true,
    };
    snapshot
        .write_subtree_with(&VirtualPath::root(), &remapped, options, |_| Ok(()))
        .unwrap();
    let inner = zip_codec::read_entries(&inner_of(&remapped), "foo.jar").unwrap();
    let names: Vec<&str> = inner.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["NOTES.txt"]);
    assert_eq!(inner[0].data, b"n");

    let plain = dir.path().join("plain.zip");
    let options = EmitOptions {
        compression_level: 0,
        remap: false,
    };
    snapshot
        .write_subtree_with(&VirtualPath::root(), &plain, options, |_| Ok(()))
        .unwrap();
    assert_eq!(inner_of(&plain), original);
}
