//! Shared fixtures for integration tests

use layout_snapshot::archive::zip_codec::ZipBuilder;
use layout_snapshot::{Timestamp, VirtualPath};
use std::path::Path;

pub const ENTRY_TIME: Timestamp = 1_600_000_000_000;

pub fn vp(s: &str) -> VirtualPath {
    VirtualPath::parse(s)
}

pub fn jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = ZipBuilder::new(9, "fixture");
    for (name, data) in entries {
        builder.add_file(name, data, ENTRY_TIME).unwrap();
    }
    builder.finish().unwrap()
}

pub fn write(path: &Path, data: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, data).unwrap();
}

pub fn set_mtime(path: &Path, millis: Timestamp) {
    filetime::set_file_mtime(path, layout_snapshot::types::file_time_from_timestamp(millis)).unwrap();
}

pub fn mtime(path: &Path) -> Timestamp {
    let modified = std::fs::metadata(path).unwrap().modified().unwrap();
    layout_snapshot::types::timestamp_from_system_time(modified)
}

/// Sorted `(path, bytes)` pairs of every file below `root`
pub fn files_of(snapshot: &layout_snapshot::Snapshot) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = snapshot
        .list_tree(&VirtualPath::root())
        .into_iter()
        .filter_map(|p| snapshot.get_bytes(&p).map(|b| (p.to_string(), b.to_vec())))
        .collect();
    files.sort();
    files
}
