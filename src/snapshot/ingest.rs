//! Ingestion
//!
//! Reads a directory tree, a single archive, or a single file into the content tree.
//! Archives are expanded recursively beneath their own path while the container
//! keeps its raw bytes. Inner entry names are untrusted: traversal sequences and
//! characters outside the safe set are dropped before anything is registered.

use super::Snapshot;
use crate::archive::{self, gzip_codec, zip_codec, ArchiveKind, EntryNameCheck};
use crate::error::{Result, SnapshotError};
use crate::tree::{ContentTree, VirtualPath};
use crate::types::{timestamp_from_system_time, Timestamp};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Counts gathered while reading a source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub folders: usize,
    pub archives_expanded: usize,
    /// Registrations that lost to an existing node of equal or newer timestamp
    pub superseded: usize,
    /// Inner archive entries dropped by the name filter
    pub filtered: usize,
}

impl Snapshot {
    /// Read `source` into the root of the tree.
    pub fn read(&mut self, source: &Path) -> Result<IngestReport> {
        self.read_into(source, &VirtualPath::root())
    }

    /// Read `source` beneath `prefix`.
    ///
    /// A directory is walked in name order without following symlinks. A `.zip` or
    /// `.jar` file expands directly beneath `prefix`; a `.gz` file yields its single
    /// decompressed member; any other file registers under its own name.
    pub fn read_into(&mut self, source: &Path, prefix: &VirtualPath) -> Result<IngestReport> {
        let metadata = std::fs::metadata(source).map_err(|e| SnapshotError::io(source, e))?;
        let mut ingest = Ingest::new(&mut self.tree, self.config.max_nesting_depth);

        if metadata.is_dir() {
            ingest.walk_directory(source, prefix)?;
        } else {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    SnapshotError::InvalidTarget(source.to_path_buf(), "no file name".to_string())
                })?;
            let bytes = std::fs::read(source).map_err(|e| SnapshotError::io(source, e))?;
            let timestamp = modified_millis(&metadata, source)?;
            match archive::archive_kind(&name) {
                Some(ArchiveKind::Zip) => ingest.expand_zip(prefix, &bytes, 1)?,
                Some(ArchiveKind::Gzip) => {
                    ingest.expand_gzip(prefix, &name, &bytes, timestamp, 1)?
                }
                None => ingest.register_file(&prefix.join(&name), bytes, timestamp, 0)?,
            }
        }

        let report = ingest.report;
        info!(
            source = %source.display(),
            prefix = %prefix,
            files = report.files,
            folders = report.folders,
            archives = report.archives_expanded,
            filtered = report.filtered,
            "Read snapshot source"
        );
        Ok(report)
    }
}

fn modified_millis(metadata: &std::fs::Metadata, path: &Path) -> Result<Timestamp> {
    let modified = metadata.modified().map_err(|e| SnapshotError::io(path, e))?;
    Ok(timestamp_from_system_time(modified))
}

/// Registration context shared by directory walks, archive expansion, and mutations
/// that store archive payloads.
pub(crate) struct Ingest<'a> {
    tree: &'a mut ContentTree,
    max_depth: usize,
    pub(crate) report: IngestReport,
}

impl<'a> Ingest<'a> {
    pub(crate) fn new(tree: &'a mut ContentTree, max_depth: usize) -> Self {
        Self {
            tree,
            max_depth,
            report: IngestReport::default(),
        }
    }

    fn walk_directory(&mut self, source: &Path, prefix: &VirtualPath) -> Result<()> {
        let walker = WalkDir::new(source)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(source).to_path_buf();
                SnapshotError::io(path, std::io::Error::from(e))
            })?;
            let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
            let mut path = prefix.clone();
            for component in relative.components() {
                path = path.join(&component.as_os_str().to_string_lossy());
            }

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!(path = %entry.path().display(), "Skipping symlink");
                continue;
            }
            let metadata = entry
                .metadata()
                .map_err(|e| SnapshotError::io(entry.path(), std::io::Error::from(e)))?;
            let timestamp = modified_millis(&metadata, entry.path())?;

            if file_type.is_dir() {
                self.register_folder(&path, timestamp)?;
            } else {
                let bytes =
                    std::fs::read(entry.path()).map_err(|e| SnapshotError::io(entry.path(), e))?;
                self.register_file(&path, bytes, timestamp, 0)?;
            }
        }
        Ok(())
    }

    fn register_folder(&mut self, path: &VirtualPath, timestamp: Timestamp) -> Result<()> {
        self.tree.register(path, None, timestamp)?;
        self.report.folders += 1;
        Ok(())
    }

    /// Register a file and expand it when its name marks it as an archive.
    ///
    /// `depth` is the number of archives enclosing `path`.
    pub(crate) fn register_file(
        &mut self,
        path: &VirtualPath,
        bytes: Vec<u8>,
        timestamp: Timestamp,
        depth: usize,
    ) -> Result<()> {
        let kind = archive::archive_kind(path.name());
        let raw = kind.map(|_| bytes.clone());
        if !self.tree.register(path, Some(bytes), timestamp)? {
            debug!(path = %path, timestamp, "Keeping existing entry with equal or newer timestamp");
            self.report.superseded += 1;
            return Ok(());
        }
        self.report.files += 1;
        if let (Some(kind), Some(raw)) = (kind, raw) {
            self.expand(path, kind, &raw, timestamp, depth + 1)?;
        }
        Ok(())
    }

    /// Expand raw archive bytes beneath `container`.
    pub(crate) fn expand(
        &mut self,
        container: &VirtualPath,
        kind: ArchiveKind,
        bytes: &[u8],
        timestamp: Timestamp,
        depth: usize,
    ) -> Result<()> {
        match kind {
            ArchiveKind::Zip => self.expand_zip(container, bytes, depth),
            ArchiveKind::Gzip => {
                self.expand_gzip(container, container.name(), bytes, timestamp, depth)
            }
        }
    }

    fn check_depth(&self, container: &VirtualPath, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(SnapshotError::DepthExceeded {
                path: container.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    pub(crate) fn expand_zip(
        &mut self,
        container: &VirtualPath,
        bytes: &[u8],
        depth: usize,
    ) -> Result<()> {
        self.check_depth(container, depth)?;
        let origin = container.to_string();
        for entry in zip_codec::read_entries(bytes, &origin)? {
            match archive::check_entry_name(&entry.name) {
                EntryNameCheck::Accepted => {}
                EntryNameCheck::Traversal => {
                    debug!(archive = %origin, entry = %entry.name, "Dropping traversal entry");
                    self.report.filtered += 1;
                    continue;
                }
                EntryNameCheck::UnsafeCharacter(c) => {
                    warn!(
                        archive = %origin,
                        entry = %entry.name,
                        character = %c.escape_unicode(),
                        "Dropping archive entry with unsafe name"
                    );
                    self.report.filtered += 1;
                    continue;
                }
            }
            let name = entry.name.trim_matches('/');
            if name.is_empty() {
                continue;
            }
            let path = container.join(name);
            if entry.is_dir {
                self.register_folder(&path, entry.timestamp)?;
            } else {
                self.register_file(&path, entry.data, entry.timestamp, depth)?;
            }
        }
        self.report.archives_expanded += 1;
        Ok(())
    }

    /// Decompress a single-member GZIP into one child named after `file_name` minus `.gz`.
    pub(crate) fn expand_gzip(
        &mut self,
        container: &VirtualPath,
        file_name: &str,
        bytes: &[u8],
        timestamp: Timestamp,
        depth: usize,
    ) -> Result<()> {
        self.check_depth(container, depth)?;
        let member = archive::strip_archive_suffix(file_name);
        if member.is_empty() {
            debug!(archive = %container, "Skipping gzip without a member name");
            return Ok(());
        }
        let data = gzip_codec::decompress(bytes, &container.to_string())?;
        self.register_file(&container.join(member), data, timestamp, depth)?;
        self.report.archives_expanded += 1;
        Ok(())
    }
}
