//! Emission
//!
//! Materializes the tree, or one of its subtrees, as a directory tree, a single ZIP,
//! or a single GZIP, chosen from the target's name. Directory emission is
//! incremental: on-disk modification times are compared with node timestamps and
//! only stale entries are rewritten.
//!
//! Per child of a folder node, with `disk` the on-disk mtime under the remapped name:
//! - missing or `disk < node`: stale, files are rewritten and folders recursed into
//! - `disk > node`: protected, left alone
//! - `disk == node`: synchronized, skipped without recursion
//!
//! Entries on disk without a node are deleted. Each directory's mtime is set to its
//! node's timestamp once its children are done.

use super::Snapshot;
use crate::archive::{self, gzip_codec, zip_codec::ZipBuilder, ArchiveKind};
use crate::error::{Result, SnapshotError};
use crate::remap::RemapPipeline;
use crate::tree::{ContentNode, ContentTree, VirtualPath};
use crate::types::{file_time_from_timestamp, timestamp_from_system_time, Timestamp};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How archives are built and whether remappers rename emitted entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// 0 stores entries; 1-9 deflate
    pub compression_level: u32,
    pub remap: bool,
}

/// Materialization mode implied by a target name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Folder,
    Zip,
    Gzip,
}

impl TargetKind {
    pub fn for_target(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match archive::archive_kind(&name) {
            Some(ArchiveKind::Zip) => TargetKind::Zip,
            Some(ArchiveKind::Gzip) => TargetKind::Gzip,
            None => TargetKind::Folder,
        }
    }
}

/// What a write did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub nodes_visited: usize,
    pub files_written: usize,
    pub folders_created: usize,
    pub entries_deleted: usize,
    /// Entries left alone because the disk copy is newer
    pub protected: usize,
    /// Entries skipped because the disk copy has the same timestamp
    pub synchronized: usize,
}

impl Snapshot {
    /// Options used for `kind` unless the caller passes its own
    pub fn emit_options(&self, kind: TargetKind) -> EmitOptions {
        match kind {
            TargetKind::Zip => EmitOptions {
                compression_level: self.config.archive_compression_level,
                remap: self.config.remap_archive_targets,
            },
            TargetKind::Folder | TargetKind::Gzip => EmitOptions {
                compression_level: self.config.folder_compression_level,
                remap: self.config.remap_folder_targets,
            },
        }
    }

    /// Write the whole tree to `target`.
    pub fn write(&self, target: &Path) -> Result<WriteReport> {
        self.write_with_progress(target, |_| Ok(()))
    }

    /// Write the whole tree, reporting progress after every visited node.
    ///
    /// An error returned by `progress` aborts the write; entries already written stay.
    pub fn write_with_progress<F>(&self, target: &Path, progress: F) -> Result<WriteReport>
    where
        F: FnMut(f64) -> Result<()>,
    {
        self.write_subtree(&VirtualPath::root(), target, progress)
    }

    /// Write the subtree rooted at `path` using the options for the target's kind.
    pub fn write_subtree<F>(&self, path: &VirtualPath, target: &Path, progress: F) -> Result<WriteReport>
    where
        F: FnMut(f64) -> Result<()>,
    {
        let options = self.emit_options(TargetKind::for_target(target));
        self.write_subtree_with(path, target, options, progress)
    }

    /// Write the subtree rooted at `path` with explicit options.
    pub fn write_subtree_with<F>(
        &self,
        path: &VirtualPath,
        target: &Path,
        options: EmitOptions,
        mut progress: F,
    ) -> Result<WriteReport>
    where
        F: FnMut(f64) -> Result<()>,
    {
        let node = self
            .tree
            .get(path)
            .ok_or_else(|| SnapshotError::NotFound(path.clone()))?;
        if node.is_file() && node.children.is_empty() {
            return Err(SnapshotError::NotAFolder(path.clone()));
        }
        let kind = TargetKind::for_target(target);
        let mut emitter = Emitter {
            tree: &self.tree,
            remappers: &self.remappers,
            options,
            max_depth: self.config.max_nesting_depth,
            progress: &mut progress,
            total: self.tree.subtree_len(path).max(1),
            report: WriteReport::default(),
        };

        emitter.visit()?;
        match kind {
            TargetKind::Folder => emitter.write_root_folder(path, node, target)?,
            TargetKind::Zip => {
                let bytes = emitter.build_zip(path, 1)?;
                emitter.write_root_file(target, &bytes, node.timestamp)?;
            }
            TargetKind::Gzip => {
                let bytes = emitter.build_gzip(path, target)?;
                emitter.write_root_file(target, &bytes, node.timestamp)?;
            }
        }
        (emitter.progress)(1.0)?;

        let report = emitter.report;
        info!(
            target = %target.display(),
            source = %path,
            mode = ?kind,
            visited = report.nodes_visited,
            written = report.files_written,
            deleted = report.entries_deleted,
            protected = report.protected,
            synchronized = report.synchronized,
            "Wrote snapshot"
        );
        Ok(report)
    }
}

/// An entry found in a target directory
#[derive(Debug, Clone, Copy)]
struct DiskEntry {
    is_dir: bool,
    modified: Timestamp,
}

struct Emitter<'a> {
    tree: &'a ContentTree,
    remappers: &'a RemapPipeline,
    options: EmitOptions,
    max_depth: usize,
    progress: &'a mut dyn FnMut(f64) -> Result<()>,
    total: usize,
    report: WriteReport,
}

impl<'a> Emitter<'a> {
    fn visit(&mut self) -> Result<()> {
        self.report.nodes_visited += 1;
        let fraction = (self.report.nodes_visited as f64 / self.total as f64).min(1.0);
        (self.progress)(fraction)
    }

    fn check_depth(&self, path: &VirtualPath, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(SnapshotError::DepthExceeded {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    /// Name written for `path`, after remapping when enabled
    fn display_name(&self, path: &VirtualPath) -> Result<String> {
        if !self.options.remap {
            return Ok(path.name().to_string());
        }
        Ok(self.remappers.apply(self.tree, path)?.name().to_string())
    }

    /// Bytes to emit for a file node.
    ///
    /// Raw bytes are reused unless they were invalidated, or the node is an archive
    /// nested inside an archive being built with remapping on. An invalidated
    /// archive with no entries left becomes an empty ZIP or an empty GZIP member.
    fn file_bytes(&mut self, path: &VirtualPath, node: &ContentNode, depth: usize) -> Result<Vec<u8>> {
        let kind = archive::archive_kind(path.name());
        let rebuild = kind.is_some()
            && (!node.has_raw_bytes()
                || (self.options.remap && depth > 0 && !node.children.is_empty()));
        match kind {
            Some(ArchiveKind::Zip) if rebuild => self.build_zip(path, depth + 1),
            Some(ArchiveKind::Gzip) if rebuild => {
                self.check_depth(path, depth + 1)?;
                let data = if node.children.is_empty() {
                    Vec::new()
                } else {
                    let member = self.single_file_child(path)?;
                    self.member_bytes(&member, depth + 1)?
                };
                gzip_codec::compress(&data, self.options.compression_level, &path.to_string())
            }
            _ => Ok(node.payload.clone().unwrap_or_default()),
        }
    }

    fn member_bytes(&mut self, member: &VirtualPath, depth: usize) -> Result<Vec<u8>> {
        let node = self
            .tree
            .get(member)
            .ok_or_else(|| SnapshotError::NotFound(member.clone()))?;
        self.visit()?;
        self.file_bytes(member, node, depth)
    }

    fn single_file_child(&self, path: &VirtualPath) -> Result<VirtualPath> {
        let entries = self.tree.list_entries(path);
        match entries.as_slice() {
            [only] if self.tree.is_file(only) => Ok(only.clone()),
            _ => Err(SnapshotError::InvalidTarget(
                path.to_string().into(),
                format!("gzip needs exactly one file entry, found {}", entries.len()),
            )),
        }
    }

    /// Build a ZIP from the entries of `path`; `depth` counts the archives being built.
    fn build_zip(&mut self, path: &VirtualPath, depth: usize) -> Result<Vec<u8>> {
        self.check_depth(path, depth)?;
        let mut builder = ZipBuilder::new(self.options.compression_level, path.to_string());
        self.add_zip_entries(&mut builder, path, "", depth)?;
        builder.finish()
    }

    /// Files first, then folders, each in path order.
    fn add_zip_entries(
        &mut self,
        builder: &mut ZipBuilder,
        path: &VirtualPath,
        prefix: &str,
        depth: usize,
    ) -> Result<()> {
        for file in self.tree.list_files(path) {
            let Some(node) = self.tree.get(&file) else {
                continue;
            };
            self.visit()?;
            let name = format!("{}{}", prefix, self.display_name(&file)?);
            let data = self.file_bytes(&file, node, depth)?;
            builder.add_file(&name, &data, node.timestamp)?;
        }
        for folder in self.tree.list_folders(path) {
            let Some(node) = self.tree.get(&folder) else {
                continue;
            };
            self.visit()?;
            let name = format!("{}{}/", prefix, self.display_name(&folder)?);
            builder.add_directory(&name, node.timestamp)?;
            self.add_zip_entries(builder, &folder, &name, depth)?;
        }
        Ok(())
    }

    fn build_gzip(&mut self, path: &VirtualPath, target: &Path) -> Result<Vec<u8>> {
        let member = self.single_file_child(path).map_err(|_| {
            SnapshotError::InvalidTarget(
                target.to_path_buf(),
                format!("{} must hold exactly one file", path),
            )
        })?;
        let data = self.member_bytes(&member, 0)?;
        gzip_codec::compress(
            &data,
            self.options.compression_level,
            &target.display().to_string(),
        )
    }

    fn write_root_file(&mut self, target: &Path, bytes: &[u8], timestamp: Timestamp) -> Result<()> {
        if target.is_dir() {
            return Err(SnapshotError::InvalidTarget(
                target.to_path_buf(),
                "an archive target must not be an existing directory".to_string(),
            ));
        }
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SnapshotError::io(parent, e))?;
        }
        self.write_file(target, bytes, timestamp)
    }

    fn write_root_folder(&mut self, path: &VirtualPath, node: &ContentNode, target: &Path) -> Result<()> {
        if target.exists() && !target.is_dir() {
            return Err(SnapshotError::InvalidTarget(
                target.to_path_buf(),
                "a folder target must not be an existing file".to_string(),
            ));
        }
        if !target.exists() {
            std::fs::create_dir_all(target).map_err(|e| SnapshotError::io(target, e))?;
            self.report.folders_created += 1;
        }
        self.write_folder(path, node, target)
    }

    /// Directory depth is not bounded here; only archive rebuilds count toward the limit.
    fn write_folder(&mut self, path: &VirtualPath, node: &ContentNode, dir: &Path) -> Result<()> {
        let mut on_disk = read_disk_entries(dir)?;

        for child in &node.children {
            let Some(child_node) = self.tree.get(child) else {
                continue;
            };
            self.visit()?;
            let name = self.display_name(child)?;
            let target = dir.join(&name);
            let wants_dir = child_node.is_folder();

            let mut existing = on_disk.remove(&name);
            if let Some(entry) = existing {
                if entry.is_dir != wants_dir {
                    debug!(path = %target.display(), "Replacing entry of the wrong kind");
                    self.remove_entry(&target, entry.is_dir)?;
                    existing = None;
                }
            }

            match existing.map(|e| e.modified) {
                Some(modified) if modified > child_node.timestamp => {
                    debug!(path = %target.display(), "Keeping newer entry on disk");
                    self.report.protected += 1;
                    continue;
                }
                Some(modified) if modified == child_node.timestamp => {
                    self.report.synchronized += 1;
                    continue;
                }
                _ => {}
            }

            if wants_dir {
                if existing.is_none() {
                    std::fs::create_dir(&target).map_err(|e| SnapshotError::io(&target, e))?;
                    self.report.folders_created += 1;
                }
                self.write_folder(child, child_node, &target)?;
            } else {
                let bytes = self.file_bytes(child, child_node, 0)?;
                self.write_file(&target, &bytes, child_node.timestamp)?;
            }
        }

        for (name, entry) in on_disk {
            self.remove_entry(&dir.join(name), entry.is_dir)?;
        }

        filetime::set_file_mtime(dir, file_time_from_timestamp(node.timestamp))
            .map_err(|e| SnapshotError::io(dir, e))
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8], timestamp: Timestamp) -> Result<()> {
        std::fs::write(path, bytes).map_err(|e| SnapshotError::io(path, e))?;
        filetime::set_file_mtime(path, file_time_from_timestamp(timestamp))
            .map_err(|e| SnapshotError::io(path, e))?;
        self.report.files_written += 1;
        Ok(())
    }

    /// Delete a file, or a directory deepest entries first.
    ///
    /// A directory that is unexpectedly non-empty is logged and left in place.
    fn remove_entry(&mut self, path: &Path, is_dir: bool) -> Result<()> {
        if !is_dir {
            std::fs::remove_file(path).map_err(|e| SnapshotError::io(path, e))?;
            self.report.entries_deleted += 1;
            return Ok(());
        }
        for entry in WalkDir::new(path).contents_first(true).follow_links(false) {
            let entry = entry.map_err(|e| {
                let at = e.path().unwrap_or(path).to_path_buf();
                SnapshotError::io(at, std::io::Error::from(e))
            })?;
            let at = entry.path();
            if entry.file_type().is_dir() {
                if !remove_dir_if_empty(at)? {
                    continue;
                }
            } else {
                std::fs::remove_file(at).map_err(|e| SnapshotError::io(at, e))?;
            }
            self.report.entries_deleted += 1;
        }
        Ok(())
    }
}

/// Remove an empty directory; a directory that still has entries is logged and kept.
fn remove_dir_if_empty(path: &Path) -> Result<bool> {
    match std::fs::remove_dir(path) {
        Ok(()) => Ok(true),
        Err(e) if is_non_empty_dir(path) => {
            warn!(path = %path.display(), error = %e, "Directory not empty, skipping delete");
            Ok(false)
        }
        Err(e) => Err(SnapshotError::io(path, e)),
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn read_disk_entries(dir: &Path) -> Result<BTreeMap<String, DiskEntry>> {
    let mut entries = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(|e| SnapshotError::io(dir, e))? {
        let entry = entry.map_err(|e| SnapshotError::io(dir, e))?;
        let path = entry.path();
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| SnapshotError::io(&path, e))?;
        let modified = metadata.modified().map_err(|e| SnapshotError::io(&path, e))?;
        entries.insert(
            entry.file_name().to_string_lossy().into_owned(),
            DiskEntry {
                is_dir: metadata.is_dir(),
                modified: timestamp_from_system_time(modified),
            },
        );
    }
    Ok(entries)
}
