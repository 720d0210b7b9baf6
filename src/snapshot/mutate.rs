//! Mutation API
//!
//! Edits work the same at any depth, whether or not the path sits inside a
//! container. Every accepted edit inside a container invalidates the raw bytes of
//! all enclosing containers so the next write rebuilds them from their entries;
//! a rejected edit leaves the tree untouched. Structural changes (new entries,
//! removals, copies) give the parent a fresh stamp so the next incremental write
//! revisits it.

use super::ingest::Ingest;
use super::Snapshot;
use crate::archive;
use crate::error::{Result, SnapshotError};
use crate::tree::VirtualPath;
use crate::types::Timestamp;
use tracing::debug;

/// What happens to a replaced file's timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Touch {
    /// Keep the existing timestamp
    #[default]
    Preserve,
    /// Assign a stamp newer than the file and all of its ancestors
    Refresh,
}

impl Snapshot {
    /// Add or overwrite a file.
    ///
    /// A payload whose name marks it as an archive is expanded beneath the path.
    /// Fails with `NotEmpty` when `path` is a folder that still has entries.
    pub fn add_file(&mut self, path: &VirtualPath, data: Vec<u8>, timestamp: Timestamp) -> Result<()> {
        if path.is_root() {
            return Err(SnapshotError::RootImmutable);
        }
        if let Some(node) = self.tree.get(path) {
            if node.is_folder() && !node.children.is_empty() {
                return Err(SnapshotError::NotEmpty(path.clone()));
            }
        }
        let created = self.store_payload(path, data, timestamp)?;
        self.tree.propagate(path, timestamp);
        if created {
            self.refresh_parent(path);
        }
        debug!(path = %path, timestamp, created, "Added file");
        Ok(())
    }

    /// Add a folder; an existing folder keeps the newer of the two timestamps.
    pub fn add_folder(&mut self, path: &VirtualPath, timestamp: Timestamp) -> Result<()> {
        if path.is_root() {
            return Err(SnapshotError::RootImmutable);
        }
        let (created, changed) = match self.tree.get(path) {
            Some(node) if node.is_file() => return Err(SnapshotError::NotAFolder(path.clone())),
            Some(node) => (false, timestamp > node.timestamp),
            None => (true, true),
        };
        self.tree.register(path, None, timestamp)?;
        if changed {
            self.tree.invalidate_containers(path);
            self.tree.propagate(path, timestamp);
        }
        if created {
            self.refresh_parent(path);
        }
        Ok(())
    }

    /// Swap the payload of an existing file.
    ///
    /// A container drops its expanded entries and is expanded again from `data`.
    pub fn replace_file(&mut self, path: &VirtualPath, data: Vec<u8>, touch: Touch) -> Result<()> {
        let node = self
            .tree
            .get(path)
            .ok_or_else(|| SnapshotError::NotFound(path.clone()))?;
        if node.is_folder() {
            return Err(SnapshotError::NotAFile(path.clone()));
        }
        let timestamp = match touch {
            Touch::Preserve => node.timestamp,
            Touch::Refresh => self.fresh_stamp(path),
        };
        self.store_payload(path, data, timestamp)?;
        self.tree.propagate(path, timestamp);
        debug!(path = %path, timestamp, ?touch, "Replaced file");
        Ok(())
    }

    /// Remove a file or an empty folder.
    pub fn remove(&mut self, path: &VirtualPath) -> Result<()> {
        if path.is_root() {
            return Err(SnapshotError::RootImmutable);
        }
        self.tree.remove_leaf(path)?;
        self.tree.invalidate_containers(path);
        self.refresh_parent(path);
        debug!(path = %path, "Removed entry");
        Ok(())
    }

    /// Copy the subtree at `from` to `to`, replacing anything already at `to`.
    ///
    /// Payloads and entries are copied unchanged. Every copied node gets one stamp
    /// newer than `to`, its ancestors, and whatever it replaced, so the next write
    /// overwrites an earlier materialization of the destination.
    pub fn copy(&mut self, from: &VirtualPath, to: &VirtualPath) -> Result<()> {
        let replaced = self
            .tree
            .subtree(to)
            .map(|(_, node)| node.timestamp.saturating_add(1))
            .max()
            .unwrap_or_default();
        let stamp = self.fresh_stamp(to).max(replaced);
        self.tree.copy_subtree(from, to)?;
        self.tree.invalidate_containers(to);
        self.tree.restamp_subtree(to, stamp);
        self.tree.propagate(to, stamp);
        debug!(from = %from, to = %to, stamp, "Copied subtree");
        Ok(())
    }

    /// Store `data` at `path`, invalidate enclosing containers, and expand the payload
    /// when archive-named. Returns whether the node was created.
    fn store_payload(&mut self, path: &VirtualPath, data: Vec<u8>, timestamp: Timestamp) -> Result<bool> {
        let kind = archive::archive_kind(path.name());
        let raw = kind.map(|_| data.clone());
        let created = self.tree.put(path, Some(data), timestamp)?;
        self.tree.invalidate_containers(path);
        if let (Some(kind), Some(raw)) = (kind, raw) {
            let depth = path
                .ancestors()
                .filter(|a| archive::is_container_name(a.name()) && self.tree.is_file(a))
                .count();
            let mut ingest = Ingest::new(&mut self.tree, self.config.max_nesting_depth);
            ingest.expand(path, kind, &raw, timestamp, depth + 1)?;
        }
        Ok(created)
    }
}
