//! Content Tree
//!
//! The unified in-memory representation of a product layout. Nodes are keyed by
//! [`VirtualPath`] in a sorted map, so a node's descendants form one contiguous
//! range starting at the node itself. The tree performs no I/O.
//!
//! Invariants maintained here:
//! - every non-root node's parent exists and lists it as a direct child
//! - a node is only removed once its child set is empty
//! - timestamps propagate upward until they reach a node holding raw bytes or a
//!   node that is already at least as new

pub mod node;
pub mod path;

pub use node::ContentNode;
pub use path::VirtualPath;

use crate::archive;
use crate::error::{Result, SnapshotError};
use crate::metadata::feature::{FEATURE_PROPERTIES, FEATURE_XML};
use crate::metadata::manifest::MANIFEST_PATH;
use crate::metadata::{FeatureDescriptor, IdOverrides, Manifest, PluginDescriptor, Properties};
use crate::types::Timestamp;
use std::collections::BTreeMap;

/// Timestamp given to folders created implicitly as ancestors; propagation raises it.
const IMPLICIT_FOLDER_TIMESTAMP: Timestamp = 0;

#[derive(Debug, Clone)]
pub struct ContentTree {
    nodes: BTreeMap<VirtualPath, ContentNode>,
}

impl ContentTree {
    pub fn new(root_timestamp: Timestamp) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(VirtualPath::root(), ContentNode::folder(root_timestamp));
        Self { nodes }
    }

    /// Drop every node except a fresh root
    pub fn clear(&mut self, root_timestamp: Timestamp) {
        self.nodes.clear();
        self.nodes
            .insert(VirtualPath::root(), ContentNode::folder(root_timestamp));
    }

    /// Number of nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root remains
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, path: &VirtualPath) -> Option<&ContentNode> {
        self.nodes.get(path)
    }

    pub fn root(&self) -> Option<&ContentNode> {
        self.nodes.get(&VirtualPath::root())
    }

    pub fn exists(&self, path: &VirtualPath) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn is_file(&self, path: &VirtualPath) -> bool {
        self.get(path).map_or(false, ContentNode::is_file)
    }

    pub fn is_folder(&self, path: &VirtualPath) -> bool {
        self.get(path).map_or(false, ContentNode::is_folder)
    }

    pub fn timestamp(&self, path: &VirtualPath) -> Option<Timestamp> {
        self.get(path).map(|n| n.timestamp)
    }

    /// All nodes at or below `path`, in path order
    pub fn subtree<'a>(
        &'a self,
        path: &'a VirtualPath,
    ) -> impl Iterator<Item = (&'a VirtualPath, &'a ContentNode)> + 'a {
        self.nodes
            .range(path.clone()..)
            .take_while(move |(p, _)| p.starts_with(path))
    }

    pub fn subtree_len(&self, path: &VirtualPath) -> usize {
        self.subtree(path).count()
    }

    /// Create missing ancestors of `path` as folders and list `path` in its parent.
    ///
    /// Fails when an ancestor is a plain file that cannot hold entries.
    pub(crate) fn link(&mut self, path: &VirtualPath) -> Result<()> {
        let mut chain: Vec<VirtualPath> = path.ancestors().collect();
        chain.reverse();
        chain.push(path.clone());

        for pair in chain.windows(2) {
            let (parent, child) = (&pair[0], &pair[1]);
            let holder = self
                .nodes
                .entry(parent.clone())
                .or_insert_with(|| ContentNode::folder(IMPLICIT_FOLDER_TIMESTAMP));
            if holder.is_file()
                && holder.children.is_empty()
                && !archive::is_container_name(parent.name())
            {
                return Err(SnapshotError::NotAFolder(parent.clone()));
            }
            holder.children.insert(child.clone());
        }
        Ok(())
    }

    /// Raise ancestor timestamps after `path` received `timestamp`.
    pub(crate) fn propagate(&mut self, path: &VirtualPath, timestamp: Timestamp) {
        let mut current = path.parent();
        while let Some(p) = current {
            let Some(node) = self.nodes.get_mut(&p) else {
                break;
            };
            if node.has_raw_bytes() || node.timestamp >= timestamp {
                break;
            }
            node.timestamp = timestamp;
            current = p.parent();
        }
    }

    /// Register a node during ingestion.
    ///
    /// When the path is already populated the strictly newer timestamp wins and ties
    /// keep the existing node; a replaced node loses its previous expanded entries.
    /// Folder-onto-folder registration merges by keeping the newest timestamp.
    /// Returns whether the new payload was accepted.
    pub(crate) fn register(
        &mut self,
        path: &VirtualPath,
        payload: Option<Vec<u8>>,
        timestamp: Timestamp,
    ) -> Result<bool> {
        if path.is_root() {
            return Err(SnapshotError::RootImmutable);
        }
        match self.nodes.get(path) {
            Some(existing) if payload.is_none() && existing.is_folder() => {
                if timestamp > existing.timestamp {
                    if let Some(node) = self.nodes.get_mut(path) {
                        node.timestamp = timestamp;
                    }
                    self.propagate(path, timestamp);
                }
                return Ok(true);
            }
            Some(existing) => {
                if timestamp <= existing.timestamp {
                    return Ok(false);
                }
                let stale: Vec<VirtualPath> = existing.children.iter().cloned().collect();
                for child in stale {
                    self.remove_subtree(&child)?;
                }
                if let Some(node) = self.nodes.get_mut(path) {
                    node.payload = payload;
                    node.timestamp = timestamp;
                }
            }
            None => {
                self.link(path)?;
                self.nodes.insert(
                    path.clone(),
                    ContentNode {
                        timestamp,
                        payload,
                        children: Default::default(),
                    },
                );
            }
        }
        self.propagate(path, timestamp);
        Ok(true)
    }

    /// Store a payload at `path` unconditionally, dropping any expanded entries it had.
    ///
    /// Returns true when the node did not exist before. Timestamps are not propagated.
    pub(crate) fn put(
        &mut self,
        path: &VirtualPath,
        payload: Option<Vec<u8>>,
        timestamp: Timestamp,
    ) -> Result<bool> {
        if path.is_root() {
            return Err(SnapshotError::RootImmutable);
        }
        let Some(existing) = self.nodes.get(path) else {
            self.link(path)?;
            self.nodes.insert(
                path.clone(),
                ContentNode {
                    timestamp,
                    payload,
                    children: Default::default(),
                },
            );
            return Ok(true);
        };
        let stale: Vec<VirtualPath> = existing.children.iter().cloned().collect();
        for child in stale {
            self.remove_subtree(&child)?;
        }
        if let Some(node) = self.nodes.get_mut(path) {
            node.payload = payload;
            node.timestamp = timestamp;
        }
        Ok(false)
    }

    /// Set the timestamp of `path` and propagate it upward.
    pub(crate) fn stamp(&mut self, path: &VirtualPath, timestamp: Timestamp) {
        if let Some(node) = self.nodes.get_mut(path) {
            node.timestamp = timestamp;
        }
        self.propagate(path, timestamp);
    }

    /// Give `path` and every node below it the same timestamp. Nothing is propagated.
    pub(crate) fn restamp_subtree(&mut self, path: &VirtualPath, timestamp: Timestamp) {
        for (_, node) in self
            .nodes
            .range_mut(path.clone()..)
            .take_while(|(p, _)| p.starts_with(path))
        {
            node.timestamp = timestamp;
        }
    }

    /// Mark every enclosing container of `path` as needing a rebuild.
    pub(crate) fn invalidate_containers(&mut self, path: &VirtualPath) {
        for ancestor in path.ancestors() {
            if let Some(node) = self.nodes.get_mut(&ancestor) {
                if node.has_raw_bytes() {
                    node.payload = Some(Vec::new());
                }
            }
        }
    }

    /// Remove a leaf node (file or empty folder) and unlink it from its parent.
    pub(crate) fn remove_leaf(&mut self, path: &VirtualPath) -> Result<ContentNode> {
        let parent = path.parent().ok_or(SnapshotError::RootImmutable)?;
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| SnapshotError::NotFound(path.clone()))?;
        if !node.children.is_empty() {
            return Err(SnapshotError::NotEmpty(path.clone()));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or_else(|| SnapshotError::MissingParent(path.clone()))?;
        parent_node.children.remove(path);
        self.nodes
            .remove(path)
            .ok_or_else(|| SnapshotError::NotFound(path.clone()))
    }

    /// Remove `path` and everything below it, deepest entries first.
    pub(crate) fn remove_subtree(&mut self, path: &VirtualPath) -> Result<()> {
        let mut doomed: Vec<VirtualPath> = self.subtree(path).map(|(p, _)| p.clone()).collect();
        doomed.sort_by(|a, b| b.len().cmp(&a.len()));
        for p in doomed {
            self.remove_leaf(&p)?;
        }
        Ok(())
    }

    /// Copy the subtree at `from` to `to`, replacing whatever was at `to`.
    ///
    /// Payloads, child sets and timestamps are copied as they are.
    pub(crate) fn copy_subtree(&mut self, from: &VirtualPath, to: &VirtualPath) -> Result<()> {
        if to.is_root() {
            return Err(SnapshotError::RootImmutable);
        }
        if !self.exists(from) {
            return Err(SnapshotError::NotFound(from.clone()));
        }
        let copied: Vec<(VirtualPath, ContentNode)> = self
            .subtree(from)
            .filter_map(|(p, n)| {
                let target = p.rebase(from, to)?;
                let mut node = n.clone();
                node.children = n
                    .children
                    .iter()
                    .filter_map(|c| c.rebase(from, to))
                    .collect();
                Some((target, node))
            })
            .collect();

        if self.exists(to) {
            self.remove_subtree(to)?;
        }
        self.link(to)?;
        for (path, node) in copied {
            self.nodes.insert(path, node);
        }
        Ok(())
    }

    /// Immediate children of `path` (empty when missing)
    pub fn list_entries(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.get(path)
            .map(|n| n.children.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Immediate children holding a payload
    pub fn list_files(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.list_entries(path)
            .into_iter()
            .filter(|c| self.is_file(c))
            .collect()
    }

    /// Immediate children without a payload
    pub fn list_folders(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.list_entries(path)
            .into_iter()
            .filter(|c| self.is_folder(c))
            .collect()
    }

    /// Every descendant of `path`, depth-first, subfolders before files.
    ///
    /// A container is followed directly by its expanded entries.
    pub fn list_tree(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        let mut out = Vec::new();
        let mut pending = self.listing_order(path);
        while let Some(current) = pending.pop() {
            out.push(current.clone());
            pending.extend(self.listing_order(current));
        }
        out
    }

    /// Children of `path`, folders then files, reversed for use as a stack
    fn listing_order(&self, path: &VirtualPath) -> Vec<&VirtualPath> {
        let Some(node) = self.get(path) else {
            return Vec::new();
        };
        let (folders, files): (Vec<&VirtualPath>, Vec<&VirtualPath>) =
            node.children.iter().partition(|c| self.is_folder(c));
        folders.into_iter().chain(files).rev().collect()
    }

    pub fn get_bytes(&self, path: &VirtualPath) -> Option<&[u8]> {
        self.get(path).and_then(ContentNode::bytes)
    }

    /// File content as text; invalid UTF-8 is replaced
    pub fn get_string(&self, path: &VirtualPath) -> Option<String> {
        self.get_bytes(path)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn get_properties(&self, path: &VirtualPath) -> Option<Properties> {
        self.get_bytes(path).map(Properties::parse)
    }

    /// Manifest of the bundle rooted at `path`, if it has one
    pub fn get_manifest(&self, path: &VirtualPath) -> Result<Option<Manifest>> {
        let location = path.join(MANIFEST_PATH);
        match self.get_bytes(&location) {
            Some(bytes) => Manifest::parse(bytes, &location.to_string()).map(Some),
            None => Ok(None),
        }
    }

    /// Plugin descriptor of the bundle rooted at `path`, if it has a manifest
    pub fn get_plugin(
        &self,
        path: &VirtualPath,
        overrides: &IdOverrides,
    ) -> Result<Option<PluginDescriptor>> {
        match self.get_manifest(path)? {
            Some(manifest) => PluginDescriptor::from_manifest(&manifest, path, overrides).map(Some),
            None => Ok(None),
        }
    }

    /// Feature descriptor of the feature rooted at `path`, if it has one
    pub fn get_feature(&self, path: &VirtualPath) -> Result<Option<FeatureDescriptor>> {
        let location = path.join(FEATURE_XML);
        let Some(xml) = self.get_bytes(&location) else {
            return Ok(None);
        };
        let properties = self.get_bytes(&path.join(FEATURE_PROPERTIES));
        FeatureDescriptor::parse(xml, properties, &location.to_string()).map(Some)
    }
}
