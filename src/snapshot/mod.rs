//! Snapshot Orchestrator
//!
//! [`Snapshot`] owns a [`ContentTree`] together with the remapper pipeline and the
//! settings used to read it from disk and write it back. Mutations live in
//! [`mutate`], filesystem and archive ingestion in [`ingest`], and materialization
//! in [`emit`].

pub mod emit;
pub mod ingest;
pub mod mutate;

pub use emit::{EmitOptions, TargetKind, WriteReport};
pub use ingest::IngestReport;
pub use mutate::Touch;

use crate::config::SnapshotConfig;
use crate::error::Result;
use crate::metadata::{FeatureDescriptor, IdOverrides, Manifest, PluginDescriptor, Properties};
use crate::remap::{PathRemapper, RemapPipeline};
use crate::tree::{ContentTree, VirtualPath};
use crate::types::Timestamp;

/// In-memory image of a product layout
#[derive(Debug)]
pub struct Snapshot {
    tree: ContentTree,
    reference_time: Timestamp,
    remappers: RemapPipeline,
    id_overrides: IdOverrides,
    config: SnapshotConfig,
}

impl Snapshot {
    /// Create an empty snapshot.
    ///
    /// `reference_time` stamps the root and is the lower bound for the fresh
    /// timestamps that structural changes assign to their parents.
    pub fn new(reference_time: Timestamp) -> Self {
        Self::with_config(reference_time, SnapshotConfig::default())
    }

    pub fn with_config(reference_time: Timestamp, config: SnapshotConfig) -> Self {
        let id_overrides = IdOverrides::default();
        Self {
            tree: ContentTree::new(reference_time),
            reference_time,
            remappers: RemapPipeline::with_default(id_overrides.clone()),
            id_overrides,
            config,
        }
    }

    /// Replace the bundle id override table; the default remapper is rebuilt with it.
    pub fn with_id_overrides(mut self, overrides: IdOverrides) -> Self {
        self.id_overrides = overrides;
        self.reset_remappers();
        self
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn reference_time(&self) -> Timestamp {
        self.reference_time
    }

    pub fn tree(&self) -> &ContentTree {
        &self.tree
    }

    /// Drop all content, keeping settings and remappers
    pub fn clear(&mut self) {
        self.tree.clear(self.reference_time);
    }

    /// Append a remapper to the end of the pipeline
    pub fn add_remapper(&mut self, remapper: Box<dyn PathRemapper>) {
        self.remappers.push(remapper);
    }

    /// Remove every remapper, including the default one
    pub fn clear_remappers(&mut self) {
        self.remappers.clear();
    }

    /// Restore the pipeline to just the default canonical-name remapper
    pub fn reset_remappers(&mut self) {
        self.remappers = RemapPipeline::with_default(self.id_overrides.clone());
    }

    pub fn remappers(&self) -> &RemapPipeline {
        &self.remappers
    }

    /// Emitted path of `path` after all remappers run
    pub fn remapped(&self, path: &VirtualPath) -> Result<VirtualPath> {
        self.remappers.apply(&self.tree, path)
    }

    pub fn exists(&self, path: &VirtualPath) -> bool {
        self.tree.exists(path)
    }

    pub fn is_file(&self, path: &VirtualPath) -> bool {
        self.tree.is_file(path)
    }

    pub fn is_folder(&self, path: &VirtualPath) -> bool {
        self.tree.is_folder(path)
    }

    pub fn timestamp(&self, path: &VirtualPath) -> Option<Timestamp> {
        self.tree.timestamp(path)
    }

    pub fn list_entries(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.tree.list_entries(path)
    }

    pub fn list_files(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.tree.list_files(path)
    }

    pub fn list_folders(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.tree.list_folders(path)
    }

    pub fn list_tree(&self, path: &VirtualPath) -> Vec<VirtualPath> {
        self.tree.list_tree(path)
    }

    pub fn get_bytes(&self, path: &VirtualPath) -> Option<&[u8]> {
        self.tree.get_bytes(path)
    }

    pub fn get_string(&self, path: &VirtualPath) -> Option<String> {
        self.tree.get_string(path)
    }

    pub fn get_properties(&self, path: &VirtualPath) -> Option<Properties> {
        self.tree.get_properties(path)
    }

    pub fn get_manifest(&self, path: &VirtualPath) -> Result<Option<Manifest>> {
        self.tree.get_manifest(path)
    }

    pub fn get_plugin(&self, path: &VirtualPath) -> Result<Option<PluginDescriptor>> {
        self.tree.get_plugin(path, &self.id_overrides)
    }

    pub fn get_feature(&self, path: &VirtualPath) -> Result<Option<FeatureDescriptor>> {
        self.tree.get_feature(path)
    }

    /// A stamp strictly newer than `path` and all of its ancestors, never below the
    /// reference time.
    pub(crate) fn fresh_stamp(&self, path: &VirtualPath) -> Timestamp {
        let newest = std::iter::once(path.clone())
            .chain(path.ancestors())
            .filter_map(|p| self.tree.timestamp(&p))
            .max()
            .unwrap_or(self.reference_time);
        self.reference_time.max(newest.saturating_add(1))
    }

    /// Give the parent of `path` a fresh stamp so the next write revisits it.
    pub(crate) fn refresh_parent(&mut self, path: &VirtualPath) {
        if let Some(parent) = path.parent() {
            let stamp = self.fresh_stamp(&parent);
            self.tree.stamp(&parent, stamp);
        }
    }
}
