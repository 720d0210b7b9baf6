//! Layout Snapshot: Incremental Product Layout Materialization
//!
//! Represents an on-disk product layout, including everything nested inside ZIP,
//! JAR and GZIP containers, as one in-memory content tree. The tree can be edited
//! uniformly at any depth and written back as a directory tree, a single archive, or
//! a single GZIP, rewriting only what changed according to modification times.

pub mod archive;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod remap;
pub mod snapshot;
pub mod tree;
pub mod types;

pub use crate::config::{ConfigLoader, SnapshotConfig};
pub use error::{ErrorCategory, Result, SnapshotError};
pub use metadata::{FeatureDescriptor, IdOverrides, Manifest, PluginDescriptor, Properties};
pub use remap::{PathRemapper, RemapPipeline};
pub use snapshot::{EmitOptions, IngestReport, Snapshot, TargetKind, Touch, WriteReport};
pub use tree::{ContentNode, ContentTree, VirtualPath};
pub use types::Timestamp;
