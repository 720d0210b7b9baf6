//! Source composition for [`SnapshotConfig`](super::SnapshotConfig).

pub(crate) mod merge_policy;
pub(crate) mod service;
