//! Content node representation

use crate::tree::VirtualPath;
use crate::types::Timestamp;
use std::collections::BTreeSet;

/// A node of the content tree
///
/// A node without payload is a folder. A node with payload is a file; when it also
/// has children it is a container whose raw bytes and expanded entries are both cached.
/// An empty payload on a container means the raw bytes are stale and must be rebuilt
/// from the children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub timestamp: Timestamp,
    pub payload: Option<Vec<u8>>,
    pub children: BTreeSet<VirtualPath>,
}

impl ContentNode {
    pub fn folder(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            payload: None,
            children: BTreeSet::new(),
        }
    }

    pub fn file(data: Vec<u8>, timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            payload: Some(data),
            children: BTreeSet::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.payload.is_some()
    }

    pub fn is_folder(&self) -> bool {
        self.payload.is_none()
    }

    pub fn is_container(&self) -> bool {
        self.payload.is_some() && !self.children.is_empty()
    }

    /// True when the node carries raw bytes that stop timestamp propagation
    pub fn has_raw_bytes(&self) -> bool {
        self.payload.as_ref().map_or(false, |p| !p.is_empty())
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}
