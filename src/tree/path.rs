//! Virtual paths
//!
//! A virtual path addresses a node in the content tree regardless of which
//! containers enclose it on disk. Paths are segment sequences under a single
//! synthetic root (the empty path). Ordering is segment-wise byte order, which
//! is exactly the derived ordering of `Vec<String>`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The synthetic root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path; empty segments are ignored.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, or the empty string for the root
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Path with the last segment removed; `None` for the root
    pub fn parent(&self) -> Option<VirtualPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append one or more `/`-separated segments
    pub fn join(&self, child: &str) -> VirtualPath {
        let mut segments = self.segments.clone();
        segments.extend(
            child
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }

    /// Same parent, different last segment
    pub fn with_name(&self, name: &str) -> VirtualPath {
        match self.parent() {
            Some(parent) => parent.join(name),
            None => VirtualPath::parse(name),
        }
    }

    pub fn starts_with(&self, prefix: &VirtualPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Segments of `self` below `prefix`, if `prefix` is an ancestor (or equal)
    pub fn strip_prefix(&self, prefix: &VirtualPath) -> Option<VirtualPath> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(Self {
            segments: self.segments[prefix.segments.len()..].to_vec(),
        })
    }

    /// Re-root a descendant of `from` under `to`
    pub fn rebase(&self, from: &VirtualPath, to: &VirtualPath) -> Option<VirtualPath> {
        let rest = self.strip_prefix(from)?;
        let mut segments = to.segments.clone();
        segments.extend(rest.segments);
        Some(Self { segments })
    }

    /// Ancestors from the immediate parent up to and including the root
    pub fn ancestors(&self) -> impl Iterator<Item = VirtualPath> + '_ {
        (0..self.segments.len()).rev().map(move |len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for VirtualPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}
