//! Plugin (bundle) descriptors
//!
//! Derives bundle identity, version, and shape from a manifest header map. The
//! canonical emitted name of a bundle is `<id>_<version>`, plus `.jar` for bundles
//! packaged as archives.

use crate::archive;
use crate::error::{Result, SnapshotError};
use crate::metadata::manifest::{Manifest, BUNDLE_LOCALIZATION, BUNDLE_SYMBOLIC_NAME, BUNDLE_VERSION};
use crate::tree::VirtualPath;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const DEFAULT_LOCALIZATION: &str = "OSGI-INF/l10n/bundle";

/// Dotted bundle version: three numeric segments and a free-form qualifier
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BundleVersion {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
    pub qualifier: String,
}

impl BundleVersion {
    /// Parse `major[.minor[.micro[.qualifier]]]`; missing parts default to 0 / empty.
    pub fn parse(raw: &str, origin: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }
        let mut parts = raw.splitn(4, '.');
        let mut numeric = |label: &str| -> Result<u64> {
            match parts.next() {
                None => Ok(0),
                Some(segment) => segment.trim().parse::<u64>().map_err(|_| {
                    SnapshotError::descriptor(
                        origin,
                        format!("invalid {} version segment '{}' in '{}'", label, segment, raw),
                    )
                }),
            }
        };
        let major = numeric("major")?;
        let minor = numeric("minor")?;
        let micro = numeric("micro")?;
        let qualifier = parts.next().unwrap_or("").to_string();
        Ok(Self {
            major,
            minor,
            micro,
            qualifier,
        })
    }
}

impl fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

/// One id rewrite rule: bundles with `id` and major version `major` become `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdOverride {
    pub id: String,
    pub major: u64,
    pub replacement: String,
}

/// Table of id rewrites applied after the id and version are computed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdOverrides {
    rules: Vec<IdOverride>,
}

impl IdOverrides {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, id: &str, major: u64, replacement: &str) -> Self {
        self.rules.push(IdOverride {
            id: id.to_string(),
            major,
            replacement: replacement.to_string(),
        });
        self
    }

    pub fn lookup(&self, id: &str, major: u64) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.id == id && r.major == major)
            .map(|r| r.replacement.as_str())
    }
}

impl Default for IdOverrides {
    /// The annotation bundle ships two incompatible major lines side by side.
    fn default() -> Self {
        Self::empty().with_rule(
            "org.eclipse.jdt.annotation",
            1,
            "org.eclipse.jdt.annotation_v1",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub id: String,
    pub version: BundleVersion,
    pub localization: String,
    /// Packaged as an archive rather than a plain folder
    pub archive: bool,
}

impl PluginDescriptor {
    /// Build a descriptor from the manifest found beneath `root`.
    pub fn from_manifest(
        manifest: &Manifest,
        root: &VirtualPath,
        overrides: &IdOverrides,
    ) -> Result<Self> {
        let origin = root.to_string();
        let archive = archive::archive_kind(root.name()) == Some(archive::ArchiveKind::Zip);
        let id = match manifest.get(BUNDLE_SYMBOLIC_NAME) {
            Some(name) => name.split(';').next().unwrap_or("").trim().to_string(),
            None => archive::strip_archive_suffix(root.name()).to_string(),
        };
        let version = BundleVersion::parse(manifest.get(BUNDLE_VERSION).unwrap_or(""), &origin)?;
        let id = match overrides.lookup(&id, version.major) {
            Some(replacement) => replacement.to_string(),
            None => id,
        };
        let localization = manifest
            .get(BUNDLE_LOCALIZATION)
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| DEFAULT_LOCALIZATION.to_string());
        Ok(Self {
            id,
            version,
            localization,
            archive,
        })
    }

    /// Canonical emitted name: `<id>_<version>`, with `.jar` when archive-shaped
    pub fn file_name(&self) -> String {
        if self.archive {
            format!("{}_{}.jar", self.id, self.version)
        } else {
            format!("{}_{}", self.id, self.version)
        }
    }
}

impl PartialOrd for PluginDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PluginDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.localization.cmp(&other.localization))
            .then_with(|| self.archive.cmp(&other.archive))
    }
}
