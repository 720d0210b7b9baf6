//! Bundle manifest header map
//!
//! Parses the main section of a `META-INF/MANIFEST.MF`: `Name: value` headers,
//! continuation lines beginning with a single space, main section terminated by
//! the first blank line. Header lookup is case-insensitive.

use crate::error::{Result, SnapshotError};
use std::collections::BTreeMap;

/// Location of the manifest beneath a bundle root
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

pub const BUNDLE_SYMBOLIC_NAME: &str = "Bundle-SymbolicName";
pub const BUNDLE_VERSION: &str = "Bundle-Version";
pub const BUNDLE_LOCALIZATION: &str = "Bundle-Localization";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Keyed by lower-cased header name; value keeps the original name
    headers: BTreeMap<String, (String, String)>,
}

impl Manifest {
    pub fn parse(bytes: &[u8], origin: &str) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| SnapshotError::descriptor(origin, format!("manifest is not UTF-8: {}", e)))?;
        let mut headers: BTreeMap<String, (String, String)> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (number, line) in text.lines().enumerate() {
            if line.is_empty() {
                if headers.is_empty() && current.is_none() {
                    continue;
                }
                break;
            }
            if let Some(rest) = line.strip_prefix(' ') {
                let key = current.as_ref().ok_or_else(|| {
                    SnapshotError::descriptor(
                        origin,
                        format!("line {}: continuation without a header", number + 1),
                    )
                })?;
                if let Some((_, value)) = headers.get_mut(key) {
                    value.push_str(rest);
                }
                continue;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| {
                SnapshotError::descriptor(origin, format!("line {}: expected 'Name: value'", number + 1))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(SnapshotError::descriptor(
                    origin,
                    format!("line {}: empty header name", number + 1),
                ));
            }
            let key = name.to_ascii_lowercase();
            let value = value.strip_prefix(' ').unwrap_or(value);
            headers.insert(key.clone(), (name.to_string(), value.to_string()));
            current = Some(key);
        }

        Ok(Self { headers })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Headers with their original names, ordered case-insensitively
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
