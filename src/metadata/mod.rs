//! Product Metadata
//!
//! Parsers for the descriptors that give plugins and features their identity:
//! bundle manifests, feature descriptors, and flat properties resources.

pub mod feature;
pub mod manifest;
pub mod plugin;
pub mod properties;

pub use feature::{FeatureDescriptor, Import, PluginReference, TextBlock};
pub use manifest::Manifest;
pub use plugin::{BundleVersion, IdOverrides, PluginDescriptor};
pub use properties::Properties;
