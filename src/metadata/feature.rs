//! Feature descriptors
//!
//! Streaming parse of a `feature.xml` descriptor plus its optional
//! `feature.properties` side resource. Descriptors compare and order by
//! `(id, version)` only.

use crate::error::{Result, SnapshotError};
use crate::metadata::properties::Properties;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Descriptor file beneath a feature root
pub const FEATURE_XML: &str = "feature.xml";
/// Optional properties resource beneath a feature root
pub const FEATURE_PROPERTIES: &str = "feature.properties";

pub const DEFAULT_VERSION: &str = "0.0.0";
pub const DEFAULT_MATCH_RULE: &str = "compatible";
pub const DEFAULT_SIZE: &str = "0";

/// Free text with an optional URL (description, copyright, license)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub url: Option<String>,
    pub text: Option<String>,
}

/// A `requires/import` requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub plugin: Option<String>,
    pub feature: Option<String>,
    pub version: String,
    pub match_rule: String,
}

/// A `plugin` or `includes` reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginReference {
    pub id: String,
    pub os: Option<String>,
    pub ws: Option<String>,
    pub arch: Option<String>,
    pub download_size: String,
    pub install_size: String,
    pub version: String,
    pub fragment: bool,
    pub unpack: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub id: String,
    pub version: String,
    pub label: Option<String>,
    pub provider: Option<String>,
    /// Plugin carrying the feature's branding
    pub plugin: Option<String>,
    pub image: Option<String>,
    pub os: Option<String>,
    pub ws: Option<String>,
    pub arch: Option<String>,
    pub nl: Option<String>,
    pub application: Option<String>,
    pub primary: bool,
    pub exclusive: bool,
    pub license_feature: Option<String>,
    pub license_feature_version: Option<String>,
    pub description: TextBlock,
    pub copyright: TextBlock,
    pub license: TextBlock,
    pub imports: Vec<Import>,
    pub plugins: Vec<PluginReference>,
    pub includes: Vec<PluginReference>,
    pub properties: Properties,
}

#[derive(Clone, Copy)]
enum TextTarget {
    Description,
    Copyright,
    License,
}

fn attributes(element: &BytesStart<'_>, origin: &str) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SnapshotError::descriptor(origin, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| SnapshotError::descriptor(origin, e))?
            .into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn flag(attrs: &HashMap<String, String>, name: &str, default: bool) -> bool {
    attrs
        .get(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn plugin_reference(attrs: &mut HashMap<String, String>, default_fragment: bool) -> PluginReference {
    PluginReference {
        fragment: flag(attrs, "fragment", default_fragment),
        unpack: flag(attrs, "unpack", true),
        id: attrs.remove("id").unwrap_or_default(),
        os: attrs.remove("os"),
        ws: attrs.remove("ws"),
        arch: attrs.remove("arch"),
        download_size: attrs
            .remove("download-size")
            .unwrap_or_else(|| DEFAULT_SIZE.to_string()),
        install_size: attrs
            .remove("install-size")
            .unwrap_or_else(|| DEFAULT_SIZE.to_string()),
        version: attrs
            .remove("version")
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
    }
}

impl FeatureDescriptor {
    /// Parse descriptor bytes. `origin` names the source in errors.
    pub fn parse(xml: &[u8], properties: Option<&[u8]>, origin: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut feature = FeatureDescriptor {
            version: DEFAULT_VERSION.to_string(),
            properties: properties.map(Properties::parse).unwrap_or_default(),
            ..Default::default()
        };
        let mut seen_root = false;
        let mut text_target: Option<TextTarget> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                SnapshotError::descriptor(
                    origin,
                    format!("at position {}: {}", reader.buffer_position(), e),
                )
            })?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let mut attrs = attributes(e, origin)?;
                    match e.name().as_ref() {
                        b"feature" => {
                            seen_root = true;
                            feature.apply_root_attributes(&mut attrs);
                        }
                        b"description" | b"copyright" | b"license" => {
                            let target = match e.name().as_ref() {
                                b"description" => TextTarget::Description,
                                b"copyright" => TextTarget::Copyright,
                                _ => TextTarget::License,
                            };
                            feature.text_block(target).url = attrs.remove("url");
                            if !is_empty {
                                text_target = Some(target);
                            }
                        }
                        b"import" => feature.imports.push(Import {
                            plugin: attrs.remove("plugin"),
                            feature: attrs.remove("feature"),
                            version: attrs
                                .remove("version")
                                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
                            match_rule: attrs
                                .remove("match")
                                .unwrap_or_else(|| DEFAULT_MATCH_RULE.to_string()),
                        }),
                        b"plugin" => feature.plugins.push(plugin_reference(&mut attrs, false)),
                        b"includes" => feature.includes.push(plugin_reference(&mut attrs, true)),
                        _ => {}
                    }
                }
                Event::Text(ref t) => {
                    if let Some(target) = text_target {
                        let text = t
                            .unescape()
                            .map_err(|e| SnapshotError::descriptor(origin, e))?;
                        feature.append_text(target, &text);
                    }
                }
                Event::CData(ref c) => {
                    if let Some(target) = text_target {
                        let text = String::from_utf8_lossy(c).into_owned();
                        feature.append_text(target, &text);
                    }
                }
                Event::End(ref e) => {
                    if matches!(e.name().as_ref(), b"description" | b"copyright" | b"license") {
                        text_target = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !seen_root {
            return Err(SnapshotError::descriptor(origin, "missing <feature> element"));
        }
        Ok(feature)
    }

    fn apply_root_attributes(&mut self, attrs: &mut HashMap<String, String>) {
        self.primary = flag(attrs, "primary", false);
        self.exclusive = flag(attrs, "exclusive", false);
        self.id = attrs.remove("id").unwrap_or_default();
        if let Some(version) = attrs.remove("version") {
            self.version = version;
        }
        self.label = attrs.remove("label");
        self.provider = attrs.remove("provider-name");
        self.plugin = attrs.remove("plugin");
        self.image = attrs.remove("image");
        self.os = attrs.remove("os");
        self.ws = attrs.remove("ws");
        self.arch = attrs.remove("arch");
        self.nl = attrs.remove("nl");
        self.application = attrs.remove("application");
        self.license_feature = attrs.remove("license-feature");
        self.license_feature_version = attrs.remove("license-feature-version");
    }

    fn text_block(&mut self, target: TextTarget) -> &mut TextBlock {
        match target {
            TextTarget::Description => &mut self.description,
            TextTarget::Copyright => &mut self.copyright,
            TextTarget::License => &mut self.license,
        }
    }

    fn append_text(&mut self, target: TextTarget, text: &str) {
        let block = self.text_block(target);
        match block.text.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(text);
            }
            None => block.text = Some(text.to_string()),
        }
    }

    /// Resolve a `%key` reference against the feature properties.
    ///
    /// Values without a leading `%`, or with an unknown key, are returned unchanged.
    pub fn localize(&self, value: &str) -> String {
        match value.strip_prefix('%') {
            Some(key) => self
                .properties
                .get(key)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            None => value.to_string(),
        }
    }

    /// Canonical emitted name: `<id>_<version>`, with `.jar` when archive-shaped
    pub fn canonical_name(&self, archive: bool) -> String {
        if archive {
            format!("{}_{}.jar", self.id, self.version)
        } else {
            format!("{}_{}", self.id, self.version)
        }
    }
}

impl PartialEq for FeatureDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for FeatureDescriptor {}

impl PartialOrd for FeatureDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FeatureDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.version.cmp(&other.version))
    }
}
