//! Path Remapping
//!
//! An ordered pipeline of path-to-path transforms applied to the names emitted
//! during materialization. Lookup keys in the content tree never change; only the
//! names written to disk or into archives do.
//!
//! The default entry gives staged bundles and features their canonical
//! `<id>_<version>` names, read from the manifest or feature descriptor found
//! beneath `plugins/<name>` and `features/<name>`.

use crate::archive::{self, ArchiveKind};
use crate::error::Result;
use crate::metadata::IdOverrides;
use crate::tree::{ContentTree, VirtualPath};

pub const PLUGINS_FOLDER: &str = "plugins";
pub const FEATURES_FOLDER: &str = "features";

/// A single path transform
pub trait PathRemapper {
    /// Return the emitted path for `path`. Descriptor parse failures surface as errors.
    fn rename(&self, tree: &ContentTree, path: &VirtualPath) -> Result<VirtualPath>;
}

impl<F> PathRemapper for F
where
    F: Fn(&ContentTree, &VirtualPath) -> Result<VirtualPath>,
{
    fn rename(&self, tree: &ContentTree, path: &VirtualPath) -> Result<VirtualPath> {
        self(tree, path)
    }
}

/// Renames `plugins/<name>` and `features/<name>` to their canonical names
#[derive(Debug, Clone, Default)]
pub struct CanonicalNameRemapper {
    overrides: IdOverrides,
}

impl CanonicalNameRemapper {
    pub fn new(overrides: IdOverrides) -> Self {
        Self { overrides }
    }
}

impl PathRemapper for CanonicalNameRemapper {
    fn rename(&self, tree: &ContentTree, path: &VirtualPath) -> Result<VirtualPath> {
        if path.len() != 2 {
            return Ok(path.clone());
        }
        let renamed = match path.segments()[0].as_str() {
            PLUGINS_FOLDER => tree
                .get_plugin(path, &self.overrides)?
                .map(|plugin| plugin.file_name()),
            FEATURES_FOLDER => tree.get_feature(path)?.map(|feature| {
                feature.canonical_name(archive::archive_kind(path.name()) == Some(ArchiveKind::Zip))
            }),
            _ => None,
        };
        Ok(match renamed {
            Some(name) => path.with_name(&name),
            None => path.clone(),
        })
    }
}

/// Ordered list of remappers applied front to back
pub struct RemapPipeline {
    remappers: Vec<Box<dyn PathRemapper>>,
}

impl RemapPipeline {
    /// A pipeline with no entries; paths pass through unchanged
    pub fn empty() -> Self {
        Self {
            remappers: Vec::new(),
        }
    }

    /// A pipeline holding only the canonical-name remapper
    pub fn with_default(overrides: IdOverrides) -> Self {
        let mut pipeline = Self::empty();
        pipeline.push(Box::new(CanonicalNameRemapper::new(overrides)));
        pipeline
    }

    pub fn push(&mut self, remapper: Box<dyn PathRemapper>) {
        self.remappers.push(remapper);
    }

    pub fn clear(&mut self) {
        self.remappers.clear();
    }

    pub fn len(&self) -> usize {
        self.remappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remappers.is_empty()
    }

    pub fn apply(&self, tree: &ContentTree, path: &VirtualPath) -> Result<VirtualPath> {
        let mut current = path.clone();
        for remapper in &self.remappers {
            current = remapper.rename(tree, &current)?;
        }
        Ok(current)
    }
}

impl Default for RemapPipeline {
    fn default() -> Self {
        Self::with_default(IdOverrides::default())
    }
}

impl std::fmt::Debug for RemapPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemapPipeline")
            .field("len", &self.remappers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(s: &str) -> VirtualPath {
        VirtualPath::parse(s)
    }

    fn tree_with_bundle() -> ContentTree {
        let mut tree = ContentTree::new(0);
        tree.register(
            &vp("plugins/staged.jar/META-INF/MANIFEST.MF"),
            Some(b"Bundle-SymbolicName: com.x;singleton:=true\nBundle-Version: 1.2.3.q\n".to_vec()),
            1,
        )
        .unwrap();
        tree.register(
            &vp("features/feat/feature.xml"),
            Some(br#"<feature id="org.f" version="2.0.0"/>"#.to_vec()),
            1,
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_canonical_names() {
        let tree = tree_with_bundle();
        let pipeline = RemapPipeline::default();
        assert_eq!(
            pipeline.apply(&tree, &vp("plugins/staged.jar")).unwrap(),
            vp("plugins/com.x_1.2.3.q.jar")
        );
        assert_eq!(
            pipeline.apply(&tree, &vp("features/feat")).unwrap(),
            vp("features/org.f_2.0.0")
        );
        // deeper paths and unknown folders pass through
        assert_eq!(
            pipeline
                .apply(&tree, &vp("plugins/staged.jar/META-INF"))
                .unwrap(),
            vp("plugins/staged.jar/META-INF")
        );
        assert_eq!(
            pipeline.apply(&tree, &vp("plugins/plain")).unwrap(),
            vp("plugins/plain")
        );
    }

    #[test]
    fn test_custom_remappers_run_in_order() {
        let tree = tree_with_bundle();
        let mut pipeline = RemapPipeline::default();
        pipeline.push(Box::new(
            |_: &ContentTree, p: &VirtualPath| -> Result<VirtualPath> {
                Ok(p.with_name(&p.name().to_uppercase()))
            },
        ));
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline.apply(&tree, &vp("features/feat")).unwrap(),
            vp("features/ORG.F_2.0.0")
        );

        pipeline.clear();
        assert!(pipeline.is_empty());
        assert_eq!(
            pipeline.apply(&tree, &vp("features/feat")).unwrap(),
            vp("features/feat")
        );
    }

    #[test]
    fn test_bad_descriptor_fails_rename() {
        let mut tree = ContentTree::new(0);
        tree.register(
            &vp("features/broken/feature.xml"),
            Some(b"<feature id=\"x\"><oops></feature>".to_vec()),
            1,
        )
        .unwrap();
        let err = RemapPipeline::default()
            .apply(&tree, &vp("features/broken"))
            .unwrap_err();
        assert!(err.is_io());
    }
}
