use super::support::{jar, vp, write};
use layout_snapshot::{ContentTree, PathRemapper, Result, Snapshot, VirtualPath};
use tempfile::TempDir;

const MANIFEST: &[u8] =
    b"Manifest-Version: 1.0\nBundle-SymbolicName: com.x;singleton:=true\nBundle-Version: 1.2.3.q\n";

const FEATURE: &[u8] = br#"<?xml version="1.0"?>
<feature id="org.example.feature" label="%featureName" provider-name="Example">
  <description url="http://example.org">%description</description>
  <plugin id="org.example.core" download-size="10" install-size="20" version="1.0.0"/>
  <includes id="org.example.included" version="2.0.0"/>
  <requires>
    <import plugin="org.example.dep" version="3.0.0" match="perfect"/>
  </requires>
</feature>
"#;

fn staged(dir: &std::path::Path) {
    write(
        &dir.join("plugins/staged.jar"),
        &jar(&[("META-INF/MANIFEST.MF", MANIFEST), ("x/A.class", b"\xca\xfe")]),
    );
    write(&dir.join("features/staged/feature.xml"), FEATURE);
    write(
        &dir.join("features/staged/feature.properties"),
        b"featureName=Example Feature\ndescription=An example\n",
    );
}

#[test]
fn manifest_naming() {
    let dir = TempDir::new().unwrap();
    staged(dir.path());
    let mut snapshot = Snapshot::new(0);
    snapshot.read(dir.path()).unwrap();

    let plugin = snapshot.get_plugin(&vp("plugins/staged.jar")).unwrap().unwrap();
    assert_eq!(plugin.id, "com.x");
    assert_eq!(plugin.version.to_string(), "1.2.3.q");
    assert!(plugin.archive);
    assert_eq!(plugin.file_name(), "com.x_1.2.3.q.jar");
}

#[test]
fn feature_defaults_and_localization() {
    let dir = TempDir::new().unwrap();
    staged(dir.path());
    let mut snapshot = Snapshot::new(0);
    snapshot.read(dir.path()).unwrap();

    let feature = snapshot.get_feature(&vp("features/staged")).unwrap().unwrap();
    assert_eq!(feature.id, "org.example.feature");
    assert_eq!(feature.version, "0.0.0");
    assert_eq!(feature.localize(feature.label.as_deref().unwrap()), "Example Feature");
    assert!(!feature.plugins[0].fragment);
    assert!(feature.plugins[0].unpack);
    assert!(feature.includes[0].fragment);
    assert_eq!(feature.imports[0].match_rule, "perfect");
    assert_eq!(feature.canonical_name(false), "org.example.feature_0.0.0");
}

#[test]
fn folder_write_uses_canonical_names() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    let target = dir.path().join("target");
    staged(&source);
    let mut snapshot = Snapshot::new(0);
    snapshot.read(&source).unwrap();
    snapshot.write(&target).unwrap();

    assert!(target.join("plugins/com.x_1.2.3.q.jar").is_file());
    assert!(target.join("features/org.example.feature_0.0.0/feature.xml").is_file());
    assert!(!target.join("plugins/staged.jar").exists());

    // a second write finds everything under the remapped names
    let again = snapshot.write(&target).unwrap();
    assert_eq!(again.files_written, 0);
    assert_eq!(again.entries_deleted, 0);
}

#[test]
fn custom_remappers_and_clearing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    staged(&source);
    let mut snapshot = Snapshot::new(0);
    snapshot.read(&source).unwrap();

    let upper = |_: &ContentTree, path: &VirtualPath| -> Result<VirtualPath> {
        if path.len() == 1 {
            Ok(path.with_name(&path.name().to_uppercase()))
        } else {
            Ok(path.clone())
        }
    };
    snapshot.add_remapper(Box::new(upper));
    assert_eq!(snapshot.remapped(&vp("plugins")).unwrap(), vp("PLUGINS"));
    assert_eq!(
        upper.rename(snapshot.tree(), &vp("a/b")).unwrap(),
        vp("a/b")
    );

    snapshot.clear_remappers();
    let plain = dir.path().join("plain");
    snapshot.write(&plain).unwrap();
    assert!(plain.join("plugins/staged.jar").is_file());
    assert!(plain.join("features/staged/feature.xml").is_file());
}

#[test]
fn malformed_descriptor_fails_the_write() {
    let dir = TempDir::new().unwrap();
    let mut snapshot = Snapshot::new(0);
    snapshot
        .add_file(&vp("features/broken/feature.xml"), b"<feature id='x'><oops></feature>".to_vec(), 1)
        .unwrap();
    let err = snapshot.write(&dir.path().join("out")).unwrap_err();
    assert!(err.is_io());
}
