use std::fs;
use std::path::Path;

use sbe_resources::ResourceLocator;
use sbe_xml::{DocumentLoader, XmlError};

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

#[test]
fn includes_resolve_against_the_including_document() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "schemas/main.xml",
        r#"<root xmlns:xi="http://www.w3.org/2001/XInclude">
  <xi:include href="parts/types.xml"/>
  <note><xi:include href="parts/note.txt" parse="text"/></note>
</root>"#,
    );
    write(
        dir.path(),
        "schemas/parts/types.xml",
        r#"<types xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="leaf.xml"/></types>"#,
    );
    write(dir.path(), "schemas/parts/leaf.xml", "<leaf id=\"7\"/>");
    write(dir.path(), "schemas/parts/note.txt", "plain & simple");

    let loader = DocumentLoader::new(ResourceLocator::empty());
    let doc = loader
        .load_path(&dir.path().join("schemas/main.xml"))
        .unwrap();

    let children: Vec<_> = doc.root.child_elements().collect();
    assert_eq!(children.len(), 2);
    assert!(children[0].is(None, "types"));
    let leaf = children[0].child_elements().next().unwrap();
    assert_eq!(leaf.attribute("id"), Some("7"));
    assert_eq!(children[1].text(), "plain & simple");
}

#[test]
fn inclusion_loops_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.xml",
        r#"<a xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="b.xml"/></a>"#,
    );
    write(
        dir.path(),
        "b.xml",
        r#"<b xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="a.xml"/></b>"#,
    );

    let error = DocumentLoader::new(ResourceLocator::empty())
        .load_path(&dir.path().join("a.xml"))
        .unwrap_err();
    assert!(matches!(error, XmlError::Include { .. }));
    assert!(error.to_string().contains("inclusion loop"));
}

#[test]
fn missing_target_without_fallback_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "main.xml",
        r#"<a xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="absent.xml"/></a>"#,
    );

    let error = DocumentLoader::new(ResourceLocator::empty())
        .load_path(&dir.path().join("main.xml"))
        .unwrap_err();
    assert!(matches!(error, XmlError::Resource(_)));
}

#[test]
fn unreadable_input_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.xml");
    let error = DocumentLoader::default().load_path(&missing).unwrap_err();
    assert!(matches!(error, XmlError::Io { .. }));
    assert!(error.to_string().contains("nope.xml"));
}
