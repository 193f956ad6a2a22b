//! End-to-end validation runs over fixture documents.

use std::fs;
use std::path::{Path, PathBuf};

use sbe_events::{LoggedEvent, read_event_log};
use sbe_model::{SchemaVersion, Severity};
use sbe_resources::ResourceLocator;
use sbe_validate::{
    ERROR_TEMPLATE, FAILURE_TEMPLATE, FATAL_TEMPLATE, SUMMARY_TEMPLATE, SbeSchemaValidator,
    ValidatorConfig, validate,
};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn events(path: &Path) -> Vec<LoggedEvent> {
    read_event_log(path).expect("read event log")
}

const BROKEN_V1: &str = r#"<?xml version="1.0"?>
<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe" package="broken">
    <sbe:message name="NewOrderSingle" id="14">
        <field name="1ClOrdID" id="11" type="ClOrdID"/>
        <bogus/>
    </sbe:message>
</sbe:messageSchema>
"#;

#[test]
fn fixtures_validate_against_their_own_dialect() {
    for version in SchemaVersion::ALL {
        let input = fixture(&version.schema_artifact());
        let result = SbeSchemaValidator::new(ValidatorConfig::new(&input).with_version(version)).validate();
        assert!(result.is_valid(), "{version}: {result:?}");
        assert_eq!(result.errors(), 0);
        assert_eq!(result.fatal_errors(), 0);
        assert_eq!(result.warnings(), 0);
    }
}

#[test]
fn v1_document_fails_against_v2_schema() {
    let config = ValidatorConfig::new(fixture("SbeSchemaV1.xml")).with_version(SchemaVersion::V2);
    let result = SbeSchemaValidator::new(config).validate();
    assert!(!result.is_valid());
    assert!(result.errors() >= 1);
}

#[test]
fn each_violation_is_one_error_event() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.xml");
    fs::write(&input, BROKEN_V1).unwrap();
    let log = dir.path().join("events.json");

    let result = SbeSchemaValidator::new(ValidatorConfig::new(&input).with_event_log(&log)).validate();
    assert!(!result.is_valid());
    assert_eq!(result.errors(), 3);
    assert_eq!(result.fatal_errors(), 0);

    let events = events(&log);
    let errors: Vec<&LoggedEvent> = events
        .iter()
        .filter(|event| event.template == ERROR_TEMPLATE)
        .collect();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|event| event.severity == Severity::Error));
    assert!(errors.iter().any(|event| event.message.contains("Attribute 'id' must appear")));
    assert!(errors.iter().any(|event| event.message.contains("cvc-pattern-valid")));
    assert!(errors.iter().any(|event| event.message.contains("starting with element 'bogus'")));
    assert!(errors[0].message.starts_with("SbeSchemaValidator: XML error at line 2 col "));

    let summary = events.last().expect("summary event");
    assert_eq!(summary.severity, Severity::Fatal);
    insta::assert_snapshot!(
        summary.message,
        @"SbeSchemaValidator complete; fatal errors=0 errors=3 warnings=0"
    );
}

#[test]
fn summary_is_the_single_last_event() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.json");
    assert!(validate(fixture("SbeSchemaV1.xml"), "xsd/sbe.xsd", Some(log.as_path())));

    let events = events(&log);
    let summaries: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| event.template == SUMMARY_TEMPLATE)
        .map(|(index, _)| index)
        .collect();
    assert_eq!(summaries, vec![events.len() - 1]);
    assert_eq!(events[events.len() - 1].severity, Severity::Info);
}

#[test]
fn repeated_runs_are_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.xml");
    fs::write(&input, BROKEN_V1).unwrap();
    let validator = SbeSchemaValidator::new(ValidatorConfig::new(&input));
    let first = validator.validate();
    let second = validator.validate();
    assert_eq!(first, second);
}

#[test]
fn warnings_alone_keep_the_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("orders.xsd");
    fs::write(
        &schema,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:orders"
           targetNamespace="urn:orders" elementFormDefault="qualified">
  <xs:element name="orders">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="order" type="xs:string" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
    <xs:unique name="uniqueOrder">
      <xs:selector xpath="o:order"/>
      <xs:field xpath="."/>
    </xs:unique>
  </xs:element>
</xs:schema>"#,
    )
    .unwrap();
    let input = dir.path().join("orders.xml");
    fs::write(&input, r#"<orders xmlns="urn:orders"><order>a</order><order>a</order></orders>"#).unwrap();

    let config = ValidatorConfig::new(&input).with_schema(schema.to_string_lossy());
    let result = SbeSchemaValidator::new(config)
        .with_locator(ResourceLocator::empty())
        .validate();
    assert!(result.is_valid());
    assert_eq!(result.warnings(), 1);
    assert_eq!(result.errors(), 0);
}

#[test]
fn wide_occurrence_bounds_are_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("batch.xsd");
    fs::write(
        &schema,
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="batch">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="x" minOccurs="0" maxOccurs="300"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#,
    )
    .unwrap();
    let schema = schema.to_string_lossy().into_owned();
    let run = |children: usize| {
        let input = dir.path().join("batch.xml");
        fs::write(&input, format!("<batch>{}</batch>", "<x/>".repeat(children))).unwrap();
        SbeSchemaValidator::new(ValidatorConfig::new(&input).with_schema(schema.as_str()))
            .with_locator(ResourceLocator::empty())
            .validate()
    };

    assert!(run(300).is_valid());
    let over = run(301);
    assert!(!over.is_valid());
    assert_eq!(over.errors(), 1);
}

#[test]
fn deeply_nested_input_is_one_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deep.xml");
    let depth = 5_000;
    fs::write(&input, format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))).unwrap();
    let log = dir.path().join("events.json");

    let result = SbeSchemaValidator::new(ValidatorConfig::new(&input).with_event_log(&log)).validate();
    assert_eq!(result.fatal_errors(), 1);
    assert_eq!(result.errors(), 0);

    let events = events(&log);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].template, FATAL_TEMPLATE);
    assert!(events[0].message.contains("element nesting exceeds"));
}

#[test]
fn included_schema_resolves_next_to_its_includer() {
    let dir = tempfile::tempdir().unwrap();
    let schemas = dir.path().join("nested").join("dir");
    fs::create_dir_all(&schemas).unwrap();
    fs::write(
        schemas.join("schema.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:orders"
           targetNamespace="urn:orders">
  <xs:include schemaLocation="types.xsd"/>
  <xs:element name="orders" type="o:ordersType"/>
</xs:schema>"#,
    )
    .unwrap();
    fs::write(
        schemas.join("types.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="ordersType">
    <xs:sequence>
      <xs:element name="order" type="qtyType" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
  <xs:simpleType name="qtyType">
    <xs:restriction base="xs:positiveInteger"/>
  </xs:simpleType>
</xs:schema>"#,
    )
    .unwrap();
    let schema = schemas.join("schema.xsd").to_string_lossy().into_owned();
    let run = |document: &str| {
        let input = dir.path().join("orders.xml");
        fs::write(&input, document).unwrap();
        SbeSchemaValidator::new(ValidatorConfig::new(&input).with_schema(schema.as_str()))
            .with_locator(ResourceLocator::empty())
            .validate()
    };

    let valid = run(r#"<o:orders xmlns:o="urn:orders"><order>5</order><order>12</order></o:orders>"#);
    assert!(valid.is_valid(), "{valid:?}");

    let invalid = run(r#"<o:orders xmlns:o="urn:orders"><order>0</order></o:orders>"#);
    assert_eq!(invalid.errors(), 1);
    assert_eq!(invalid.fatal_errors(), 0);
}

#[test]
fn xinclude_in_the_input_is_resolved() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("types.xml"),
        r#"<types><type name="Quantity" primitiveType="int32"/></types>"#,
    )
    .unwrap();
    let input = dir.path().join("schema.xml");
    fs::write(
        &input,
        r#"<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe"
                   xmlns:xi="http://www.w3.org/2001/XInclude" id="1">
    <xi:include href="types.xml"/>
    <sbe:message name="Order" id="1">
        <field name="Qty" id="38" type="Quantity"/>
    </sbe:message>
</sbe:messageSchema>"#,
    )
    .unwrap();

    assert!(validate(&input, "xsd/sbe.xsd", None));
    let without = SbeSchemaValidator::new(ValidatorConfig::new(&input).with_xinclude(false)).validate();
    assert!(!without.is_valid());
}

#[test]
fn malformed_input_is_one_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("truncated.xml");
    fs::write(&input, "<sbe:messageSchema xmlns:sbe=\"http://fixprotocol.io/2016/sbe\">\n  <types>").unwrap();
    let log = dir.path().join("events.json");

    let result = SbeSchemaValidator::new(ValidatorConfig::new(&input).with_event_log(&log)).validate();
    assert_eq!(result.fatal_errors(), 1);
    assert_eq!(result.errors(), 0);

    let events = events(&log);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].template, FATAL_TEMPLATE);
    assert_eq!(events[0].severity, Severity::Fatal);
}

#[test]
fn missing_schema_is_reported_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.json");
    let config = ValidatorConfig::new(fixture("SbeSchemaV1.xml"))
        .with_schema("xsd/does-not-exist.xsd")
        .with_event_log(&log);
    let result = SbeSchemaValidator::new(config).validate();
    assert_eq!(result.fatal_errors(), 1);

    let events = events(&log);
    assert_eq!(events[0].template, FAILURE_TEMPLATE);
    assert!(events[0].message.starts_with("Failed to validate SBE schema, "));
}

#[test]
fn missing_input_returns_false() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.json");
    assert!(!validate(dir.path().join("absent.xml"), "xsd/sbe.xsd", Some(log.as_path())));
    assert!(!log.exists());
}
