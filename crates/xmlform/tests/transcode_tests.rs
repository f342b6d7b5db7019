use std::fs;

use xmlform::document::{Editor, TableShape};
use xmlform::{
    parse, parse_with_config, render_html, render_source, round_trip, to_document, to_xml,
    to_xml_string, AnnotatedNode, Body, Config, Content, ContentKind, MixedContent, Role,
    SchemaIndex, TranscodeOptions, XmlNode,
};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    Ok(fs::read_to_string(format!("{FIXTURES}/{name}"))?)
}

#[test]
fn test_collection_symmetry() -> Result<(), Box<dyn std::error::Error>> {
    let source = "<items><item><a>1</a><b>2</b></item><item><a>3</a><b>4</b></item></items>";
    let tree = parse(source)?;
    let doc = to_document(&tree, &SchemaIndex::empty());

    let table = doc
        .root
        .as_ref()
        .and_then(AnnotatedNode::table)
        .ok_or("expected a table")?;
    let columns: Vec<&str> = table.columns.iter().map(|c| c.source_tag.as_str()).collect();
    assert_eq!(columns, ["a", "b"]);
    assert_eq!(table.rows.len(), 2);

    let rebuilt = to_xml(&doc)?;
    let values: Vec<&str> = rebuilt
        .children()
        .iter()
        .flat_map(XmlNode::children)
        .filter_map(XmlNode::text)
        .collect();
    assert_eq!(values, ["1", "2", "3", "4"]);
    assert_eq!(rebuilt, tree);
    Ok(())
}

#[test]
fn test_catalog_forward() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaIndex::build(&fixture("catalog.xsd")?);
    let tree = parse(&fixture("catalog.xml")?)?;
    let doc = to_document(&tree, &schema);

    let title = doc.root.as_ref().ok_or("missing title")?;
    assert_eq!(title.role, Role::Title);
    assert_eq!(title.label, "Catalog");

    let publisher = doc.find_by_tag("publisher").ok_or("missing publisher")?;
    assert_eq!(publisher.role, Role::Section);

    let founded = doc
        .find_by_tag("founded")
        .and_then(AnnotatedNode::field)
        .ok_or("missing founded")?;
    assert!(matches!(founded.editor, Editor::Text { hint: ContentKind::Date, .. }));
    assert_eq!(
        founded.documentation.as_deref(),
        Some("Date the publisher was registered")
    );

    let books = doc.find_by_tag("books").ok_or("missing books")?;
    assert_eq!(books.role, Role::CollectionTable);
    let table = books.table().ok_or("books is not a table")?;
    assert_eq!(table.shape, TableShape::Record);
    assert_eq!(table.item_tag, "book");
    let availability = table
        .columns
        .iter()
        .find(|c| c.source_tag == "availability")
        .and_then(|c| c.options.as_ref())
        .ok_or("availability has no choices")?;
    let docs: Vec<(&str, Option<&str>)> = availability
        .iter()
        .map(|o| (o.value.as_str(), o.doc.as_deref()))
        .collect();
    assert_eq!(
        docs,
        [
            ("", None),
            ("I", Some("In stock")),
            ("O", Some("Out of stock")),
            ("D", Some("Discontinued")),
            ("P", Some("Preorder")),
        ]
    );
    let isbn = table
        .rows
        .first()
        .and_then(|row| row.attributes.first())
        .map(|a| (a.name.as_str(), a.value.as_str()));
    assert_eq!(isbn, Some(("isbn", "978-0-00-000001-1")));
    Ok(())
}

#[test]
fn test_catalog_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaIndex::build(&fixture("catalog.xsd")?);
    let tree = parse(&fixture("catalog.xml")?)?;
    let xml = to_xml_string(&to_document(&tree, &schema))?;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<catalog version=\"2\">\n"));
    assert!(xml.contains("    <title>Rivers &amp; Roads</title>\n"));
    assert_eq!(parse(&xml)?, tree);
    Ok(())
}

#[test]
fn test_valid_fixtures_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let valid_dir = format!("{FIXTURES}/valid");
    for entry in fs::read_dir(valid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        let tree = parse(&content).map_err(|e| format!("{path:?}: {e}"))?;
        let xml = round_trip(&content, &SchemaIndex::empty())?;
        if parse(&xml)? != tree {
            return Err(format!("round trip changed {path:?}").into());
        }
    }
    Ok(())
}

#[test]
fn test_invalid_fixtures_give_placeholder() -> Result<(), Box<dyn std::error::Error>> {
    let invalid_dir = format!("{FIXTURES}/invalid");
    for entry in fs::read_dir(invalid_dir)? {
        let path = entry?.path();
        let content = fs::read_to_string(&path)?;
        if parse(&content).is_ok() {
            return Err(format!("should fail to parse {path:?}").into());
        }
        let doc = render_source(&content, &SchemaIndex::empty(), &TranscodeOptions::default());
        assert!(doc.is_placeholder(), "{path:?}");
        assert!(render_html(&doc).contains("xf-invalid"));
    }
    Ok(())
}

#[test]
fn test_escaped_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let tree = parse(&fixture("valid/escaped.xml")?)?;
    assert_eq!(tree.tag, "memo");
    assert_eq!(tree.attributes.get("priority").map(String::as_str), Some("high"));
    assert_eq!(tree.child("subject").and_then(XmlNode::text), Some("Q3 plan"));
    Ok(())
}

#[test]
fn test_mixed_content_policies() -> Result<(), Box<dyn std::error::Error>> {
    let source = "<p>Hello <b>world</b></p>";

    let collapsed = parse(source)?;
    assert_eq!(collapsed.mixed_text(), None);

    let preserve = Config::default().with_mixed_content(MixedContent::Preserve);
    let kept = parse_with_config(source, preserve)?;
    assert_eq!(kept.mixed_text(), Some("Hello"));
    let doc = to_document(&kept, &SchemaIndex::empty());
    assert_eq!(to_xml(&doc)?, kept);

    let reject = Config::default().with_mixed_content(MixedContent::Reject);
    assert!(parse_with_config(source, reject).is_err());
    Ok(())
}

#[test]
fn test_render_carries_back_references() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaIndex::build(&fixture("catalog.xsd")?);
    let doc = to_document(&parse(&fixture("catalog.xml")?)?, &schema);
    let html = render_html(&doc);
    assert!(html.contains("data-attr-name=\"version\" data-attr-value=\"2\""));
    assert!(html.contains("data-tag=\"email\" data-value=\"orders@northpress.example\""));
    assert!(html.contains("data-tag=\"title\" data-value=\"Rivers &amp; Roads\""));
    assert!(html.contains("data-attr-name=\"isbn\""));
    Ok(())
}

const TICKET_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="status">
    <xs:simpleType>
      <xs:restriction base="xs:string">
        <xs:enumeration value="open"/>
        <xs:enumeration value="closed"/>
      </xs:restriction>
    </xs:simpleType>
  </xs:element>
</xs:schema>"#;

#[test]
fn test_field_outside_enumeration_saves_unspecified() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaIndex::build(TICKET_XSD);
    let mut doc = to_document(
        &parse("<ticket><status>open</status><title>Broken</title></ticket>")?,
        &schema,
    );
    let id = doc.find_by_tag("status").ok_or("status not found")?.id;
    match doc.find_mut(id).map(|node| &mut node.content) {
        Some(Content::Field(field)) => field.raw_value = "reopened".into(),
        _ => return Err("status is not a field".into()),
    }

    let rebuilt = to_xml(&doc)?;
    assert_eq!(rebuilt.child("status").map(|node| &node.body), Some(&Body::Empty));
    assert_eq!(rebuilt.child("title").and_then(XmlNode::text), Some("Broken"));
    Ok(())
}

#[test]
fn test_cell_outside_enumeration_saves_unspecified() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaIndex::build(&fixture("catalog.xsd")?);
    let mut doc = to_document(&parse(&fixture("catalog.xml")?)?, &schema);
    let id = doc.find_by_tag("books").ok_or("books not found")?.id;
    let table = match doc.find_mut(id).map(|node| &mut node.content) {
        Some(Content::Table(table)) => table,
        _ => return Err("books is not a table".into()),
    };
    let cell = table
        .rows
        .first_mut()
        .and_then(|row| row.cells.iter_mut().find(|cell| cell.source_tag == "currency"))
        .ok_or("currency cell not found")?;
    cell.raw_value = "GBP".into();

    let saved = to_xml_string(&doc)?;
    assert!(!saved.contains("GBP"));
    assert!(saved.contains("<currency>EUR</currency>"));
    let rebuilt = to_xml(&doc)?;
    let first = rebuilt
        .child("books")
        .and_then(|books| books.children().first())
        .ok_or("first book missing")?;
    assert_eq!(first.child("currency").map(|node| &node.body), Some(&Body::Empty));
    Ok(())
}

#[test]
fn test_deeply_nested_schema_degrades_to_plain() -> Result<(), Box<dyn std::error::Error>> {
    let schema = SchemaIndex::build(&"<xs:element>".repeat(200_000));
    assert!(schema.is_empty());

    let source = "<person><name>Ada</name><email>ada@example.com</email></person>";
    let doc = render_source(source, &schema, &TranscodeOptions::default());
    assert!(!doc.is_placeholder());
    assert_eq!(to_xml(&doc)?, parse(source)?);
    Ok(())
}
