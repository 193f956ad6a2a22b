//! Text to owned tree conversion.

use std::sync::Arc;

use roxmltree::ParsingOptions;
use url::Url;

use crate::error::XmlError;
use crate::tree::{
    Attribute, Document, Element, MAX_ELEMENT_DEPTH, NamespaceBinding, Node, QName, TextPosition,
};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decode document bytes; only UTF-8 (with or without BOM) is accepted.
pub fn decode(bytes: &[u8], location: &str) -> Result<String, XmlError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).map_err(|_| XmlError::Encoding {
        location: location.to_string(),
    })
}

/// Parse `text` into an owned, namespace-resolved tree.
///
/// Comments and processing instructions are dropped; CDATA becomes text.
/// Documents nested deeper than [`MAX_ELEMENT_DEPTH`] are rejected.
pub fn parse_document(text: &str, url: Option<Url>) -> Result<Document, XmlError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let parsed = roxmltree::Document::parse_with_options(text, options).map_err(|error| {
        let pos = error.pos();
        XmlError::Syntax {
            position: TextPosition::new(pos.row, pos.col),
            message: error.to_string(),
        }
    })?;
    let empty: Arc<[NamespaceBinding]> = Arc::from(Vec::new());
    let root = convert_element(&parsed, parsed.root_element(), &empty, 1)?;
    Ok(Document { root, url })
}

fn position(doc: &roxmltree::Document<'_>, offset: usize) -> TextPosition {
    let pos = doc.text_pos_at(offset);
    TextPosition::new(pos.row, pos.col)
}

fn scope(node: roxmltree::Node<'_, '_>, parent: &Arc<[NamespaceBinding]>) -> Arc<[NamespaceBinding]> {
    let declared: Vec<NamespaceBinding> = node
        .namespaces()
        .map(|ns| NamespaceBinding {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .filter(|binding| !parent.contains(binding))
        .collect();
    if declared.is_empty() {
        return Arc::clone(parent);
    }
    let mut bindings: Vec<NamespaceBinding> = parent
        .iter()
        .filter(|outer| !declared.iter().any(|inner| inner.prefix == outer.prefix))
        .cloned()
        .collect();
    bindings.extend(declared);
    bindings.into()
}

fn convert_element(
    doc: &roxmltree::Document<'_>,
    node: roxmltree::Node<'_, '_>,
    parent_scope: &Arc<[NamespaceBinding]>,
    depth: usize,
) -> Result<Element, XmlError> {
    let start = position(doc, node.range().start);
    if depth > MAX_ELEMENT_DEPTH {
        return Err(XmlError::depth(start));
    }
    let tag = node.tag_name();
    let mut element = Element::new(QName::new(tag.namespace(), tag.name()), start);
    element.namespaces = scope(node, parent_scope);
    // Attributes report the position of their owning start tag.
    element.attributes = node
        .attributes()
        .map(|attribute| Attribute {
            name: QName::new(attribute.namespace(), attribute.name()),
            value: attribute.value().to_string(),
            position: start,
        })
        .collect();
    for child in node.children() {
        if child.is_element() {
            let converted = convert_element(doc, child, &element.namespaces, depth + 1)?;
            element.children.push(Node::Element(converted));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            // Adjacent text (text followed by CDATA) is merged.
            if let Some(Node::Text(previous)) = element.children.last_mut() {
                previous.push_str(text);
            } else {
                element.children.push(Node::Text(text.to_string()));
            }
        }
    }
    Ok(element)
}
