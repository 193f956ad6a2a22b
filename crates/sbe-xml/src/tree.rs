//! Owned, namespace-resolved document tree.

use std::fmt;
use std::sync::Arc;

use url::Url;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Deepest element nesting accepted in a document, the root being level 1.
/// Every walk over the tree recurses once per level.
pub const MAX_ELEMENT_DEPTH: usize = 256;

/// 1-based line and column of a node in its source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    pub line: u32,
    pub column: u32,
}

impl TextPosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Expanded name: namespace URI plus local part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            local: local.to_string(),
        }
    }

    pub fn local(local: &str) -> Self {
        Self::new(None, local)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local == local
    }
}

/// `"uri":local` for qualified names, bare `local` otherwise.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "\"{namespace}\":{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// A prefix binding in scope on an element. `prefix` is `None` for the
/// default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceBinding {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
    pub position: TextPosition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub position: TextPosition,
    /// Every namespace binding in scope, shared with the parent when the
    /// element declares none of its own.
    pub namespaces: Arc<[NamespaceBinding]>,
}

impl Element {
    pub fn new(name: QName, position: TextPosition) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            position,
            namespaces: Arc::from(Vec::new()),
        }
    }

    /// Value of an attribute without a namespace.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attribute_ns(None, local)
    }

    pub fn attribute_ns(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.is(namespace, local))
            .map(|attribute| attribute.value.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// Concatenated character data of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    /// Namespace URI bound to `prefix` (`None` for the default namespace).
    pub fn lookup_namespace(&self, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE);
        }
        self.namespaces
            .iter()
            .rev()
            .find(|binding| binding.prefix.as_deref() == prefix)
            .map(|binding| binding.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Resolve a lexical `prefix:local` name against the bindings in scope.
    ///
    /// Unprefixed names take the default namespace. Returns `None` when the
    /// prefix is not bound.
    pub fn resolve_qname(&self, lexical: &str) -> Option<QName> {
        let lexical = lexical.trim();
        match lexical.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self.lookup_namespace(Some(prefix))?;
                Some(QName::new(Some(namespace), local))
            }
            None => Some(QName::new(self.lookup_namespace(None), lexical)),
        }
    }
}

/// A parsed document and the location it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
    pub url: Option<Url>,
}

impl Document {
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Number of elements in the tree.
    pub fn element_count(&self) -> usize {
        fn count(element: &Element) -> usize {
            1 + element.child_elements().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with_bindings(bindings: &[(Option<&str>, &str)]) -> Element {
        let mut element = Element::new(QName::local("root"), TextPosition::new(1, 1));
        element.namespaces = bindings
            .iter()
            .map(|(prefix, uri)| NamespaceBinding {
                prefix: prefix.map(str::to_string),
                uri: (*uri).to_string(),
            })
            .collect::<Vec<_>>()
            .into();
        element
    }

    #[test]
    fn qname_display_matches_expected_lists() {
        assert_eq!(QName::local("field").to_string(), "field");
        assert_eq!(
            QName::new(Some("urn:x"), "message").to_string(),
            "\"urn:x\":message"
        );
        assert_eq!(QName::new(Some(""), "plain"), QName::local("plain"));
    }

    #[test]
    fn resolves_prefixed_and_default_names() {
        let element = element_with_bindings(&[(Some("sbe"), "urn:sbe"), (None, "urn:default")]);
        assert_eq!(
            element.resolve_qname("sbe:message"),
            Some(QName::new(Some("urn:sbe"), "message"))
        );
        assert_eq!(
            element.resolve_qname("types"),
            Some(QName::new(Some("urn:default"), "types"))
        );
        assert_eq!(element.resolve_qname("other:x"), None);
        assert_eq!(element.lookup_namespace(Some("xml")), Some(XML_NAMESPACE));
    }

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let element = element_with_bindings(&[(Some("p"), "urn:outer"), (Some("p"), "urn:inner")]);
        assert_eq!(element.lookup_namespace(Some("p")), Some("urn:inner"));
    }
}
